//! The device aggregate
//!
//! [`Device`] owns every collaborator and all runtime state. The loop
//! driver calls [`Device::tick`] once per iteration with the current time
//! and the raw button levels; each tick runs, in order:
//!
//! 1. debounce and long-press detection
//! 2. mode-specific button dispatch
//! 3. inbound frame decoding and application
//! 4. panic re-announcement
//! 5. hold re-send, keepalive, liveness sweep, tone and display upkeep
//!
//! Later stages see what earlier stages changed within the same tick.

use klaxon_display::{CharDisplay, Screen};
use klaxon_hal::{ByteStore, Level, Radio, RadioError, ToneOutput, MAX_PACKET_LEN};
use klaxon_protocol::{Frame, Label, RemoteSlot};

use crate::config::DeviceConfig;
use crate::input::{ButtonEvent, ButtonEventKind, Buttons, BUTTON_COUNT};
use crate::link::{LinkStatus, RemoteLink, Retransmit};
use crate::name::NameBuffer;
use crate::state::{Event, Mode, PanicOrigin};
use crate::time::{elapsed, Millis};
use crate::tone::ToneScheduler;
use crate::view;

/// Steps the character under the cursor back (naming)
const DECREASE_BUTTON: usize = 0;
/// Sends a beep request (normal), steps forward (naming)
const BEEP_BUTTON: usize = 1;
/// Long press enters/commits naming
const NAMING_BUTTON: usize = 2;
/// Reports presses over the air (normal), cursor forward (naming)
const TX_BUTTON: usize = 3;
/// Raises a local panic
const PANIC_BUTTON: usize = 4;

/// Remote slot the transmit button reports as
const TX_SLOT: RemoteSlot = RemoteSlot::MAX;

/// Packets drained from the radio per tick at most
const MAX_RX_PER_TICK: usize = 4;

const NAME_SAVED: &str = "Name saved";
const SAVE_FAILED: &str = "Save FAILED";

#[derive(Debug, Clone, Copy)]
struct Notice {
    text: &'static str,
    since: Millis,
}

/// Panic-button device
///
/// Generic over the display, radio, buzzer and store so the same logic
/// runs on the board and against host-side mocks.
pub struct Device<D, R, T, S> {
    config: DeviceConfig,
    display: D,
    radio: Option<R>,
    tone_out: T,
    store: S,

    status: LinkStatus,
    mode: Mode,
    buttons: Buttons,
    tone: ToneScheduler,
    name: NameBuffer,
    /// Name shown and announced during panic; fixed at activation
    panic_label: Label,
    link: RemoteLink,
    retransmit: Retransmit,

    screen: Screen,
    notice: Option<Notice>,
    last_refresh: Option<Millis>,
    refresh_pending: bool,
}

impl<D, R, T, S> Device<D, R, T, S>
where
    D: CharDisplay,
    R: Radio,
    T: ToneOutput,
    S: ByteStore,
{
    /// Assemble a device
    ///
    /// `radio` is `None` when the board has no transceiver or it failed
    /// to probe. Nothing touches the hardware until [`boot`](Self::boot).
    pub fn new(config: DeviceConfig, display: D, radio: Option<R>, tone_out: T, store: S) -> Self {
        Self {
            tone: ToneScheduler::new(config.audio_enabled),
            config,
            display,
            radio,
            tone_out,
            store,
            status: LinkStatus::Disabled,
            mode: Mode::Normal,
            buttons: Buttons::new(),
            name: NameBuffer::new(),
            panic_label: Label::new(),
            link: RemoteLink::new(),
            retransmit: Retransmit::new(),
            screen: Screen::new(),
            notice: None,
            last_refresh: None,
            refresh_pending: true,
        }
    }

    /// Load the stored name, configure the radio and show the boot notice
    pub fn boot(&mut self, now: Millis) {
        self.name = NameBuffer::load(&mut self.store);

        self.status = if !self.config.radio_enabled {
            LinkStatus::Disabled
        } else {
            match self.radio.as_mut() {
                None => LinkStatus::Failed,
                Some(radio) => match radio.configure(&self.config.radio) {
                    Ok(()) => LinkStatus::Ready,
                    Err(_err) => {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("radio configure failed: {}", _err);
                        LinkStatus::Failed
                    }
                },
            }
        };

        #[cfg(feature = "defmt")]
        defmt::info!("boot: name '{}', link {}", self.name.as_str(), self.status);

        self.retransmit.start_keepalive(now);
        self.show_notice(self.status.notice(), now);
        self.refresh_display(now);
    }

    /// Run one loop iteration
    pub fn tick(&mut self, now: Millis, levels: [Level; BUTTON_COUNT]) {
        let timing = self.config.timing;

        let events = self
            .buttons
            .poll(levels, now, timing.debounce_ms, timing.long_press_ms);
        for event in events {
            self.dispatch(event, now);
        }

        self.receive(now);

        if self.mode.announces_panic()
            && self.retransmit.panic_due(now, timing.panic_resend_ms)
        {
            self.send(&Frame::Panic {
                label: self.panic_label.clone(),
            });
        }

        if self.mode == Mode::Normal && self.retransmit.hold_due(now, timing.hold_resend_ms) {
            self.send(&self.tx_press_frame());
        }
        if self.status.is_ready() && self.retransmit.keepalive_due(now, timing.keepalive_ms) {
            self.send(&Frame::Keepalive);
        }
        if self
            .link
            .sweep(now, timing.receive_timeout_ms, timing.quality_timeout_ms)
        {
            self.refresh_pending = true;
        }

        self.tone.update(&mut self.tone_out, now);
        self.refresh_display(now);
    }

    fn dispatch(&mut self, event: ButtonEvent, now: Millis) {
        // The release frame goes out whatever the mode, so the peer never
        // waits for the receive timeout
        if event.slot == TX_BUTTON
            && event.kind == ButtonEventKind::Released
            && self.retransmit.stop_hold()
        {
            self.send(&Frame::Release { slot: TX_SLOT });
        }

        match self.mode {
            Mode::Normal => self.normal_button(event, now),
            Mode::Naming => self.naming_button(event, now),
            Mode::Panic(_) => self.panic_button(event, now),
        }
    }

    fn normal_button(&mut self, event: ButtonEvent, now: Millis) {
        match (event.slot, event.kind) {
            (PANIC_BUTTON, ButtonEventKind::Pressed) => self.transition(Event::LocalPanic, now),
            (NAMING_BUTTON, ButtonEventKind::LongPress) => self.transition(Event::EditName, now),
            (slot, ButtonEventKind::Pressed) => {
                self.beep(now);
                if slot == BEEP_BUTTON {
                    self.send(&Frame::Beep);
                }
                if slot == TX_BUTTON {
                    self.send(&self.tx_press_frame());
                    self.retransmit.start_hold(now);
                }
                self.refresh_pending = true;
            }
            (_, ButtonEventKind::Released) => self.refresh_pending = true,
            _ => {}
        }
    }

    fn naming_button(&mut self, event: ButtonEvent, now: Millis) {
        match (event.slot, event.kind) {
            (DECREASE_BUTTON, ButtonEventKind::Pressed) => self.name.decrease(),
            (BEEP_BUTTON, ButtonEventKind::Pressed) => self.name.increase(),
            (NAMING_BUTTON, ButtonEventKind::Pressed) => self.name.cursor_back(),
            (TX_BUTTON, ButtonEventKind::Pressed) => self.name.cursor_forward(),
            (TX_BUTTON, ButtonEventKind::LongPress) => self.name.clear_all(),
            (NAMING_BUTTON, ButtonEventKind::LongPress) => {
                self.commit_name(now);
                return;
            }
            _ => return,
        }

        let tones = self.config.tones;
        self.tone
            .start(&mut self.tone_out, now, tones.click_ms, tones.click_hz);
        self.refresh_pending = true;
    }

    fn panic_button(&mut self, event: ButtonEvent, now: Millis) {
        if event.kind == ButtonEventKind::Pressed && event.slot != PANIC_BUTTON {
            // The same hold must not go on to open the editor
            self.buttons.consume_long_press(event.slot);
            self.transition(Event::DismissPanic, now);
        }
    }

    fn commit_name(&mut self, now: Millis) {
        let text = match self.name.commit(&mut self.store) {
            Ok(()) => {
                #[cfg(feature = "defmt")]
                defmt::info!("name saved: '{}'", self.name.as_str());
                NAME_SAVED
            }
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("name save failed: {}", _err);
                SAVE_FAILED
            }
        };
        self.transition(Event::CommitName, now);
        self.show_notice(text, now);
    }

    /// Report that a committed name could not be written out
    ///
    /// For stores that persist after the tick rather than inside
    /// [`ByteStore::commit`]. Shows the same notice as a failed commit.
    pub fn report_save_failure(&mut self, now: Millis) {
        #[cfg(feature = "defmt")]
        defmt::warn!("name save failed after commit");
        self.show_notice(SAVE_FAILED, now);
    }

    /// Apply a mode event and its entry/exit side effects
    fn transition(&mut self, event: Event, now: Millis) {
        let previous = self.mode;
        let next = previous.transition(event);
        if next == previous {
            return;
        }

        #[cfg(feature = "defmt")]
        defmt::info!("mode {} -> {} on {}", previous, next, event);

        match previous {
            Mode::Panic(_) => {
                self.tone.stop_all(&mut self.tone_out);
                self.retransmit.stop_panic();
                self.link.clear_slots();
            }
            Mode::Naming if event != Event::CommitName => {
                // Pre-empted: drop the unsaved edit
                self.name = NameBuffer::load(&mut self.store);
            }
            _ => {}
        }

        match next {
            Mode::Panic(origin) => {
                if origin == PanicOrigin::Local {
                    self.panic_label = self.name.label();
                    self.retransmit.start_panic();
                }
                let tones = self.config.tones;
                self.tone.stop_all(&mut self.tone_out);
                self.tone.start_cadence(
                    &mut self.tone_out,
                    now,
                    tones.panic_hz,
                    self.config.timing.panic_toggle_ms,
                );
            }
            Mode::Naming => self.name.reset_cursor(),
            Mode::Normal => {}
        }

        self.mode = next;
        self.notice = None;
        self.screen.clear();
        self.refresh_pending = true;
    }

    fn receive(&mut self, now: Millis) {
        if !self.status.is_ready() {
            return;
        }

        for _ in 0..MAX_RX_PER_TICK {
            let Some(radio) = self.radio.as_mut() else {
                return;
            };

            let mut buf = [0u8; MAX_PACKET_LEN];
            let len = match radio.try_receive(&mut buf) {
                Ok(Some(len)) => len,
                Ok(None) => return,
                Err(_err) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("radio receive failed: {}", _err);
                    return;
                }
            };
            let rssi = radio.last_signal_strength();

            let Some(packet) = buf.get(..len) else {
                continue;
            };
            match Frame::decode(packet) {
                Ok(frame) => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("rx {} rssi {}", frame, rssi);
                    self.link.record_signal(rssi, now);
                    self.apply_frame(frame, now);
                }
                Err(_err) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("dropped frame: {}", _err);
                }
            }
        }
    }

    fn apply_frame(&mut self, frame: Frame, now: Millis) {
        match frame {
            Frame::Press { slot, label } => {
                self.link.press(slot, label, now);
                self.beep(now);
                self.refresh_pending = true;
            }
            Frame::LegacyPress { slot } => {
                self.link.press(slot, None, now);
                self.beep(now);
                self.refresh_pending = true;
            }
            Frame::Release { slot } => {
                self.link.release(slot);
                self.refresh_pending = true;
            }
            Frame::Beep => self.beep(now),
            Frame::Panic { label } => {
                self.transition(Event::RemotePanic, now);
                if self.mode == Mode::Panic(PanicOrigin::Remote) && self.panic_label != label {
                    self.panic_label = label;
                    self.refresh_pending = true;
                }
            }
            Frame::Keepalive => {}
        }
    }

    fn tx_press_frame(&self) -> Frame {
        let label = self.name.label();
        Frame::Press {
            slot: TX_SLOT,
            label: if label.is_empty() { None } else { Some(label) },
        }
    }

    fn send(&mut self, frame: &Frame) {
        if !self.status.is_ready() {
            return;
        }
        let Some(radio) = self.radio.as_mut() else {
            return;
        };

        let result = frame
            .encode_to_vec()
            .map_err(|_| RadioError::PacketTooLarge)
            .and_then(|bytes| radio.send(&bytes));
        if let Err(_err) = result {
            #[cfg(feature = "defmt")]
            defmt::warn!("send {} failed: {}", frame, _err);
        }
    }

    fn beep(&mut self, now: Millis) {
        let tones = self.config.tones;
        self.tone
            .start(&mut self.tone_out, now, tones.beep_ms, tones.beep_hz);
    }

    fn show_notice(&mut self, text: &'static str, now: Millis) {
        self.notice = Some(Notice { text, since: now });
        self.screen.clear();
        self.refresh_pending = true;
    }

    fn compose(&mut self, now: Millis) {
        if let Some(notice) = self.notice {
            view::notice(&mut self.screen, notice.text);
            return;
        }

        match self.mode {
            Mode::Normal => view::idle(
                &mut self.screen,
                &self.link,
                self.buttons.pressed(),
                self.status,
                now,
                self.config.timing.quality_timeout_ms,
            ),
            Mode::Naming => view::naming(&mut self.screen, &self.name),
            Mode::Panic(origin) => view::panic(&mut self.screen, origin, &self.panic_label),
        }
    }

    fn refresh_display(&mut self, now: Millis) {
        let timing = self.config.timing;

        if let Some(notice) = self.notice {
            if elapsed(now, notice.since) >= timing.notice_ms {
                self.notice = None;
                self.screen.clear();
                self.refresh_pending = true;
            }
        }

        let throttle_due = self
            .last_refresh
            .map_or(true, |at| elapsed(now, at) >= timing.refresh_ms);
        let periodic = throttle_due
            && (self.screen.needs_full_redraw()
                || (self.mode == Mode::Normal && self.notice.is_none()));
        if !self.refresh_pending && !periodic {
            return;
        }

        self.compose(now);
        if self.screen.is_dirty() {
            if let Err(_err) = self.screen.flush_to(&mut self.display) {
                #[cfg(feature = "defmt")]
                defmt::warn!("display flush failed: {}", _err);
                self.screen.invalidate();
            }
        }
        self.last_refresh = Some(now);
        self.refresh_pending = false;
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Radio availability decided at boot
    pub fn status(&self) -> LinkStatus {
        self.status
    }

    /// Name buffer
    pub fn name(&self) -> &NameBuffer {
        &self.name
    }

    /// Name fixed at panic activation (local) or carried by the panic frame
    pub fn panic_label(&self) -> &str {
        self.panic_label.as_str()
    }

    /// Remote link state
    pub fn link(&self) -> &RemoteLink {
        &self.link
    }

    /// Shadow of the display content
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Store collaborator, for flushing after a tick
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::collections::VecDeque;
    use std::string::String;
    use std::vec::Vec;

    use klaxon_display::DisplayError;
    use klaxon_hal::{RadioSettings, StoreError};

    use super::*;

    struct MockDisplay {
        grid: [[u8; 16]; 2],
        cursor: (usize, usize),
        clears: usize,
        /// Every string printed, in order
        printed: Vec<String>,
        /// Fail the next print
        fail_print: bool,
    }

    impl MockDisplay {
        fn new() -> Self {
            Self {
                grid: [[b' '; 16]; 2],
                cursor: (0, 0),
                clears: 0,
                printed: Vec::new(),
                fail_print: false,
            }
        }

        fn row(&self, row: usize) -> String {
            String::from_utf8(self.grid[row].to_vec()).unwrap()
        }
    }

    impl CharDisplay for MockDisplay {
        fn clear(&mut self) -> Result<(), DisplayError> {
            self.grid = [[b' '; 16]; 2];
            self.cursor = (0, 0);
            self.clears += 1;
            Ok(())
        }

        fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), DisplayError> {
            if col >= 16 || row >= 2 {
                return Err(DisplayError::OutOfBounds);
            }
            self.cursor = (col as usize, row as usize);
            Ok(())
        }

        fn print(&mut self, text: &str) -> Result<(), DisplayError> {
            if self.fail_print {
                self.fail_print = false;
                return Err(DisplayError::Bus);
            }
            self.printed.push(String::from(text));
            let (mut col, row) = self.cursor;
            for byte in text.bytes() {
                if col < 16 {
                    self.grid[row][col] = byte;
                }
                col += 1;
            }
            self.cursor = (col, row);
            Ok(())
        }

        fn dimensions(&self) -> (u8, u8) {
            (16, 2)
        }
    }

    #[derive(Default)]
    struct MockRadio {
        inbound: VecDeque<Vec<u8>>,
        sent: Vec<Vec<u8>>,
        rssi: i16,
        fail_configure: bool,
        configured: Option<RadioSettings>,
    }

    impl MockRadio {
        fn sent_frames(&self) -> Vec<&[u8]> {
            self.sent.iter().map(|f| f.as_slice()).collect()
        }
    }

    impl Radio for MockRadio {
        fn configure(&mut self, settings: &RadioSettings) -> Result<(), RadioError> {
            if self.fail_configure {
                return Err(RadioError::NotFound);
            }
            self.configured = Some(*settings);
            Ok(())
        }

        fn send(&mut self, data: &[u8]) -> Result<(), RadioError> {
            self.sent.push(data.to_vec());
            Ok(())
        }

        fn try_receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, RadioError> {
            match self.inbound.pop_front() {
                Some(packet) => {
                    buf[..packet.len()].copy_from_slice(&packet);
                    Ok(Some(packet.len()))
                }
                None => Ok(None),
            }
        }

        fn last_signal_strength(&self) -> i16 {
            self.rssi
        }
    }

    #[derive(Default)]
    struct MockTone {
        frequency: Option<u32>,
        starts: usize,
    }

    impl ToneOutput for MockTone {
        fn start_tone(&mut self, frequency_hz: u32) {
            self.frequency = Some(frequency_hz);
            self.starts += 1;
        }

        fn stop_tone(&mut self) {
            self.frequency = None;
        }
    }

    struct MemStore {
        bytes: [u8; 64],
        commits: usize,
    }

    impl MemStore {
        fn with_name(name: &[u8]) -> Self {
            let mut bytes = [0xFF; 64];
            bytes[..name.len()].copy_from_slice(name);
            Self { bytes, commits: 0 }
        }
    }

    impl ByteStore for MemStore {
        fn read(&mut self, addr: usize) -> Result<u8, StoreError> {
            self.bytes.get(addr).copied().ok_or(StoreError::OutOfRange)
        }

        fn update(&mut self, addr: usize, value: u8) -> Result<(), StoreError> {
            *self.bytes.get_mut(addr).ok_or(StoreError::OutOfRange)? = value;
            Ok(())
        }

        fn commit(&mut self) -> Result<(), StoreError> {
            self.commits += 1;
            Ok(())
        }

        fn capacity(&self) -> usize {
            self.bytes.len()
        }
    }

    type TestDevice = Device<MockDisplay, MockRadio, MockTone, MemStore>;

    fn device_with(config: DeviceConfig, radio: MockRadio, name: &[u8]) -> TestDevice {
        let mut device = Device::new(
            config,
            MockDisplay::new(),
            Some(radio),
            MockTone::default(),
            MemStore::with_name(name),
        );
        device.boot(0);
        device
    }

    fn booted(name: &[u8]) -> TestDevice {
        let radio = MockRadio {
            rssi: -75,
            ..MockRadio::default()
        };
        device_with(DeviceConfig::default(), radio, name)
    }

    fn levels(pressed: &[usize]) -> [Level; BUTTON_COUNT] {
        let mut levels = [Level::High; BUTTON_COUNT];
        for &slot in pressed {
            levels[slot] = Level::Low;
        }
        levels
    }

    /// Tick every millisecond in `from..=to` with `pressed` held
    fn run(device: &mut TestDevice, from: Millis, to: Millis, pressed: &[usize]) {
        for now in from..=to {
            device.tick(now, levels(pressed));
        }
    }

    /// Press and release a button; returns the next free timestamp
    fn click(device: &mut TestDevice, slot: usize, at: Millis) -> Millis {
        run(device, at, at + 20, &[slot]);
        run(device, at + 21, at + 40, &[]);
        at + 41
    }

    fn receive(device: &mut TestDevice, packet: &[u8], now: Millis) {
        device
            .radio
            .as_mut()
            .unwrap()
            .inbound
            .push_back(packet.to_vec());
        device.tick(now, levels(&[]));
    }

    fn sent(device: &mut TestDevice) -> Vec<Vec<u8>> {
        device.radio.as_mut().unwrap().sent.clone()
    }

    #[test]
    fn test_boot_notice_then_idle() {
        let mut device = booted(b"");
        assert_eq!(device.status(), LinkStatus::Ready);
        assert_eq!(device.display.row(0), "Radio: OK       ");
        assert!(device.radio.as_mut().unwrap().configured.is_some());

        run(&mut device, 1, 599, &[]);
        assert_eq!(device.display.row(0), "Radio: OK       ");
        device.tick(600, levels(&[]));
        assert_eq!(device.display.row(0), "                ");
        assert_eq!(device.display.row(1), "---- -----   0% ");
    }

    #[test]
    fn test_radio_failure_is_persistent() {
        let radio = MockRadio {
            fail_configure: true,
            ..MockRadio::default()
        };
        let mut device = device_with(DeviceConfig::default(), radio, b"BOB");
        assert_eq!(device.status(), LinkStatus::Failed);
        assert_eq!(device.display.row(0), "Radio: FAILED   ");

        device.tick(700, levels(&[]));
        assert_eq!(device.display.row(0), "Radio: FAILED   ");

        // Local panic still works, nothing is sent
        click(&mut device, PANIC_BUTTON, 1000);
        assert_eq!(device.mode(), Mode::Panic(PanicOrigin::Local));
        assert!(sent(&mut device).is_empty());
    }

    #[test]
    fn test_radio_disabled() {
        let config = DeviceConfig {
            radio_enabled: false,
            ..DeviceConfig::default()
        };
        let mut device = device_with(config, MockRadio::default(), b"");
        assert_eq!(device.status(), LinkStatus::Disabled);
        assert!(device.radio.as_mut().unwrap().configured.is_none());

        device.tick(700, levels(&[]));
        assert_eq!(device.display.row(0), "Radio: off      ");
        click(&mut device, BEEP_BUTTON, 1000);
        assert!(sent(&mut device).is_empty());
    }

    #[test]
    fn test_long_press_enters_naming() {
        let mut device = booted(b"");
        run(&mut device, 1, 700, &[]);

        run(&mut device, 1000, 2009, &[NAMING_BUTTON]);
        assert_eq!(device.mode(), Mode::Normal);
        device.tick(2010, levels(&[NAMING_BUTTON]));
        assert_eq!(device.mode(), Mode::Naming);
        assert_eq!(device.name().cursor(), 0);
        assert_eq!(device.display.row(0), "              01");
        assert_eq!(device.display.row(1), "^           EDIT");
        // No frames from the naming button
        assert!(sent(&mut device).is_empty());
    }

    #[test]
    fn test_naming_edit_and_commit() {
        let mut device = booted(b"");
        run(&mut device, 1, 700, &[]);
        run(&mut device, 1000, 2100, &[NAMING_BUTTON]);
        run(&mut device, 2101, 2200, &[]);
        assert_eq!(device.mode(), Mode::Naming);

        // A full trip round the alphabet returns to space
        let mut at = 3000;
        at = click(&mut device, BEEP_BUTTON, at);
        assert_eq!(device.name().as_bytes()[0], b'A');
        for _ in 1..38 {
            at = click(&mut device, BEEP_BUTTON, at);
        }
        assert_eq!(device.name().as_bytes()[0], b' ');

        // "B" then "O" in the next cell
        at = click(&mut device, BEEP_BUTTON, at);
        at = click(&mut device, BEEP_BUTTON, at);
        at = click(&mut device, TX_BUTTON, at);
        for _ in 0..2 {
            at = click(&mut device, DECREASE_BUTTON, at);
        }
        assert_eq!(&device.name().as_str()[..2], "B9");
        assert!(sent(&mut device).is_empty());

        // Commit with a second long press
        run(&mut device, at, at + 1010, &[NAMING_BUTTON]);
        assert_eq!(device.mode(), Mode::Normal);
        assert_eq!(device.display.row(0), "Name saved      ");
        assert_eq!(device.store_mut().commits, 1);
        assert_eq!(&device.store_mut().bytes[..12], b"B9          ");

        run(&mut device, at + 1011, at + 1700, &[]);
        assert_eq!(device.display.row(0), "                ");
    }

    #[test]
    fn test_naming_long_press_clears() {
        let mut device = booted(b"ALICE");
        run(&mut device, 1, 700, &[]);
        run(&mut device, 1000, 2100, &[NAMING_BUTTON]);
        run(&mut device, 2101, 2200, &[]);

        run(&mut device, 3000, 4100, &[TX_BUTTON]);
        assert_eq!(device.name().as_str(), "            ");
        assert_eq!(device.name().cursor(), 0);
    }

    #[test]
    fn test_remote_press_and_timeout() {
        let mut device = booted(b"");
        receive(&mut device, b"P4|UNIT-A", 1000);

        assert!(device.link().is_live(RemoteSlot::MAX));
        assert_eq!(device.display.row(0), "UNIT-A          ");
        assert_eq!(device.display.row(1), "---4 -----  50%*");
        assert_eq!(device.tone_out.frequency, Some(4000));

        device.tick(2000, levels(&[]));
        assert!(device.link().is_live(RemoteSlot::MAX));

        device.tick(2001, levels(&[]));
        assert!(!device.link().is_live(RemoteSlot::MAX));
        assert_eq!(device.display.row(0), "                ");
    }

    #[test]
    fn test_remote_release_clears() {
        let mut device = booted(b"");
        receive(&mut device, b"P2", 1000);
        assert!(device.link().live()[1]);
        receive(&mut device, b"R2", 1100);
        assert!(!device.link().live()[1]);
        // Release with nothing live is harmless
        receive(&mut device, b"R2", 1200);
        assert!(!device.link().live()[1]);
    }

    #[test]
    fn test_legacy_digit() {
        let mut device = booted(b"");
        receive(&mut device, b"3", 1000);
        assert!(device.link().live()[2]);
        assert_eq!(device.display.row(1), "--3- -----  50%*");
    }

    #[test]
    fn test_keepalive_is_silent() {
        let mut device = booted(b"");
        device.tick(700, levels(&[]));
        let starts = device.tone_out.starts;
        let row0 = device.display.row(0);

        receive(&mut device, b"TX", 1000);
        assert_eq!(device.tone_out.starts, starts);
        assert_eq!(device.display.row(0), row0);
        assert_eq!(device.link().quality().percent, 50);
        assert_eq!(device.link().live(), [false; 4]);
    }

    #[test]
    fn test_malformed_frames_dropped() {
        let mut device = booted(b"");
        device.tick(700, levels(&[]));
        for packet in [&b"P9"[..], b"P4NAME", b"Q", b"", b"R"] {
            receive(&mut device, packet, 1000);
        }
        assert_eq!(device.link().live(), [false; 4]);
        assert_eq!(device.link().quality().percent, 0);
        assert_eq!(device.mode(), Mode::Normal);
    }

    #[test]
    fn test_local_panic_and_dismiss() {
        let mut device = booted(b"BOB");
        run(&mut device, 1, 700, &[]);

        run(&mut device, 1000, 1010, &[PANIC_BUTTON]);
        assert_eq!(device.mode(), Mode::Panic(PanicOrigin::Local));
        assert_eq!(device.panic_label(), "BOB");
        assert_eq!(sent(&mut device), [b"X|BOB".to_vec()]);
        assert_eq!(device.tone_out.frequency, Some(3000));
        assert_eq!(device.display.row(0), "**** PANIC **** ");
        assert_eq!(device.display.row(1), "> BOB           ");

        run(&mut device, 1011, 1100, &[PANIC_BUTTON]);
        run(&mut device, 1101, 1509, &[]);
        assert_eq!(sent(&mut device).len(), 1);
        device.tick(1510, levels(&[]));
        assert_eq!(sent(&mut device).len(), 2);

        // Panic button again does nothing
        let at = click(&mut device, PANIC_BUTTON, 1600);
        assert_eq!(device.mode(), Mode::Panic(PanicOrigin::Local));

        // Button 1 exits
        run(&mut device, at, at + 10, &[0]);
        assert_eq!(device.mode(), Mode::Normal);
        assert_eq!(device.tone_out.frequency, None);
        let count = sent(&mut device).len();
        run(&mut device, at + 11, at + 2000, &[]);
        assert_eq!(sent(&mut device).len(), count);
        assert_eq!(device.display.row(1), "---- -----   0% ");
    }

    #[test]
    fn test_remote_panic() {
        let mut device = booted(b"BOB");
        receive(&mut device, b"X|UNIT-A", 1000);
        assert_eq!(device.mode(), Mode::Panic(PanicOrigin::Remote));
        assert_eq!(device.panic_label(), "UNIT-A");
        assert_eq!(device.display.row(1), "< UNIT-A        ");

        // Never echoed back
        run(&mut device, 1001, 2000, &[]);
        assert!(sent(&mut device).is_empty());

        // Dismiss with button 2, which would otherwise send a beep request
        run(&mut device, 2001, 2011, &[BEEP_BUTTON]);
        assert_eq!(device.mode(), Mode::Normal);
        run(&mut device, 2012, 2100, &[]);
        assert!(sent(&mut device).is_empty());
    }

    #[test]
    fn test_remote_panic_refreshes_label() {
        let mut device = booted(b"");
        receive(&mut device, b"X|UNIT-A", 1000);
        receive(&mut device, b"X|UNIT-B", 1100);
        assert_eq!(device.panic_label(), "UNIT-B");
        assert_eq!(device.display.row(1), "< UNIT-B        ");
    }

    #[test]
    fn test_remote_panic_keeps_local_origin() {
        let mut device = booted(b"BOB");
        run(&mut device, 1000, 1010, &[PANIC_BUTTON]);
        receive(&mut device, b"X|ZED", 1011);
        assert_eq!(device.mode(), Mode::Panic(PanicOrigin::Local));
        assert_eq!(device.panic_label(), "BOB");
    }

    #[test]
    fn test_remote_panic_preempts_naming() {
        let mut device = booted(b"BOB");
        run(&mut device, 1, 700, &[]);
        run(&mut device, 1000, 2100, &[NAMING_BUTTON]);
        run(&mut device, 2101, 2200, &[]);
        click(&mut device, BEEP_BUTTON, 2300);
        assert_eq!(&device.name().as_str()[..3], "COB");

        receive(&mut device, b"X|ZED", 2500);
        assert_eq!(device.mode(), Mode::Panic(PanicOrigin::Remote));
        assert_eq!(&device.name().as_str()[..3], "BOB");
        assert_eq!(device.store_mut().commits, 0);
    }

    #[test]
    fn test_dismiss_hold_does_not_open_naming() {
        let mut device = booted(b"");
        receive(&mut device, b"X|", 1000);
        run(&mut device, 1001, 3000, &[NAMING_BUTTON]);
        assert_eq!(device.mode(), Mode::Normal);
    }

    #[test]
    fn test_hold_resend_and_release() {
        let mut device = booted(b"BOB");
        run(&mut device, 1, 700, &[]);

        run(&mut device, 1000, 1500, &[TX_BUTTON]);
        run(&mut device, 1501, 1600, &[]);
        assert_eq!(
            device.radio.as_mut().unwrap().sent_frames(),
            [&b"P4|BOB"[..], b"P4|BOB", b"P4|BOB", b"R4"]
        );
    }

    #[test]
    fn test_unnamed_press_has_no_label() {
        let mut device = booted(b"");
        click(&mut device, TX_BUTTON, 1000);
        assert_eq!(
            device.radio.as_mut().unwrap().sent_frames(),
            [&b"P4"[..], b"R4"]
        );
    }

    #[test]
    fn test_beep_button() {
        let mut device = booted(b"");
        run(&mut device, 1, 700, &[]);
        run(&mut device, 1000, 1010, &[BEEP_BUTTON]);
        assert_eq!(sent(&mut device), [b"B".to_vec()]);
        assert_eq!(device.tone_out.frequency, Some(4000));
        assert_eq!(device.display.row(1), "---- -2---   0% ");

        run(&mut device, 1011, 1090, &[BEEP_BUTTON]);
        assert_eq!(device.tone_out.frequency, None);
    }

    #[test]
    fn test_inbound_beep_during_panic_is_ignored() {
        let mut device = booted(b"BOB");
        run(&mut device, 1000, 1010, &[PANIC_BUTTON]);
        let starts = device.tone_out.starts;
        receive(&mut device, b"B", 1011);
        assert_eq!(device.tone_out.starts, starts);
    }

    #[test]
    fn test_keepalive_sent() {
        let mut device = booted(b"");
        device.tick(4999, levels(&[]));
        assert!(sent(&mut device).is_empty());
        device.tick(5000, levels(&[]));
        assert_eq!(sent(&mut device), [b"TX".to_vec()]);
    }

    #[test]
    fn test_quiet_build() {
        let config = DeviceConfig {
            audio_enabled: false,
            ..DeviceConfig::default()
        };
        let mut device = device_with(config, MockRadio::default(), b"");
        click(&mut device, BEEP_BUTTON, 1000);
        run(&mut device, 2000, 2010, &[PANIC_BUTTON]);
        assert_eq!(device.tone_out.starts, 0);
    }

    #[test]
    fn test_idle_refresh_is_throttled() {
        let mut device = booted(b"");
        run(&mut device, 1, 1049, &[]);
        let clears = device.display.clears;

        // A keepalive requests no redraw; the next periodic refresh shows it
        receive(&mut device, b"TX", 1050);
        run(&mut device, 1051, 1099, &[]);
        assert_eq!(device.display.row(1), "---- -----   0% ");
        device.tick(1100, levels(&[]));
        assert_eq!(device.display.row(1), "---- -----  50%*");

        run(&mut device, 1101, 2200, &[]);
        assert_eq!(device.display.row(1), "---- -----  50%+");
        run(&mut device, 2201, 6200, &[]);
        assert_eq!(device.display.row(1), "---- -----   0% ");

        // Row updates only, never a clear
        assert_eq!(device.display.clears, clears);
    }

    #[test]
    fn test_display_error_forces_full_redraw() {
        let mut device = booted(b"");
        run(&mut device, 1, 700, &[]);
        let clears = device.display.clears;

        device.display.fail_print = true;
        receive(&mut device, b"P4|UNIT-A", 1000);
        assert_eq!(device.display.row(1), "---- -----   0% ");

        run(&mut device, 1001, 1100, &[]);
        assert_eq!(device.display.clears, clears + 1);
        assert_eq!(device.display.row(0), "UNIT-A          ");
        assert_eq!(device.display.row(1), "---4 -----  50%*");
    }

    #[test]
    fn test_save_failure_reported_after_commit() {
        let mut device = booted(b"BOB");
        run(&mut device, 1, 700, &[]);
        run(&mut device, 1000, 2100, &[NAMING_BUTTON]);
        run(&mut device, 2101, 2200, &[]);
        run(&mut device, 3000, 4010, &[NAMING_BUTTON]);
        assert_eq!(device.mode(), Mode::Normal);
        assert_eq!(device.display.row(0), "Name saved      ");

        // The store only finds out it cannot write once the tick is over
        device.report_save_failure(4011);
        device.tick(4011, levels(&[NAMING_BUTTON]));
        assert_eq!(device.display.row(0), "Save FAILED     ");
        assert_eq!(device.display.row(1), "                ");

        run(&mut device, 4012, 4700, &[]);
        assert_eq!(device.display.row(0), "                ");
        assert_eq!(device.mode(), Mode::Normal);
    }

    #[test]
    fn test_panic_button_has_no_indicator() {
        let mut device = booted(b"BOB");
        run(&mut device, 1, 700, &[]);
        device.display.printed.clear();

        run(&mut device, 1000, 1010, &[PANIC_BUTTON]);
        assert_eq!(device.mode(), Mode::Panic(PanicOrigin::Local));
        assert_eq!(
            device.display.printed,
            ["**** PANIC **** ", "> BOB           "]
        );
    }
}
