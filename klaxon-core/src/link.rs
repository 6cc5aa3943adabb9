//! Remote link state
//!
//! Tracks which of the peer's buttons are currently held, who the peer
//! says it is, and how good the link looks. Release frames can be lost, so
//! a slot that has not been refreshed within the receive timeout is
//! cleared by [`RemoteLink::sweep`].

use klaxon_protocol::{signal_percent, Label, RemoteSlot};

use crate::time::{due, elapsed, Millis};

/// Frames younger than this show the "fresh" recency glyph
pub const FRESH_MS: u32 = 1000;

/// Radio availability, decided once at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// Transceiver configured and listening
    Ready,
    /// Transceiver failed to configure; running local-only
    Failed,
    /// Radio disabled by configuration
    Disabled,
}

impl LinkStatus {
    /// Boot notice text
    pub fn notice(self) -> &'static str {
        match self {
            LinkStatus::Ready => "Radio: OK",
            LinkStatus::Failed => "Radio: FAILED",
            LinkStatus::Disabled => "Radio: off",
        }
    }

    /// Idle-view banner when no peer is shown
    pub fn banner(self) -> Option<&'static str> {
        match self {
            LinkStatus::Ready => None,
            _ => Some(self.notice()),
        }
    }

    /// Whether frames can be sent and received
    pub fn is_ready(self) -> bool {
        self == LinkStatus::Ready
    }
}

/// Link quality estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkQuality {
    /// 0-100
    pub percent: u8,
    /// When the last frame was received
    pub last_signal: Option<Millis>,
}

/// How recently the peer was heard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Recency {
    /// Within [`FRESH_MS`]
    Fresh,
    /// Within the quality timeout
    Recent,
    /// Not heard
    Silent,
}

impl Recency {
    /// Status-row glyph
    pub fn glyph(self) -> char {
        match self {
            Recency::Fresh => '*',
            Recency::Recent => '+',
            Recency::Silent => ' ',
        }
    }
}

/// Peer button liveness and identity
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RemoteLink {
    /// Last refresh per remote slot; `None` means released
    slots: [Option<Millis>; RemoteSlot::COUNT],
    /// Label and the slot whose press carried it
    peer: Option<(RemoteSlot, Label)>,
    quality: LinkQuality,
}

impl RemoteLink {
    /// No slots live, no peer known
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a press: mark the slot live and remember the label, if any
    pub fn press(&mut self, slot: RemoteSlot, label: Option<Label>, now: Millis) {
        self.slots[slot.index()] = Some(now);
        if let Some(label) = label {
            self.peer = Some((slot, label));
        }
    }

    /// Apply a release: clear the slot immediately
    pub fn release(&mut self, slot: RemoteSlot) {
        self.slots[slot.index()] = None;
    }

    /// Record the signal strength of a received frame
    pub fn record_signal(&mut self, rssi_dbm: i16, now: Millis) {
        self.quality = LinkQuality {
            percent: signal_percent(rssi_dbm),
            last_signal: Some(now),
        };
    }

    /// Expire stale slots and decay link quality
    ///
    /// Returns true if anything visible changed.
    pub fn sweep(&mut self, now: Millis, receive_timeout_ms: u32, quality_timeout_ms: u32) -> bool {
        let mut changed = false;

        for slot in &mut self.slots {
            if let Some(at) = *slot {
                if elapsed(now, at) > receive_timeout_ms {
                    *slot = None;
                    changed = true;
                }
            }
        }

        if let Some(at) = self.quality.last_signal {
            if elapsed(now, at) > quality_timeout_ms {
                self.quality = LinkQuality::default();
                changed = true;
            }
        }

        changed
    }

    /// Whether a remote slot is live
    pub fn is_live(&self, slot: RemoteSlot) -> bool {
        self.slots[slot.index()].is_some()
    }

    /// Liveness of every remote slot
    pub fn live(&self) -> [bool; RemoteSlot::COUNT] {
        core::array::from_fn(|index| self.slots[index].is_some())
    }

    /// Peer label, shown only while the slot that carried it is live
    pub fn peer_label(&self) -> Option<&Label> {
        match &self.peer {
            Some((slot, label)) if self.is_live(*slot) => Some(label),
            _ => None,
        }
    }

    /// Current quality estimate
    pub fn quality(&self) -> LinkQuality {
        self.quality
    }

    /// Recency class of the last received frame
    pub fn recency(&self, now: Millis, quality_timeout_ms: u32) -> Recency {
        match self.quality.last_signal {
            Some(at) if elapsed(now, at) <= FRESH_MS => Recency::Fresh,
            Some(at) if elapsed(now, at) <= quality_timeout_ms => Recency::Recent,
            _ => Recency::Silent,
        }
    }

    /// Forget every live slot
    pub fn clear_slots(&mut self) {
        self.slots = [None; RemoteSlot::COUNT];
    }
}

/// Throttles for repeated outbound frames
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Retransmit {
    /// Held-button `P` re-send; `Some` while the transmit button is held
    hold: Option<Millis>,
    /// Panic `X` re-send; `None` while armed means send now
    panic: Option<Millis>,
    panic_armed: bool,
    /// Keepalive `TX`
    keepalive: Option<Millis>,
}

impl Retransmit {
    /// All timers idle
    pub fn new() -> Self {
        Self::default()
    }

    /// Transmit button went down and its first frame was sent
    pub fn start_hold(&mut self, now: Millis) {
        self.hold = Some(now);
    }

    /// Transmit button went up; returns true if a hold was active
    pub fn stop_hold(&mut self) -> bool {
        self.hold.take().is_some()
    }

    /// Hold re-send due
    pub fn hold_due(&mut self, now: Millis, interval_ms: u32) -> bool {
        self.hold.is_some() && due(&mut self.hold, now, interval_ms)
    }

    /// Arm panic re-announcement; the first frame is due immediately
    pub fn start_panic(&mut self) {
        self.panic = None;
        self.panic_armed = true;
    }

    /// Disarm panic re-announcement
    pub fn stop_panic(&mut self) {
        self.panic = None;
        self.panic_armed = false;
    }

    /// Panic re-send due
    pub fn panic_due(&mut self, now: Millis, interval_ms: u32) -> bool {
        self.panic_armed && due(&mut self.panic, now, interval_ms)
    }

    /// Start the keepalive clock without sending
    pub fn start_keepalive(&mut self, now: Millis) {
        self.keepalive = Some(now);
    }

    /// Keepalive due; an interval of 0 disables keepalives
    pub fn keepalive_due(&mut self, now: Millis, interval_ms: u32) -> bool {
        interval_ms > 0 && due(&mut self.keepalive, now, interval_ms)
    }
}
