//! Non-blocking tone scheduling
//!
//! A one-shot tone is started and left running; [`ToneScheduler::update`]
//! silences it once its duration has passed. The panic alarm replaces the
//! one-shot path with an on/off cadence that runs until stopped.

use klaxon_hal::ToneOutput;

use crate::time::{elapsed, Millis};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct OneShot {
    started: Millis,
    duration_ms: u32,
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct Cadence {
    frequency_hz: u32,
    interval_ms: u32,
    last_toggle: Millis,
    on: bool,
}

/// Buzzer scheduler
///
/// At most one tone is active. A new [`start`](Self::start) pre-empts the
/// previous one-shot; while the cadence runs, one-shot requests are
/// ignored. With audio disabled the output is never touched.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToneScheduler {
    enabled: bool,
    one_shot: Option<OneShot>,
    cadence: Option<Cadence>,
    sounding: bool,
}

impl ToneScheduler {
    /// Create an idle scheduler
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            one_shot: None,
            cadence: None,
            sounding: false,
        }
    }

    /// Start a tone that stops itself after `duration_ms`
    ///
    /// Returns false if the request was ignored (audio disabled or the
    /// cadence owns the buzzer).
    pub fn start<T: ToneOutput + ?Sized>(
        &mut self,
        out: &mut T,
        now: Millis,
        duration_ms: u32,
        frequency_hz: u32,
    ) -> bool {
        if !self.enabled || self.cadence.is_some() {
            return false;
        }

        out.start_tone(frequency_hz);
        self.one_shot = Some(OneShot {
            started: now,
            duration_ms,
        });
        self.sounding = true;
        true
    }

    /// Start the alternating alarm, tone on first
    pub fn start_cadence<T: ToneOutput + ?Sized>(
        &mut self,
        out: &mut T,
        now: Millis,
        frequency_hz: u32,
        interval_ms: u32,
    ) {
        self.one_shot = None;
        if !self.enabled {
            return;
        }

        out.start_tone(frequency_hz);
        self.cadence = Some(Cadence {
            frequency_hz,
            interval_ms,
            last_toggle: now,
            on: true,
        });
        self.sounding = true;
    }

    /// Silence everything and drop any pending tone or cadence
    pub fn stop_all<T: ToneOutput + ?Sized>(&mut self, out: &mut T) {
        self.one_shot = None;
        self.cadence = None;
        if self.sounding {
            out.stop_tone();
            self.sounding = false;
        }
    }

    /// Advance timers; call once per loop iteration
    pub fn update<T: ToneOutput + ?Sized>(&mut self, out: &mut T, now: Millis) {
        if let Some(cadence) = &mut self.cadence {
            if elapsed(now, cadence.last_toggle) >= cadence.interval_ms {
                cadence.last_toggle = now;
                cadence.on = !cadence.on;
                if cadence.on {
                    out.start_tone(cadence.frequency_hz);
                } else {
                    out.stop_tone();
                }
                self.sounding = cadence.on;
            }
            return;
        }

        if let Some(tone) = self.one_shot {
            if elapsed(now, tone.started) >= tone.duration_ms {
                out.stop_tone();
                self.one_shot = None;
                self.sounding = false;
            }
        }
    }
}
