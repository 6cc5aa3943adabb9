//! Per-slot debounce and long-press tracking

use klaxon_hal::Level;

use crate::time::{elapsed, Millis};

/// Debounced transition of a slot's stable level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Stable level went low
    Pressed,
    /// Stable level went high
    Released,
}

/// State of one active-low button line
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonSlot {
    /// Level seen on the previous sample
    raw: Level,
    /// Debounced level
    stable: Level,
    /// When `raw` last changed
    last_change: Millis,
    /// When the current press began, if pressed
    press_start: Option<Millis>,
    /// Long-press already fired (or suppressed) for this press
    long_press_consumed: bool,
}

impl Default for ButtonSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonSlot {
    /// A released slot
    pub const fn new() -> Self {
        Self {
            raw: Level::High,
            stable: Level::High,
            last_change: 0,
            press_start: None,
            long_press_consumed: false,
        }
    }

    /// Feed one raw sample
    ///
    /// Returns an edge when the raw level has been steady for at least
    /// `window` ms and differs from the stable level.
    pub fn sample(&mut self, level: Level, now: Millis, window: u32) -> Option<Edge> {
        if level != self.raw {
            self.raw = level;
            self.last_change = now;
        }

        if self.raw == self.stable || elapsed(now, self.last_change) < window {
            return None;
        }

        self.stable = self.raw;
        self.long_press_consumed = false;
        if self.stable.is_pressed() {
            self.press_start = Some(now);
            Some(Edge::Pressed)
        } else {
            self.press_start = None;
            Some(Edge::Released)
        }
    }

    /// Check for a long press
    ///
    /// Fires at most once per press, once the slot has been held for at
    /// least `threshold` ms.
    pub fn check_long_press(&mut self, now: Millis, threshold: u32) -> bool {
        match self.press_start {
            Some(start) if !self.long_press_consumed && elapsed(now, start) >= threshold => {
                self.long_press_consumed = true;
                true
            }
            _ => false,
        }
    }

    /// Suppress the long press for the current hold
    pub fn consume_long_press(&mut self) {
        self.long_press_consumed = true;
    }

    /// Debounced pressed state
    pub fn is_pressed(&self) -> bool {
        self.stable.is_pressed()
    }
}
