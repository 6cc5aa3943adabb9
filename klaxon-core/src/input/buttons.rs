//! Five-button bank

use heapless::Vec;
use klaxon_hal::Level;

use super::button::{ButtonSlot, Edge};
use crate::time::Millis;

/// Number of physical buttons
pub const BUTTON_COUNT: usize = 5;

/// What happened to a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEventKind {
    /// Debounced press edge
    Pressed,
    /// Debounced release edge
    Released,
    /// Held past the long-press threshold
    LongPress,
}

/// Button event for one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    /// Slot index (0-4)
    pub slot: usize,
    /// Event kind
    pub kind: ButtonEventKind,
}

impl ButtonEvent {
    fn new(slot: usize, kind: ButtonEventKind) -> Self {
        Self { slot, kind }
    }
}

/// All button slots
#[derive(Debug, Clone, Default)]
pub struct Buttons {
    slots: [ButtonSlot; BUTTON_COUNT],
}

impl Buttons {
    /// All buttons released
    pub const fn new() -> Self {
        Self {
            slots: [ButtonSlot::new(); BUTTON_COUNT],
        }
    }

    /// Sample every line once
    ///
    /// Edge events for all slots come first in slot order, followed by any
    /// long presses, so a long press is always seen after the edges of the
    /// same iteration.
    pub fn poll(
        &mut self,
        levels: [Level; BUTTON_COUNT],
        now: Millis,
        debounce_ms: u32,
        long_press_ms: u32,
    ) -> Vec<ButtonEvent, { BUTTON_COUNT * 2 }> {
        let mut events = Vec::new();

        for (slot, (state, level)) in self.slots.iter_mut().zip(levels).enumerate() {
            let kind = match state.sample(level, now, debounce_ms) {
                Some(Edge::Pressed) => ButtonEventKind::Pressed,
                Some(Edge::Released) => ButtonEventKind::Released,
                None => continue,
            };
            // At most one edge and one long press per slot
            let _ = events.push(ButtonEvent::new(slot, kind));
        }

        for (slot, state) in self.slots.iter_mut().enumerate() {
            if state.check_long_press(now, long_press_ms) {
                let _ = events.push(ButtonEvent::new(slot, ButtonEventKind::LongPress));
            }
        }

        events
    }

    /// Suppress the long press for a slot's current hold
    pub fn consume_long_press(&mut self, slot: usize) {
        if let Some(state) = self.slots.get_mut(slot) {
            state.consume_long_press();
        }
    }

    /// Pressed state of every slot
    pub fn pressed(&self) -> [bool; BUTTON_COUNT] {
        core::array::from_fn(|slot| self.slots[slot].is_pressed())
    }
}
