//! Momentary button inputs
//!
//! Buttons switch to ground; the internal pull-up holds the line high
//! while released.

use embassy_rp::gpio::{Input, Pin, Pull};
use embassy_rp::Peri;
use klaxon_hal::{InputPin, Level};

/// One active-low button line
pub struct Button<'d> {
    input: Input<'d>,
}

impl<'d> Button<'d> {
    /// Configure a pin as a pulled-up input
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        Self {
            input: Input::new(pin, Pull::Up),
        }
    }
}

impl InputPin for Button<'_> {
    fn is_high(&self) -> bool {
        self.input.is_high()
    }
}

/// Sample every button once, in slot order
pub fn sample<const N: usize>(buttons: &[Button<'_>; N]) -> [Level; N] {
    core::array::from_fn(|slot| buttons[slot].level())
}
