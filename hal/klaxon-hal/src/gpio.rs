//! GPIO pin abstractions
//!
//! The buttons are momentary switches wired to ground with pull-ups, so a
//! pressed button reads [`Level::Low`].

/// Logic level of a digital line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0 (pressed, for active-low buttons)
    Low,
    /// Logic 1 (released, for active-low buttons)
    High,
}

impl Level {
    /// Level corresponding to a boolean "is high"
    pub fn from_high(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }

    /// Active-low interpretation: a low line means pressed
    pub fn is_pressed(self) -> bool {
        self == Level::Low
    }
}

/// Digital input pin
///
/// Implementations should handle the actual hardware register reading
/// for the specific chip.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }

    /// Sample the pin as a [`Level`]
    fn level(&self) -> Level {
        Level::from_high(self.is_high())
    }
}
