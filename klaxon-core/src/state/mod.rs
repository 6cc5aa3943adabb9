//! Mode state machine
//!
//! The device is always in exactly one mode. Which component owns the
//! buttons and the display is a function of the mode alone.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{Mode, PanicOrigin};
