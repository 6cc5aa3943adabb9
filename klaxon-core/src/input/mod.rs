//! Button input handling
//!
//! Raw levels are sampled once per loop iteration. Each slot debounces its
//! own line and tracks how long it has been held; [`Buttons::poll`] turns a
//! sample of all five lines into press, release and long-press events.

pub mod button;
pub mod buttons;

pub use button::{ButtonSlot, Edge};
pub use buttons::{ButtonEvent, ButtonEventKind, Buttons, BUTTON_COUNT};
