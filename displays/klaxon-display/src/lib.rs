//! Character display abstraction for Klaxon
//!
//! This crate provides:
//! - `CharDisplay` trait for cursor-addressed character LCDs
//! - `Screen`, a shadow copy of the grid that only pushes changed rows
//! - `Line`, a fixed-capacity buffer for composing one row of text
//!
//! # Architecture
//!
//! The core composes whole rows into a `Screen`. On flush the screen
//! compares each row against what it last sent and rewrites only the rows
//! that differ, always at full width, so shorter text never leaves stale
//! characters from a longer string behind. A full redraw clears the panel
//! first and repaints every row.

#![no_std]
#![deny(unsafe_code)]

pub mod backend;
pub mod screen;

// Re-export key types
pub use backend::{CharDisplay, DisplayError};
pub use screen::{Line, Screen, SCREEN_COLS, SCREEN_ROWS};
