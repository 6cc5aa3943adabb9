//! Klaxon Radio Frame Protocol
//!
//! This crate defines the over-the-air protocol between two Klaxon units.
//! Every frame is one unacknowledged broadcast packet holding a short ASCII
//! command; there is no binary header, length prefix or checksum (the radio
//! supplies its own CRC).
//!
//! # Frame Shapes
//!
//! ```text
//! P<slot>          remote button <slot> pressed / still held
//! P<slot>|<label>  same, carrying the sender's name
//! R<slot>          remote button <slot> released
//! B                beep request
//! X|<label>        panic alert carrying the sender's name (label may be empty)
//! TX               keepalive, used only for link-quality estimation
//! <slot>           legacy single-digit press
//! ```
//!
//! `<slot>` is an ASCII digit `1`..`4`. Labels are at most
//! [`MAX_LABEL_LEN`] printable ASCII bytes with trailing spaces trimmed.

#![no_std]
#![deny(unsafe_code)]

pub mod frame;
pub mod signal;

pub use frame::{label_from_name, Frame, FrameError, Label, RemoteSlot, MAX_FRAME_LEN, MAX_LABEL_LEN};
pub use signal::{signal_percent, RSSI_CEILING_DBM, RSSI_FLOOR_DBM};
