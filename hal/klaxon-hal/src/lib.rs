//! Klaxon Hardware Abstraction Layer
//!
//! This crate defines the collaborator traits the Klaxon event core talks
//! to. Board crates (RP2040 today) and driver crates implement them; the
//! core only ever sees the traits, which keeps it testable on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  klaxon-core (Device::tick)             │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  klaxon-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ klaxon-hal-   │       │ klaxon-       │
//! │    rp2040     │       │   drivers     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::InputPin`] - Momentary button lines
//! - [`tone::ToneOutput`] - Buzzer
//! - [`store::ByteStore`] - Byte-addressable persistent storage
//! - [`radio::Radio`] - Packet transceiver

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod radio;
pub mod store;
pub mod tone;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, Level};
pub use radio::{Radio, RadioError, RadioSettings, MAX_PACKET_LEN};
pub use store::{ByteStore, StorageKey, StoreError};
pub use tone::ToneOutput;
