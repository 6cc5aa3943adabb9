//! Board-agnostic event/state core for the Klaxon panic-button firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Debounced button tracking and long-press detection
//! - Mode state machine (normal / naming / panic)
//! - Name editor with persistence through a byte store
//! - Remote slot liveness, link quality and retransmit timers
//! - Non-blocking tone scheduling and the panic cadence
//! - Display composition for the 16x2 character panel
//! - Configuration types and a minimal TOML parser
//!
//! [`Device`] owns every collaborator and runs one loop iteration per
//! [`Device::tick`] call.

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod device;
pub mod input;
pub mod link;
pub mod name;
pub mod state;
pub mod time;
pub mod tone;
pub mod view;

pub use config::{parse_config, DeviceConfig, ParseError, Timing, ToneSettings};
pub use device::Device;
pub use link::LinkStatus;
pub use state::{Event, Mode, PanicOrigin};
