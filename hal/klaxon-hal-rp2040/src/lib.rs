//! RP2040-specific HAL for the Klaxon firmware
//!
//! This crate provides RP2040-specific implementations of the
//! `klaxon-hal` traits:
//! - Active-low button inputs with internal pull-ups
//! - PWM square-wave buzzer output
//! - Flash-backed byte store emulating a small EEPROM

#![no_std]

pub mod button;
pub mod eeprom;
pub mod tone;

pub use button::Button;
pub use eeprom::FlashEeprom;
pub use tone::PwmTone;
