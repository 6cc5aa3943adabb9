//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in klaxon-hal and klaxon-display, written against the blocking
//! `embedded-hal` 1.0 bus traits so they run on any board:
//!
//! - Radio (SX1276/77/78/79 LoRa transceiver over SPI)
//! - Display (HD44780 character LCD behind a PCF8574 I2C backpack)

#![no_std]
#![deny(unsafe_code)]

pub mod display;
pub mod radio;
