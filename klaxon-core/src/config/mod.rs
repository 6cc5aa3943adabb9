//! Configuration types
//!
//! Board-agnostic device configuration and its TOML loader.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::*;
