//! Compiled-in device configuration
//!
//! `device.toml` is embedded at build time and already checked by the
//! build script, so a parse failure here means the two disagree. The
//! device still boots, on defaults.

use defmt::*;
use klaxon_core::{parse_config, DeviceConfig};

/// Embedded configuration (edit device.toml and rebuild to customize)
const EMBEDDED_CONFIG: &str = include_str!("../device.toml");

/// Parse the embedded configuration, falling back to defaults
pub fn load() -> DeviceConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Config: radio={} {}Hz {}dBm, audio={}",
                config.radio_enabled,
                config.radio.frequency_hz,
                config.radio.tx_power_dbm,
                config.audio_enabled
            );
            config
        }
        Err(e) => {
            warn!("device.toml rejected ({}), using defaults", e);
            DeviceConfig::default()
        }
    }
}
