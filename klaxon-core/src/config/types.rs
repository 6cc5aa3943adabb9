//! Configuration type definitions
//!
//! Every interval the core uses lives here so a board can retune the
//! device from its `device.toml` without touching the logic.

use klaxon_hal::RadioSettings;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Loop timing, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timing {
    /// Raw level must hold this long to commit
    pub debounce_ms: u32,
    /// Hold time for a long press
    pub long_press_ms: u32,
    /// `P` re-send interval while the transmit button is held
    pub hold_resend_ms: u32,
    /// `X` re-send interval during a local panic
    pub panic_resend_ms: u32,
    /// `TX` keepalive interval; 0 disables
    pub keepalive_ms: u32,
    /// Remote slot expiry without refresh
    pub receive_timeout_ms: u32,
    /// Link quality decays to 0 after this much silence
    pub quality_timeout_ms: u32,
    /// Idle view refresh throttle
    pub refresh_ms: u32,
    /// Panic alarm on/off period
    pub panic_toggle_ms: u32,
    /// Transient notice display time
    pub notice_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            debounce_ms: 10,
            long_press_ms: 1000,
            hold_resend_ms: 200,
            panic_resend_ms: 500,
            keepalive_ms: 5000,
            receive_timeout_ms: 1000,
            quality_timeout_ms: 5000,
            refresh_ms: 100,
            panic_toggle_ms: 250,
            notice_ms: 600,
        }
    }
}

/// Buzzer pitches and lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ToneSettings {
    /// Button/frame beep length
    pub beep_ms: u32,
    /// Button/frame beep pitch
    pub beep_hz: u32,
    /// Name editor click length
    pub click_ms: u32,
    /// Name editor click pitch
    pub click_hz: u32,
    /// Panic alarm pitch
    pub panic_hz: u32,
}

impl Default for ToneSettings {
    fn default() -> Self {
        Self {
            beep_ms: 80,
            beep_hz: 4000,
            click_ms: 40,
            click_hz: 2000,
            panic_hz: 3000,
        }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceConfig {
    /// Use the radio at all
    pub radio_enabled: bool,
    /// Drive the buzzer
    pub audio_enabled: bool,
    /// Modem settings applied at boot
    pub radio: RadioSettings,
    /// Loop timing
    pub timing: Timing,
    /// Buzzer settings
    pub tones: ToneSettings,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            radio_enabled: true,
            audio_enabled: true,
            radio: RadioSettings::default(),
            timing: Timing::default(),
            tones: ToneSettings::default(),
        }
    }
}
