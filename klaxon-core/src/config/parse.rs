//! Simple TOML parser for device configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! `device.toml`. It does NOT support the full TOML grammar.
//!
//! Supported features:
//! - Key = value pairs (integer, boolean)
//! - Underscore digit separators (`915_000_000`)
//! - `[device]`, `[radio]`, `[timing]` and `[audio]` section headers
//! - Comments (# ...)
//!
//! Keys missing from the file keep their defaults. Unknown sections and
//! keys are errors so a typo cannot silently fall back to a default.

use super::types::DeviceConfig;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not recognized in its section
    UnknownKey,
    /// Value missing, of the wrong type or out of range
    InvalidValue,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Device,
    Radio,
    Timing,
    Audio,
}

/// Parse TOML configuration into DeviceConfig
pub fn parse_config(input: &str) -> Result<DeviceConfig, ParseError> {
    let mut config = DeviceConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        // Check for section header
        if let Some(header) = line.strip_prefix('[') {
            let header = header.strip_suffix(']').ok_or(ParseError::InvalidSection)?;
            section = parse_section_header(header)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidValue)?;
        apply_value(section, key, value, &mut config)?;
    }

    Ok(config)
}

/// Parse section header like "radio"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "device" => Ok(Section::Device),
        "radio" => Ok(Section::Radio),
        "timing" => Ok(Section::Timing),
        "audio" => Ok(Section::Audio),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Remove a trailing `# comment`
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse an integer value, allowing `_` separators
fn parse_int<T: TryFrom<i64>>(value: &str) -> Result<T, ParseError> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') {
        return Err(ParseError::InvalidValue);
    }

    let mut acc: i64 = 0;
    for ch in digits.chars() {
        if ch == '_' {
            continue;
        }
        let digit = ch.to_digit(10).ok_or(ParseError::InvalidValue)?;
        acc = acc
            .checked_mul(10)
            .and_then(|v| v.checked_add(i64::from(digit)))
            .ok_or(ParseError::InvalidValue)?;
    }

    if negative {
        acc = -acc;
    }
    T::try_from(acc).map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut DeviceConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Root => return Err(ParseError::UnknownKey),
        Section::Device => match key {
            "radio_enabled" => config.radio_enabled = parse_bool(value)?,
            "audio_enabled" => config.audio_enabled = parse_bool(value)?,
            _ => return Err(ParseError::UnknownKey),
        },
        Section::Radio => {
            let radio = &mut config.radio;
            match key {
                "frequency_hz" => radio.frequency_hz = parse_int(value)?,
                "tx_power_dbm" => radio.tx_power_dbm = parse_int(value)?,
                "bandwidth_hz" => radio.bandwidth_hz = parse_int(value)?,
                "spreading_factor" => radio.spreading_factor = parse_int(value)?,
                "coding_rate" => radio.coding_rate = parse_int(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Timing => {
            let timing = &mut config.timing;
            let field = match key {
                "debounce_ms" => &mut timing.debounce_ms,
                "long_press_ms" => &mut timing.long_press_ms,
                "hold_resend_ms" => &mut timing.hold_resend_ms,
                "panic_resend_ms" => &mut timing.panic_resend_ms,
                "keepalive_ms" => &mut timing.keepalive_ms,
                "receive_timeout_ms" => &mut timing.receive_timeout_ms,
                "quality_timeout_ms" => &mut timing.quality_timeout_ms,
                "refresh_ms" => &mut timing.refresh_ms,
                "panic_toggle_ms" => &mut timing.panic_toggle_ms,
                "notice_ms" => &mut timing.notice_ms,
                _ => return Err(ParseError::UnknownKey),
            };
            *field = parse_int(value)?;
        }
        Section::Audio => {
            let tones = &mut config.tones;
            let field = match key {
                "beep_ms" => &mut tones.beep_ms,
                "beep_hz" => &mut tones.beep_hz,
                "click_ms" => &mut tones.click_ms,
                "click_hz" => &mut tones.click_hz,
                "panic_hz" => &mut tones.panic_hz,
                _ => return Err(ParseError::UnknownKey),
            };
            *field = parse_int(value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_is_default() {
        assert_eq!(parse_config("").unwrap(), DeviceConfig::default());
        assert_eq!(
            parse_config("# only a comment\n\n").unwrap(),
            DeviceConfig::default()
        );
    }

    #[test]
    fn test_parse_full_config() {
        let input = r#"
# Klaxon handset
[device]
radio_enabled = true
audio_enabled = false   # quiet build

[radio]
frequency_hz = 868_100_000
tx_power_dbm = 14
bandwidth_hz = 250_000
spreading_factor = 9
coding_rate = 6

[timing]
debounce_ms = 20
keepalive_ms = 0

[audio]
beep_hz = 3500
"#;
        let config = parse_config(input).unwrap();
        assert!(config.radio_enabled);
        assert!(!config.audio_enabled);
        assert_eq!(config.radio.frequency_hz, 868_100_000);
        assert_eq!(config.radio.tx_power_dbm, 14);
        assert_eq!(config.radio.bandwidth_hz, 250_000);
        assert_eq!(config.radio.spreading_factor, 9);
        assert_eq!(config.radio.coding_rate, 6);
        assert_eq!(config.timing.debounce_ms, 20);
        assert_eq!(config.timing.keepalive_ms, 0);
        assert_eq!(config.timing.long_press_ms, 1000);
        assert_eq!(config.tones.beep_hz, 3500);
        assert_eq!(config.tones.beep_ms, 80);
    }

    #[test]
    fn test_parse_section_header() {
        assert_eq!(parse_section_header("radio"), Ok(Section::Radio));
        assert_eq!(parse_section_header(" timing "), Ok(Section::Timing));
        assert_eq!(
            parse_section_header("stepper"),
            Err(ParseError::InvalidSection)
        );
        assert_eq!(parse_config("[radio"), Err(ParseError::InvalidSection));
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(
            parse_config("[timing]\ndebounce = 5"),
            Err(ParseError::UnknownKey)
        );
        assert_eq!(parse_config("radio_enabled = true"), Err(ParseError::UnknownKey));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse_config("[device]\nradio_enabled = yes"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[radio]\nspreading_factor = 300"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[timing]\nrefresh_ms = -1"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(parse_config("[timing]\nrefresh_ms"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int::<u32>("915_000_000"), Ok(915_000_000));
        assert_eq!(parse_int::<i8>("-4"), Ok(-4));
        assert_eq!(parse_int::<i8>("+17"), Ok(17));
        assert_eq!(parse_int::<u8>("_1"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u8>("1x"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u8>(""), Err(ParseError::InvalidValue));
    }
}
