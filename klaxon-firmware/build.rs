//! Build script for klaxon-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates device.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Known keys per section, with their expected kind
const SCHEMA: &[(&str, &[(&str, Kind)])] = &[
    (
        "device",
        &[("radio_enabled", Kind::Bool), ("audio_enabled", Kind::Bool)],
    ),
    (
        "radio",
        &[
            ("frequency_hz", Kind::Int(137_000_000, 1_020_000_000)),
            ("tx_power_dbm", Kind::Int(2, 20)),
            ("bandwidth_hz", Kind::Int(1, 500_000)),
            ("spreading_factor", Kind::Int(6, 12)),
            ("coding_rate", Kind::Int(5, 8)),
        ],
    ),
    (
        "timing",
        &[
            ("debounce_ms", Kind::Int(0, 1000)),
            ("long_press_ms", Kind::Int(1, 60_000)),
            ("hold_resend_ms", Kind::Int(1, 60_000)),
            ("panic_resend_ms", Kind::Int(1, 60_000)),
            ("keepalive_ms", Kind::Int(0, 3_600_000)),
            ("receive_timeout_ms", Kind::Int(1, 60_000)),
            ("quality_timeout_ms", Kind::Int(1, 3_600_000)),
            ("refresh_ms", Kind::Int(1, 10_000)),
            ("panic_toggle_ms", Kind::Int(1, 10_000)),
            ("notice_ms", Kind::Int(0, 60_000)),
        ],
    ),
    (
        "audio",
        &[
            ("beep_ms", Kind::Int(0, 10_000)),
            ("beep_hz", Kind::Int(30, 20_000)),
            ("click_ms", Kind::Int(0, 10_000)),
            ("click_hz", Kind::Int(30, 20_000)),
            ("panic_hz", Kind::Int(30, 20_000)),
        ],
    ),
];

#[derive(Clone, Copy)]
enum Kind {
    Bool,
    /// Inclusive range
    Int(i64, i64),
}

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate device.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=device.toml");

    let config_path = Path::new("device.toml");
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read device.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in device.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let errors = check_schema(&config);
    if !errors.is_empty() {
        fail("Invalid device.toml", &errors);
    }

    println!("cargo:warning=device.toml validated successfully");
}

/// Check every section and key against [`SCHEMA`]
fn check_schema(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();

    let root = match config.as_table() {
        Some(t) => t,
        None => return vec!["top level must be a table".to_string()],
    };

    for (section, value) in root {
        let Some((_, keys)) = SCHEMA.iter().find(|(name, _)| name == section) else {
            errors.push(format!("unknown section [{}]", section));
            continue;
        };
        let Some(table) = value.as_table() else {
            errors.push(format!("[{}] must be a table", section));
            continue;
        };

        for (key, value) in table {
            let Some((_, kind)) = keys.iter().find(|(name, _)| name == key) else {
                errors.push(format!("[{}] unknown key '{}'", section, key));
                continue;
            };

            match (kind, value) {
                (Kind::Bool, toml::Value::Boolean(_)) => {}
                (Kind::Bool, _) => {
                    errors.push(format!("[{}] {} must be true or false", section, key));
                }
                (Kind::Int(min, max), toml::Value::Integer(v)) => {
                    if v < min || v > max {
                        errors.push(format!(
                            "[{}] {} must be {}-{}",
                            section, key, min, max
                        ));
                    }
                }
                (Kind::Int(..), _) => {
                    errors.push(format!("[{}] {} must be an integer", section, key));
                }
            }
        }
    }

    errors
}

/// Abort the build with a boxed error report
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<57}║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        lines
            .iter()
            .map(|line| {
                let truncated = if line.len() > 62 {
                    format!("{}...", &line[..59])
                } else {
                    line.to_string()
                };
                format!("║  • {:<62} ║", truncated)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}
