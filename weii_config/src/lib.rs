#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the balance-board scale.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - Every section has defaults, so an empty file is a valid config.
//! - `Config::save` writes the file atomically (temp file + rename).
pub mod atomic;

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Device name reported by the Linux wiimote driver for the balance board.
pub const DEFAULT_DEVICE_NAME: &str = "Nintendo Wii Remote Balance Board";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionSection {
    /// Added to the median weight (kg). Negative values compensate clothing etc.
    pub adjust_kg: f64,
    /// Readings below this weight (kg) mean nobody is standing on the board.
    pub min_weight_kg: f64,
    /// Stop collecting after this many accepted samples.
    pub max_samples: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            adjust_kg: 0.0,
            min_weight_kg: 20.0,
            max_samples: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceSection {
    /// Exact input device name to match.
    pub name: String,
    /// Interval between device lookups while waiting for the board (ms).
    pub poll_ms: u64,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_DEVICE_NAME.to_string(),
            poll_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HooksSection {
    /// Bluetooth address to disconnect after a successful measurement.
    /// Format is checked when the measurement starts, not here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disconnect_address: Option<String>,
    /// Shell command run after a successful measurement; `{weight}` is replaced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplaySection {
    /// How often the CLI refreshes the status line (ms).
    pub status_poll_ms: u64,
    /// Show pounds instead of kilograms.
    pub use_imperial: bool,
    /// Body height for the BMI line; omitted disables BMI output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    /// Imperial body height, whole feet. Preferred over `height_cm`
    /// when `use_imperial` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_ft: Option<u32>,
    /// Remaining inches on top of `height_ft`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_in: Option<f64>,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            status_poll_ms: 500,
            use_imperial: false,
            height_cm: None,
            height_ft: None,
            height_in: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Path to a JSON-lines log file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// "error" | "warn" | "info" | "debug" | "trace"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionSection,
    pub device: DeviceSection,
    pub hooks: HooksSection,
    pub display: DisplaySection,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    Ok(cfg)
}

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const ROTATIONS: [&str; 3] = ["never", "daily", "hourly"];

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Session
        let s = &self.session;
        if !s.adjust_kg.is_finite() || !(-20.0..=20.0).contains(&s.adjust_kg) {
            eyre::bail!("session.adjust_kg must be in [-20.0, 20.0]");
        }
        if !s.min_weight_kg.is_finite() || s.min_weight_kg <= 0.0 {
            eyre::bail!("session.min_weight_kg must be > 0");
        }
        if s.min_weight_kg > 250.0 {
            eyre::bail!("session.min_weight_kg is unreasonably large (>250 kg)");
        }
        if s.max_samples == 0 {
            eyre::bail!("session.max_samples must be >= 1");
        }
        if s.max_samples > 10_000 {
            eyre::bail!("session.max_samples is unreasonably large (>10000)");
        }

        // Device
        if self.device.name.trim().is_empty() {
            eyre::bail!("device.name must not be empty");
        }
        if self.device.poll_ms == 0 {
            eyre::bail!("device.poll_ms must be >= 1");
        }

        // Hooks
        if let Some(cmd) = &self.hooks.command
            && cmd.trim().is_empty()
        {
            eyre::bail!("hooks.command must not be blank when set");
        }

        // Display
        if self.display.status_poll_ms == 0 {
            eyre::bail!("display.status_poll_ms must be >= 1");
        }
        if let Some(h) = self.display.height_cm
            && !(h.is_finite() && h > 0.0 && h <= 300.0)
        {
            eyre::bail!("display.height_cm must be in (0, 300]");
        }
        if let Some(ft) = self.display.height_ft
            && !(1..=9).contains(&ft)
        {
            eyre::bail!("display.height_ft must be in [1, 9]");
        }
        if let Some(inches) = self.display.height_in {
            if self.display.height_ft.is_none() {
                eyre::bail!("display.height_in needs display.height_ft");
            }
            if !(inches.is_finite() && (0.0..12.0).contains(&inches)) {
                eyre::bail!("display.height_in must be in [0, 12)");
            }
        }

        // Logging
        if let Some(level) = &self.logging.level
            && !LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            eyre::bail!("logging.level must be one of {}", LEVELS.join("|"));
        }
        if let Some(rot) = &self.logging.rotation
            && !ROTATIONS.contains(&rot.to_ascii_lowercase().as_str())
        {
            eyre::bail!("logging.rotation must be one of {}", ROTATIONS.join("|"));
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> eyre::Result<String> {
        toml::to_string_pretty(self).wrap_err("serialize config")
    }

    /// Validate, then atomically replace the file at `path`.
    pub fn save(&self, path: &Path) -> eyre::Result<()> {
        self.validate()?;
        let text = self.to_toml_string()?;
        atomic::write_atomic(path, text.as_bytes())
            .wrap_err_with(|| format!("write config {}", path.display()))
    }
}
