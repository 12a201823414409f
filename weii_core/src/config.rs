//! Runtime configuration for a measurement session.
//!
//! Separate from the TOML schema in `weii_config`; see `conversions` for the
//! mapping.

use std::time::Duration;

/// Pause between device lookups while waiting for the board.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub const DEFAULT_MIN_WEIGHT_KG: f64 = 20.0;
pub const DEFAULT_MAX_SAMPLES: usize = 200;

/// Fixed for the lifetime of one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Added to the median.
    pub adjust_kg: f64,
    /// Step-on and step-off threshold.
    pub min_weight_kg: f64,
    /// Collection ends once this many samples are stored.
    pub max_samples: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            adjust_kg: 0.0,
            min_weight_kg: DEFAULT_MIN_WEIGHT_KG,
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.adjust_kg.is_finite() {
            return Err("adjust_kg must be finite");
        }
        if !self.min_weight_kg.is_finite() || self.min_weight_kg <= 0.0 {
            return Err("min_weight_kg must be > 0");
        }
        if self.max_samples == 0 {
            return Err("max_samples must be >= 1");
        }
        Ok(())
    }
}
