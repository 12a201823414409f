//! `From` implementations bridging `weii_config` types to `weii_core` types.

use std::time::Duration;

use crate::body;
use crate::config::SessionConfig;

impl From<&weii_config::SessionSection> for SessionConfig {
    fn from(c: &weii_config::SessionSection) -> Self {
        Self {
            adjust_kg: c.adjust_kg,
            min_weight_kg: c.min_weight_kg,
            max_samples: c.max_samples,
        }
    }
}

/// Device lookup interval from the `[device]` section.
pub fn poll_interval(c: &weii_config::DeviceSection) -> Duration {
    Duration::from_millis(c.poll_ms.max(1))
}

/// Body height in cm for the BMI line, if one is configured.
///
/// Feet and inches win in imperial mode; otherwise `height_cm` does. Either
/// falls back to the other when it is missing.
pub fn body_height_cm(d: &weii_config::DisplaySection) -> Option<f64> {
    let imperial = d
        .height_ft
        .map(|ft| body::feet_inches_to_cm(ft, d.height_in.unwrap_or(0.0)));
    if d.use_imperial {
        imperial.or(d.height_cm)
    } else {
        d.height_cm.or(imperial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_section_maps_field_for_field() {
        let section = weii_config::SessionSection {
            adjust_kg: -1.5,
            min_weight_kg: 30.0,
            max_samples: 120,
        };
        let cfg = SessionConfig::from(&section);
        assert_eq!(cfg.adjust_kg, -1.5);
        assert_eq!(cfg.min_weight_kg, 30.0);
        assert_eq!(cfg.max_samples, 120);
    }

    #[test]
    fn default_device_section_polls_every_half_second() {
        let d = weii_config::DeviceSection::default();
        assert_eq!(poll_interval(&d), Duration::from_millis(500));
    }

    #[test]
    fn imperial_height_is_preferred_in_imperial_mode() {
        let mut d = weii_config::DisplaySection {
            height_cm: Some(180.0),
            height_ft: Some(5),
            height_in: Some(9.0),
            ..Default::default()
        };
        assert_eq!(body_height_cm(&d), Some(180.0));
        d.use_imperial = true;
        let cm = body_height_cm(&d).unwrap_or(0.0);
        assert!((cm - 175.26).abs() < 1e-9);
    }

    #[test]
    fn height_falls_back_across_units() {
        let d = weii_config::DisplaySection {
            height_ft: Some(6),
            ..Default::default()
        };
        let cm = body_height_cm(&d).unwrap_or(0.0);
        assert!((cm - 182.88).abs() < 1e-9);
        assert_eq!(body_height_cm(&weii_config::DisplaySection::default()), None);
    }
}
