//! Unit conversions and BMI for displaying a finished measurement.

use std::fmt;

pub const LB_PER_KG: f64 = 2.20462;
pub const CM_PER_INCH: f64 = 2.54;
pub const INCHES_PER_FOOT: f64 = 12.0;

#[inline]
pub fn kg_to_lb(kg: f64) -> f64 {
    kg * LB_PER_KG
}

#[inline]
pub fn lb_to_kg(lb: f64) -> f64 {
    lb / LB_PER_KG
}

#[inline]
pub fn inches_to_cm(inches: f64) -> f64 {
    inches * CM_PER_INCH
}

pub fn feet_inches_to_cm(feet: u32, inches: f64) -> f64 {
    inches_to_cm(feet as f64 * INCHES_PER_FOOT + inches)
}

/// Body mass index, or None for a non-positive height.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !(height_cm.is_finite() && height_cm > 0.0) {
        return None;
    }
    let m = height_cm / 100.0;
    Some(weight_kg / (m * m))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Category for a BMI value; None outside `[0, 100)`.
    pub fn classify(bmi: f64) -> Option<Self> {
        match bmi {
            b if (0.0..18.5).contains(&b) => Some(Self::Underweight),
            b if (18.5..25.0).contains(&b) => Some(Self::Normal),
            b if (25.0..30.0).contains(&b) => Some(Self::Overweight),
            b if (30.0..100.0).contains(&b) => Some(Self::Obese),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal weight",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
