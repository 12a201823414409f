//! Minimum-weight rule separating "nobody on the board" from "someone standing".
//!
//! The same threshold is used for stepping on and stepping off.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Below threshold and nothing collected yet.
    Noise,
    /// At or above threshold; the sample counts.
    Accept,
    /// Below threshold after at least one sample was collected.
    SteppedOff,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdGate {
    min_weight_kg: f64,
}

impl ThresholdGate {
    pub fn new(min_weight_kg: f64) -> Self {
        Self { min_weight_kg }
    }

    /// Classify `sample_kg` given how many samples the window already holds.
    #[inline]
    pub fn judge(&self, sample_kg: f64, collected: usize) -> GateDecision {
        if sample_kg >= self.min_weight_kg {
            GateDecision::Accept
        } else if collected == 0 {
            GateDecision::Noise
        } else {
            GateDecision::SteppedOff
        }
    }
}
