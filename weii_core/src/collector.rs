//! Bounded sample buffer fed through the threshold gate.

use crate::gate::{GateDecision, ThresholdGate};

/// Accepted samples in arrival order, never longer than its capacity.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: Vec<f64>,
    max: usize,
}

impl SampleWindow {
    pub fn with_capacity(max: usize) -> Self {
        let max = max.max(1);
        Self {
            samples: Vec::with_capacity(max),
            max,
        }
    }

    /// Append unless full. Returns false when the sample was not stored.
    pub fn push(&mut self, kg: f64) -> bool {
        if self.is_full() {
            return false;
        }
        self.samples.push(kg);
        true
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.max
    }

    pub fn capacity(&self) -> usize {
        self.max
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }
}

/// What happened to one offered sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Below threshold before anyone stepped on.
    Ignored,
    /// First accepted sample.
    Started,
    Accepted,
    /// Below threshold after collecting; the sample was not stored.
    SteppedOff,
    /// Stored, and the window is now at capacity.
    Full,
}

impl Offer {
    /// True when collection is over.
    pub fn is_final(self) -> bool {
        matches!(self, Self::SteppedOff | Self::Full)
    }
}

#[derive(Debug, Clone)]
pub struct SampleCollector {
    gate: ThresholdGate,
    window: SampleWindow,
}

impl SampleCollector {
    pub fn new(min_weight_kg: f64, max_samples: usize) -> Self {
        Self {
            gate: ThresholdGate::new(min_weight_kg),
            window: SampleWindow::with_capacity(max_samples),
        }
    }

    pub fn offer(&mut self, kg: f64) -> Offer {
        if self.window.is_full() {
            return Offer::Full;
        }
        match self.gate.judge(kg, self.window.len()) {
            GateDecision::Noise => Offer::Ignored,
            GateDecision::SteppedOff => Offer::SteppedOff,
            GateDecision::Accept => {
                self.window.push(kg);
                if self.window.is_full() {
                    Offer::Full
                } else if self.window.len() == 1 {
                    Offer::Started
                } else {
                    Offer::Accepted
                }
            }
        }
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn into_window(self) -> SampleWindow {
        self.window
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
