//! Opportunity signals produced by a `SignalEvaluator`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of trade directions a signal can propose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalAction {
    Acquire,
    Dispose,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Acquire => write!(f, "acquire"),
            SignalAction::Dispose => write!(f, "dispose"),
        }
    }
}

/// One evaluation of one observed event. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSignal {
    pub valid: bool,
    pub action: SignalAction,
    /// Expected gain in percent, always >= 0
    pub magnitude: f64,
    /// In [0, 1] when present
    pub confidence: Option<f64>,
}

impl EventSignal {
    /// Clamps magnitude to >= 0 and confidence to [0, 1]; NaN becomes 0.
    pub fn new(valid: bool, action: SignalAction, magnitude: f64, confidence: Option<f64>) -> Self {
        let magnitude = if magnitude.is_finite() { magnitude.max(0.0) } else { 0.0 };
        let confidence = confidence.map(|c| if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) });

        Self {
            valid,
            action,
            magnitude,
            confidence,
        }
    }

    /// Magnitude converted to basis points (1% = 100 bps), rounded to nearest.
    pub fn magnitude_bps(&self) -> u64 {
        (self.magnitude * 100.0).round() as u64
    }
}
