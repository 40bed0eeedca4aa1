//! Opportunity signal evaluation
//!
//! The scoring algorithm is external to the executor; [`SignalEvaluator`] is
//! the seam. [`HeuristicEvaluator`] is the reference stand-in: a bounded
//! random walk over a price delta, always reporting a valid signal.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vigil_types::{EventSignal, SignalAction};

pub trait SignalEvaluator: Send + Sync {
    fn evaluate(&self, event_ref: &str) -> EventSignal;
}

/// Largest absolute delta the walk can reach (10%)
const MAX_DELTA: f64 = 0.10;
/// Fraction of the previous delta carried into the next step
const MOMENTUM: f64 = 0.5;

struct WalkState {
    rng: StdRng,
    delta: f64,
}

pub struct HeuristicEvaluator {
    state: Mutex<WalkState>,
}

impl HeuristicEvaluator {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic sequence for tests
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(WalkState { rng, delta: 0.0 }),
        }
    }
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalEvaluator for HeuristicEvaluator {
    fn evaluate(&self, _event_ref: &str) -> EventSignal {
        let mut state = self.state.lock();
        let step = (state.rng.gen::<f64>() - 0.5) * 2.0 * MAX_DELTA;
        state.delta = (state.delta * MOMENTUM + step).clamp(-MAX_DELTA, MAX_DELTA);
        let confidence = state.rng.gen::<f64>();

        let action = if state.delta < 0.0 {
            SignalAction::Acquire
        } else {
            SignalAction::Dispose
        };

        EventSignal::new(true, action, (state.delta * 100.0).abs(), Some(confidence))
    }
}
