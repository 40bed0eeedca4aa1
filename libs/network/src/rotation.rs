//! Monotonic rotation counters
//!
//! A counter only ever moves forward. Supervisors read it with
//! [`RotationCounter::current`] to pick an endpoint and advance it with
//! [`RotationCounter::next`] once per failed connection cycle. The
//! balance-reference counter is shared by every supervisor, so it also offers
//! [`RotationCounter::rotate_from`]: a compare-and-advance that lets several
//! callers who all saw the same failing endpoint rotate past it exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct RotationCounter {
    value: AtomicU64,
}

impl RotationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Advance by one, returning the new value.
    pub fn next(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Advance by one only if the counter still equals `observed`.
    ///
    /// Returns `true` when this call performed the rotation.
    pub fn rotate_from(&self, observed: u64) -> bool {
        self.value
            .compare_exchange(
                observed,
                observed.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Counter store: one counter per network name plus the shared balance-reference counter.
#[derive(Debug, Clone, Default)]
pub struct RotationCounters {
    per_network: HashMap<String, Arc<RotationCounter>>,
    reference: Arc<RotationCounter>,
}

impl RotationCounters {
    pub fn new<I, S>(networks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            per_network: networks
                .into_iter()
                .map(|name| (name.into(), Arc::new(RotationCounter::new())))
                .collect(),
            reference: Arc::new(RotationCounter::new()),
        }
    }

    pub fn network(&self, name: &str) -> Option<Arc<RotationCounter>> {
        self.per_network.get(name).cloned()
    }

    pub fn reference(&self) -> Arc<RotationCounter> {
        Arc::clone(&self.reference)
    }
}
