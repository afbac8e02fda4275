//! Process-wide invocation counters.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use wflambda_domain::CounterDeltas;

/// Monotonic counter that remembers how much has already been reported.
#[derive(Debug, Default)]
pub struct DeltaCounter {
    total: AtomicU64,
    reported: AtomicU64,
}

impl DeltaCounter {
    /// Add `value` and return the new total.
    pub fn increment(&self, value: u64) -> u64 {
        self.total.fetch_add(value, Ordering::AcqRel) + value
    }

    /// Cumulative total.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Increase since the previous call, marking it as reported.
    pub fn take_delta(&self) -> u64 {
        let total = self.total.load(Ordering::Acquire);
        let previous = self.reported.fetch_max(total, Ordering::AcqRel);
        total.saturating_sub(previous)
    }
}

/// Cumulative counter totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Invocations started.
    pub invocations: u64,
    /// Invocations that returned an error or panicked.
    pub errors: u64,
    /// Cold starts observed.
    pub cold_starts: u64,
}

/// Counters shared by every invocation of one agent.
#[derive(Debug)]
pub struct InvocationCounters {
    /// Invocation counter.
    pub invocations: DeltaCounter,
    /// Error counter.
    pub errors: DeltaCounter,
    /// Cold start counter.
    pub cold_starts: DeltaCounter,
    cold_start: AtomicBool,
}

impl Default for InvocationCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl InvocationCounters {
    /// Fresh counters with the cold-start flag set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            invocations: DeltaCounter::default(),
            errors: DeltaCounter::default(),
            cold_starts: DeltaCounter::default(),
            cold_start: AtomicBool::new(true),
        }
    }

    /// Returns true for exactly one caller, then false forever.
    pub fn take_cold_start(&self) -> bool {
        self.cold_start.swap(false, Ordering::AcqRel)
    }

    /// Unreported cold start and invocation increases.
    pub fn take_deltas(&self) -> CounterDeltas {
        CounterDeltas {
            cold_starts: self.cold_starts.take_delta(),
            invocations: self.invocations.take_delta(),
        }
    }

    /// Cumulative totals.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            invocations: self.invocations.total(),
            errors: self.errors.total(),
            cold_starts: self.cold_starts.total(),
        }
    }
}
