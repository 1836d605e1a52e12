//! Time sources for the store and scheduler.
//!
//! # Invariants
//! - All instants are Unix epoch milliseconds (UTC).
//! - `ManualClock` only moves when told to; tests rely on it being frozen.

use crate::model::reminder::EpochMs;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of "now" for reconciliation and timer firing.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> EpochMs;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> EpochMs {
        Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock for deterministic driving.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: EpochMs) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: EpochMs) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Moves the clock forward by `delta_ms` and returns the new instant.
    pub fn advance(&self, delta_ms: i64) -> EpochMs {
        self.now.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> EpochMs {
        self.now.load(Ordering::SeqCst)
    }
}
