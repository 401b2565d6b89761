//! Resource bounds for one evaluation unit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared flag that interrupts a running evaluation.
///
/// Clones share the flag, so a token handed to another thread can stop
/// the session that owns the original.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag before a new request starts.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Budget applied to every top-level unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Evaluation steps before the unit is stopped.
    pub gas: u64,
    /// Nested non-tail calls before the unit is stopped.
    pub max_depth: usize,
    /// Wall-clock budget. `None` disables the clock entirely, which is
    /// required on targets without a monotonic timer.
    pub timeout: Option<Duration>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            gas: 10_000_000,
            max_depth: 10_000,
            timeout: None,
        }
    }
}
