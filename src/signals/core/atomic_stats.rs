/*!
 * Lock-Free Signal Statistics
 * Uses atomic counters for zero-contention stats tracking in hot paths
 */

use super::types::SignalStats;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic signal statistics for lock-free updates
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - All operations use relaxed ordering
#[repr(C, align(64))]
#[derive(Debug)]
pub struct AtomicSignalStats {
    traps_installed: AtomicU64,
    signals_sent: AtomicU64,
    handlers_invoked: AtomicU64,
    occurrences_discarded: AtomicU64,
}

impl AtomicSignalStats {
    #[inline]
    pub const fn new() -> Self {
        Self {
            traps_installed: AtomicU64::new(0),
            signals_sent: AtomicU64::new(0),
            handlers_invoked: AtomicU64::new(0),
            occurrences_discarded: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn inc_traps(&self) {
        self.traps_installed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_sent(&self) {
        self.signals_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Hot path - called once per handler run inside a drain
    #[inline(always)]
    pub fn inc_invoked(&self) {
        self.handlers_invoked.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_discarded(&self) {
        self.occurrences_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats (no locks required)
    ///
    /// `pending_overflows` is owned by the backend and filled in by the caller.
    #[inline]
    pub fn snapshot(&self, pending_overflows: u64) -> SignalStats {
        SignalStats {
            traps_installed: self.traps_installed.load(Ordering::Relaxed),
            signals_sent: self.signals_sent.load(Ordering::Relaxed),
            handlers_invoked: self.handlers_invoked.load(Ordering::Relaxed),
            occurrences_discarded: self.occurrences_discarded.load(Ordering::Relaxed),
            pending_overflows,
        }
    }
}

impl Default for AtomicSignalStats {
    fn default() -> Self {
        Self::new()
    }
}
