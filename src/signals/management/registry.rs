/*!
 * Signal Registry
 * Process-wide dispositions, masking and the synchronous drain point
 */

use crate::monitoring::DrainSpan;
use crate::signals::backend::UnixBackend;
use crate::signals::core::identity::{resolve, resolve_all};
use crate::signals::core::traits::{MaskOp, SignalBackend};
use crate::signals::core::types::*;
use crate::signals::core::AtomicSignalStats;
use crate::signals::handler::{execute, Disposition, SignalOutcome};
use crate::core::types::Pid;
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// The registry every free function in this crate operates on
static GLOBAL_REGISTRY: OnceLock<SignalRegistry> = OnceLock::new();

/// Clears the draining flag even if a handler panics
struct DrainReset<'a>(&'a Cell<bool>);

impl Drop for DrainReset<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Signal registry
///
/// Maps each signal number to its [`Disposition`]. A missing entry means
/// Default. All table and OS disposition changes go through `trap`, which
/// holds one lock for the whole change so the two never disagree.
pub struct SignalRegistry<B: SignalBackend = UnixBackend> {
    table: DashMap<SignalNumber, Disposition, RandomState>,
    trap_lock: Mutex<()>,
    /// Serializes drains across threads; the flag detects a drain started
    /// from inside a handler on the same thread
    drain_lock: ReentrantMutex<Cell<bool>>,
    backend: B,
    stats: AtomicSignalStats,
    /// Overflow count already reported by a drain
    overflows_reported: AtomicU64,
}

impl SignalRegistry<UnixBackend> {
    /// Get or initialize the process-wide registry
    pub fn global() -> &'static Self {
        GLOBAL_REGISTRY.get_or_init(|| {
            info!("Signal registry initialized");
            Self::with_backend(UnixBackend::new())
        })
    }
}

impl<B: SignalBackend> SignalRegistry<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            table: DashMap::with_hasher(RandomState::new()),
            trap_lock: Mutex::new(()),
            drain_lock: ReentrantMutex::new(Cell::new(false)),
            backend,
            stats: AtomicSignalStats::new(),
            overflows_reported: AtomicU64::new(0),
        }
    }

    /// Bind a disposition to a signal, replacing whatever was bound
    ///
    /// Switching to Ignore or Default discards deliveries recorded but not
    /// yet drained. Handler to Handler keeps them for the new handler.
    pub fn trap<'a>(
        &self,
        signal: impl Into<SignalRef<'a>>,
        disposition: Disposition,
    ) -> SignalResult<()> {
        let signal = resolve(signal)?;
        let kind = disposition.kind();

        let _guard = self.trap_lock.lock();
        // Table first: a concurrent drain must never see the new OS action
        // paired with the old entry
        let os_action = disposition.os_action();
        let previous = self.table.insert(signal, disposition);
        if let Err(e) = self.backend.install(signal, os_action) {
            match previous {
                Some(previous) => {
                    self.table.insert(signal, previous);
                }
                None => {
                    self.table.remove(&signal);
                }
            }
            return Err(e);
        }
        if kind != DispositionKind::Handler {
            self.backend.discard_pending(signal);
        }
        self.stats.inc_traps();

        info!(signal = %signal, disposition = ?kind, "Trapped signal");
        Ok(())
    }

    /// Current disposition for a signal
    pub fn disposition<'a>(&self, signal: impl Into<SignalRef<'a>>) -> SignalResult<DispositionKind> {
        let signal = resolve(signal)?;
        Ok(self.kind_of(signal))
    }

    fn kind_of(&self, signal: SignalNumber) -> DispositionKind {
        self.table
            .get(&signal)
            .map(|entry| entry.value().kind())
            .unwrap_or(DispositionKind::Default)
    }

    /// Restore Default for every signal bound to something else
    pub fn reset(&self) -> SignalResult<usize> {
        let trapped: Vec<SignalNumber> = self
            .table
            .iter()
            .filter(|entry| entry.value().kind() != DispositionKind::Default)
            .map(|entry| *entry.key())
            .collect();

        for signal in &trapped {
            self.trap(*signal, Disposition::Default)?;
        }

        info!(count = trapped.len(), "Reset signal dispositions");
        Ok(trapped.len())
    }

    /// Run handlers for every recorded delivery, in delivery order
    ///
    /// Only deliveries recorded before the call are handled; anything a
    /// handler sends waits for the next drain. Returns the number of handler
    /// invocations. Calling this from inside a handler returns 0 immediately.
    pub fn dispatch(&self) -> usize {
        let draining = self.drain_lock.lock();
        if draining.replace(true) {
            debug!("Nested drain ignored");
            return 0;
        }
        let _reset = DrainReset(&draining);

        let mut span = DrainSpan::new();
        for occurrence in self.backend.take_pending() {
            // Clone out so no table shard is locked while the handler runs
            let disposition = self
                .table
                .get(&occurrence.signal)
                .map(|entry| entry.value().clone())
                .unwrap_or_default();

            let outcome = {
                let _entered = span.enter();
                execute(occurrence, &disposition)
            };
            match outcome {
                SignalOutcome::HandlerInvoked => {
                    self.stats.inc_invoked();
                    span.record_invoked();
                }
                SignalOutcome::Discarded => {
                    self.stats.inc_discarded();
                    span.record_discarded();
                }
            }
        }

        let overflowed = self.backend.overflowed();
        let reported = self.overflows_reported.swap(overflowed, Ordering::Relaxed);
        if overflowed > reported {
            warn!(lost = overflowed - reported, "Pending signal log overflowed");
        }

        span.invoked()
    }

    /// Send a signal without draining
    ///
    /// `None` targets the calling thread of this process.
    pub fn send(&self, signal: SignalNumber, target: Option<Pid>) -> SignalResult<()> {
        self.backend.send(signal, target)?;
        self.stats.inc_sent();
        debug!(signal = %signal, pid = ?target, "Sent signal");
        Ok(())
    }

    /// Add signals to the mask
    ///
    /// Every reference is resolved before the mask is touched. KILL and STOP
    /// are left out.
    pub fn block<'a, I, R>(&self, signals: I) -> SignalResult<()>
    where
        I: IntoIterator<Item = R>,
        R: Into<SignalRef<'a>>,
    {
        self.apply_mask(MaskOp::Block, resolve_all(signals)?)
    }

    /// Remove signals from the mask; anything pending is delivered at once
    pub fn unblock<'a, I, R>(&self, signals: I) -> SignalResult<()>
    where
        I: IntoIterator<Item = R>,
        R: Into<SignalRef<'a>>,
    {
        self.apply_mask(MaskOp::Unblock, resolve_all(signals)?)
    }

    fn apply_mask(&self, op: MaskOp, signals: Vec<SignalNumber>) -> SignalResult<()> {
        if signals.is_empty() {
            return Ok(());
        }
        self.backend.mask(op, &signals)?;
        info!(op = ?op, count = signals.len(), "Updated signal mask");
        Ok(())
    }

    /// Signals currently blocked
    pub fn blocked(&self) -> SignalResult<Vec<SignalNumber>> {
        self.backend.blocked()
    }

    pub fn stats(&self) -> SignalStats {
        self.stats.snapshot(self.backend.overflowed())
    }

    /// Snapshot of dispositions, mask and pending deliveries
    pub fn state(&self) -> SignalResult<RegistryState> {
        let mut trapped: Vec<(SignalNumber, DispositionKind)> = self
            .table
            .iter()
            .map(|entry| (*entry.key(), entry.value().kind()))
            .filter(|(_, kind)| *kind != DispositionKind::Default)
            .collect();
        trapped.sort_by_key(|(signal, _)| *signal);

        Ok(RegistryState {
            trapped,
            blocked: self.blocked()?,
            pending: self.backend.pending_count(),
        })
    }
}
