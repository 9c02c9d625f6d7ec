/*!
 * Pending Occurrence Log
 * Fixed-capacity ring written from OS signal handlers and drained in order
 */

use super::types::{Occurrence, SignalNumber};
use crate::core::limits::{MAX_PENDING_SIGNALS, SIGNAL_TABLE_SIZE};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// Empty slot marker; a packed entry is never zero because signal numbers start at 1
const EMPTY: u64 = 0;

/// Ordered log of signal deliveries awaiting a drain
///
/// `record` only touches atomics and is safe to call from a signal handler.
/// `drain` must not run concurrently with itself.
///
/// Each entry is stamped with the signal's epoch at delivery time. Bumping the
/// epoch through `discard` makes every earlier entry for that signal stale.
pub(crate) struct PendingLog {
    slots: [AtomicU64; MAX_PENDING_SIGNALS],
    head: AtomicUsize,
    tail: AtomicUsize,
    epochs: [AtomicU32; SIGNAL_TABLE_SIZE],
    overflowed: AtomicU64,
}

impl PendingLog {
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicU64::new(EMPTY) }; MAX_PENDING_SIGNALS],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            epochs: [const { AtomicU32::new(0) }; SIGNAL_TABLE_SIZE],
            overflowed: AtomicU64::new(0),
        }
    }

    /// Record one delivery of `signum`
    pub fn record(&self, signum: i32) {
        if signum < 1 || signum as usize >= SIGNAL_TABLE_SIZE {
            return;
        }

        let epoch = self.epochs[signum as usize].load(Ordering::Acquire);
        let packed = ((epoch as u64) << 8) | signum as u64;

        // Reserve a slot; a full log drops the delivery instead of spinning
        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            if head.wrapping_sub(tail) >= MAX_PENDING_SIGNALS {
                self.overflowed.fetch_add(1, Ordering::Relaxed);
                return;
            }
            match self.head.compare_exchange_weak(
                head,
                head.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => head = actual,
            }
        }

        self.slots[head % MAX_PENDING_SIGNALS].store(packed, Ordering::Release);
    }

    /// Take every completed entry in delivery order
    pub fn drain(&self) -> Vec<Occurrence> {
        let head = self.head.load(Ordering::Acquire);
        let mut tail = self.tail.load(Ordering::Relaxed);
        let mut taken = Vec::with_capacity(head.wrapping_sub(tail));

        while tail != head {
            let packed = self.slots[tail % MAX_PENDING_SIGNALS].swap(EMPTY, Ordering::Acquire);
            if packed == EMPTY {
                // Slot reserved by a writer that has not stored yet
                break;
            }
            tail = tail.wrapping_add(1);
            self.tail.store(tail, Ordering::Release);

            let signum = (packed & 0xff) as usize;
            let epoch = (packed >> 8) as u32;
            let Ok(signal) = SignalNumber::new(signum as i64) else {
                continue;
            };
            taken.push(Occurrence {
                signal,
                stale: epoch != self.epochs[signum].load(Ordering::Acquire),
            });
        }

        taken
    }

    /// Mark every recorded entry for `signal` as stale
    pub fn discard(&self, signal: SignalNumber) {
        self.epochs[signal.index()].fetch_add(1, Ordering::AcqRel);
    }

    /// Entries recorded but not yet drained
    pub fn len(&self) -> usize {
        self.head
            .load(Ordering::Acquire)
            .wrapping_sub(self.tail.load(Ordering::Acquire))
    }

    /// Deliveries dropped because the log was full
    pub fn overflowed(&self) -> u64 {
        self.overflowed.load(Ordering::Relaxed)
    }
}
