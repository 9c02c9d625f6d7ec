/*!
 * Signal Traits
 * The OS seam used by the registry
 */

use super::types::{Occurrence, SignalNumber, SignalResult};
use crate::core::types::Pid;

/// OS-level disposition installed for a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsAction {
    /// Record deliveries in the pending log
    Catch,
    /// OS ignore primitive
    Ignore,
    /// OS default action
    Default,
}

/// Mask operation, as in sigprocmask(2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskOp {
    Block,
    Unblock,
}

/// OS signal subsystem
///
/// Everything the registry does that the OS can observe goes through here.
#[cfg_attr(test, mockall::automock)]
pub trait SignalBackend: Send + Sync {
    /// Install the OS disposition for a signal
    fn install(&self, signal: SignalNumber, action: OsAction) -> SignalResult<()>;

    /// Send a signal to `target`, or to the calling thread when `None`
    fn send(&self, signal: SignalNumber, target: Option<Pid>) -> SignalResult<()>;

    /// Apply one mask operation to every listed signal at once
    fn mask(&self, op: MaskOp, signals: &[SignalNumber]) -> SignalResult<()>;

    /// Signals currently blocked
    fn blocked(&self) -> SignalResult<Vec<SignalNumber>>;

    /// Take recorded deliveries in delivery order
    fn take_pending(&self) -> Vec<Occurrence>;

    /// Make recorded deliveries of `signal` stale
    fn discard_pending(&self, signal: SignalNumber);

    /// Deliveries recorded but not yet taken
    fn pending_count(&self) -> usize;

    /// Deliveries lost to a full pending log
    fn overflowed(&self) -> u64;
}
