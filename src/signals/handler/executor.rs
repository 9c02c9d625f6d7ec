/*!
 * Signal Executor
 * Runs one drained occurrence against the disposition bound at drain time
 */

use super::callbacks::Disposition;
use crate::signals::core::types::Occurrence;
use tracing::debug;

/// Result of executing one occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// Handler ran once
    HandlerInvoked,
    /// Dropped: stale, ignored, or no handler bound any more
    Discarded,
}

impl SignalOutcome {
    pub fn is_invoked(&self) -> bool {
        matches!(self, SignalOutcome::HandlerInvoked)
    }
}

/// Execute an occurrence
///
/// Callers must not hold registry locks: handlers may trap, block or send.
pub fn execute(occurrence: Occurrence, disposition: &Disposition) -> SignalOutcome {
    if occurrence.stale {
        debug!(signal = %occurrence.signal, "Discarding stale occurrence");
        return SignalOutcome::Discarded;
    }

    match disposition {
        Disposition::Handler(callback) => {
            debug!(signal = %occurrence.signal, "Invoking handler");
            callback(occurrence.signal);
            SignalOutcome::HandlerInvoked
        }
        Disposition::Ignore | Disposition::Default => {
            debug!(
                signal = %occurrence.signal,
                disposition = ?disposition.kind(),
                "Discarding occurrence without handler"
            );
            SignalOutcome::Discarded
        }
    }
}
