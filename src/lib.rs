/*!
 * AI-OS Signals Library
 * Process-level signal trapping, masking and dispatch
 *
 * Handlers never run inside the OS signal handler. Deliveries are recorded
 * and handlers run when the host calls [`dispatch`].
 */

#[cfg(not(unix))]
compile_error!("ai-os-signals requires a Unix platform");

pub mod core;
pub mod monitoring;
pub mod signals;

// Re-exports
pub use crate::core::types::Pid;
pub use monitoring::init_tracing;
pub use signals::{
    Disposition, DispositionKind, RegistryState, Signal, SignalError, SignalName, SignalNumber,
    SignalRef, SignalRegistry, SignalResult, SignalStats,
};

/// Bind a disposition in the process-wide registry
pub fn trap<'a>(signal: impl Into<SignalRef<'a>>, disposition: Disposition) -> SignalResult<()> {
    SignalRegistry::global().trap(signal, disposition)
}

/// Block signals for this process
pub fn block<'a, I, R>(signals: I) -> SignalResult<()>
where
    I: IntoIterator<Item = R>,
    R: Into<SignalRef<'a>>,
{
    SignalRegistry::global().block(signals)
}

/// Unblock signals for this process
pub fn unblock<'a, I, R>(signals: I) -> SignalResult<()>
where
    I: IntoIterator<Item = R>,
    R: Into<SignalRef<'a>>,
{
    SignalRegistry::global().unblock(signals)
}

/// Drain recorded deliveries into their handlers
pub fn dispatch() -> usize {
    SignalRegistry::global().dispatch()
}
