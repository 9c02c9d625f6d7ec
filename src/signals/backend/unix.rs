/*!
 * Unix Signal Backend
 * sigaction/kill/raise/sigprocmask through nix, with an async-signal-safe log
 */

use crate::core::types::Pid;
use crate::signals::core::pending_log::PendingLog;
use crate::signals::core::traits::{MaskOp, OsAction, SignalBackend};
use crate::signals::core::types::{Occurrence, SignalError, SignalNumber, SignalResult};
use nix::libc;
use nix::sys::signal::{
    kill, raise, sigaction, sigprocmask, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow,
    Signal as NixSignal,
};
use nix::unistd::Pid as NixPid;
use tracing::{debug, warn};

/// Process-wide log written by `record_signal`
static PENDING: PendingLog = PendingLog::new();

/// Installed for every caught signal; only touches atomics
extern "C" fn record_signal(signum: libc::c_int) {
    PENDING.record(signum);
}

/// Signals never placed in a mask
const UNMASKABLE: [NixSignal; 2] = [NixSignal::SIGKILL, NixSignal::SIGSTOP];

fn to_nix(signal: SignalNumber) -> Result<NixSignal, nix::errno::Errno> {
    NixSignal::try_from(signal.get())
}

/// Backend for the real process
///
/// Stateless: the pending log is a static because the OS handler has no
/// other way to reach it.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixBackend;

impl UnixBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SignalBackend for UnixBackend {
    fn install(&self, signal: SignalNumber, action: OsAction) -> SignalResult<()> {
        let install_error = |reason: String| SignalError::Install { signal, reason };
        let nix_signal = to_nix(signal).map_err(|e| install_error(e.to_string()))?;

        let handler = match action {
            OsAction::Catch => SigHandler::Handler(record_signal),
            OsAction::Ignore => SigHandler::SigIgn,
            OsAction::Default => SigHandler::SigDfl,
        };
        let sig_action = SigAction::new(handler, SaFlags::SA_RESTART, SigSet::empty());

        // SAFETY: record_signal is async-signal-safe; it only performs atomic
        // operations on a static with no allocation or locking.
        unsafe { sigaction(nix_signal, &sig_action) }.map_err(|e| {
            warn!(signal = %signal, error = %e, "sigaction refused");
            install_error(e.to_string())
        })?;

        debug!(signal = %signal, action = ?action, "Installed OS disposition");
        Ok(())
    }

    fn send(&self, signal: SignalNumber, target: Option<Pid>) -> SignalResult<()> {
        let delivery_error = |reason: String| SignalError::Delivery {
            signal,
            pid: target,
            reason,
        };
        let nix_signal = to_nix(signal).map_err(|e| delivery_error(e.to_string()))?;

        match target {
            // raise() targets the calling thread, so an unblocked signal has
            // been handled by the time it returns
            None => raise(nix_signal).map_err(|e| delivery_error(e.to_string())),
            Some(pid) => {
                let raw = i32::try_from(pid)
                    .ok()
                    .filter(|raw| *raw > 0)
                    .ok_or_else(|| delivery_error(format!("PID {} does not name a single process", pid)))?;
                kill(NixPid::from_raw(raw), nix_signal).map_err(|e| delivery_error(e.to_string()))
            }
        }
    }

    fn mask(&self, op: MaskOp, signals: &[SignalNumber]) -> SignalResult<()> {
        let mut set = SigSet::empty();
        for signal in signals {
            let nix_signal = to_nix(*signal).map_err(|e| SignalError::Mask {
                reason: format!("{}: {}", signal, e),
            })?;
            if !UNMASKABLE.contains(&nix_signal) {
                set.add(nix_signal);
            }
        }

        let how = match op {
            MaskOp::Block => SigmaskHow::SIG_BLOCK,
            MaskOp::Unblock => SigmaskHow::SIG_UNBLOCK,
        };
        sigprocmask(how, Some(&set), None).map_err(|e| SignalError::Mask {
            reason: e.to_string(),
        })
    }

    fn blocked(&self) -> SignalResult<Vec<SignalNumber>> {
        let mut current = SigSet::empty();
        sigprocmask(SigmaskHow::SIG_BLOCK, None, Some(&mut current)).map_err(|e| {
            SignalError::Mask {
                reason: e.to_string(),
            }
        })?;

        Ok(current
            .iter()
            .filter_map(|signal| SignalNumber::new(signal as i64).ok())
            .collect())
    }

    fn take_pending(&self) -> Vec<Occurrence> {
        PENDING.drain()
    }

    fn discard_pending(&self, signal: SignalNumber) {
        PENDING.discard(signal);
    }

    fn pending_count(&self) -> usize {
        PENDING.len()
    }

    fn overflowed(&self) -> u64 {
        PENDING.overflowed()
    }
}
