/*!
 * Signal Types
 * Canonical signal numbers, named constants, references and result types
 */

use crate::core::limits::{SIGNAL_MAX, SIGNAL_MIN};
use crate::core::types::Pid;
use miette::Diagnostic;
use nix::libc;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Signal operation result
pub type SignalResult<T> = Result<T, SignalError>;

/// Signal errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SignalError {
    #[error("Signal number {0} is out of range ({min}..={max})", min = SIGNAL_MIN, max = SIGNAL_MAX)]
    #[diagnostic(
        code(signals::out_of_range),
        help("Standard signals are numbered 1 through 31. This is a programming error, do not retry.")
    )]
    OutOfRange(i64),

    #[error("Unknown signal name: {0}")]
    #[diagnostic(
        code(signals::unknown_signal),
        help("Use a short POSIX name such as \"USR2\" or its SIG-prefixed form \"SIGUSR2\".")
    )]
    UnknownSignal(String),

    #[error("Failed to deliver {signal} to {}: {reason}", target_label(.pid))]
    #[diagnostic(
        code(signals::delivery_failed),
        help("Check that the target process exists and that the caller may signal it.")
    )]
    Delivery {
        signal: SignalNumber,
        pid: Option<Pid>,
        reason: String,
    },

    #[error("Failed to install disposition for {signal}: {reason}")]
    #[diagnostic(
        code(signals::install_failed),
        help("KILL and STOP cannot be caught or ignored.")
    )]
    Install { signal: SignalNumber, reason: String },

    #[error("Failed to update signal mask: {reason}")]
    #[diagnostic(code(signals::mask_failed))]
    Mask { reason: String },
}

fn target_label(pid: &Option<Pid>) -> String {
    match pid {
        Some(pid) => format!("PID {}", pid),
        None => "self".to_string(),
    }
}

/// Canonical signal number, always within `SIGNAL_MIN..=SIGNAL_MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct SignalNumber(u8);

impl SignalNumber {
    /// Validate a raw number
    pub fn new(n: i64) -> SignalResult<Self> {
        if (SIGNAL_MIN..=SIGNAL_MAX).contains(&n) {
            Ok(Self(n as u8))
        } else {
            Err(SignalError::OutOfRange(n))
        }
    }

    /// Number of a named constant
    pub const fn of(name: SignalName) -> Self {
        Self(name as i32 as u8)
    }

    /// Raw platform value
    pub fn get(self) -> i32 {
        self.0 as i32
    }

    /// Table index
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Named constant for this number, if the platform names it
    pub fn name(self) -> Option<SignalName> {
        SignalName::from_number(self.get())
    }
}

impl fmt::Display for SignalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}({})", name, self.0),
            None => write!(f, "signal {}", self.0),
        }
    }
}

impl TryFrom<i64> for SignalNumber {
    type Error = SignalError;

    fn try_from(n: i64) -> SignalResult<Self> {
        Self::new(n)
    }
}

impl TryFrom<i32> for SignalNumber {
    type Error = SignalError;

    fn try_from(n: i32) -> SignalResult<Self> {
        Self::new(n as i64)
    }
}

impl From<SignalNumber> for i64 {
    fn from(n: SignalNumber) -> i64 {
        n.0 as i64
    }
}

impl From<SignalName> for SignalNumber {
    fn from(name: SignalName) -> Self {
        Self::of(name)
    }
}

/// Named constants for the standard signals, valued as the platform numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum SignalName {
    /// Hangup detected on controlling terminal or death of controlling process
    SIGHUP = libc::SIGHUP,
    /// Interrupt from keyboard (Ctrl+C)
    SIGINT = libc::SIGINT,
    /// Quit from keyboard (Ctrl+\)
    SIGQUIT = libc::SIGQUIT,
    /// Illegal instruction
    SIGILL = libc::SIGILL,
    /// Trace/breakpoint trap
    SIGTRAP = libc::SIGTRAP,
    /// Abort signal
    SIGABRT = libc::SIGABRT,
    /// Bus error (bad memory access)
    SIGBUS = libc::SIGBUS,
    /// Floating-point exception
    SIGFPE = libc::SIGFPE,
    /// Kill signal (cannot be caught, blocked or ignored)
    SIGKILL = libc::SIGKILL,
    /// User-defined signal 1
    SIGUSR1 = libc::SIGUSR1,
    /// Invalid memory reference
    SIGSEGV = libc::SIGSEGV,
    /// User-defined signal 2
    SIGUSR2 = libc::SIGUSR2,
    /// Broken pipe
    SIGPIPE = libc::SIGPIPE,
    /// Timer signal
    SIGALRM = libc::SIGALRM,
    /// Termination signal
    SIGTERM = libc::SIGTERM,
    /// Stack fault on coprocessor
    #[cfg(any(target_os = "linux", target_os = "android"))]
    SIGSTKFLT = libc::SIGSTKFLT,
    /// Child process stopped or terminated
    SIGCHLD = libc::SIGCHLD,
    /// Continue if stopped
    SIGCONT = libc::SIGCONT,
    /// Stop process (cannot be caught, blocked or ignored)
    SIGSTOP = libc::SIGSTOP,
    /// Stop typed at terminal (Ctrl+Z)
    SIGTSTP = libc::SIGTSTP,
    /// Terminal input for background process
    SIGTTIN = libc::SIGTTIN,
    /// Terminal output for background process
    SIGTTOU = libc::SIGTTOU,
    /// Urgent condition on socket
    SIGURG = libc::SIGURG,
    /// CPU time limit exceeded
    SIGXCPU = libc::SIGXCPU,
    /// File size limit exceeded
    SIGXFSZ = libc::SIGXFSZ,
    /// Virtual alarm clock
    SIGVTALRM = libc::SIGVTALRM,
    /// Profiling timer expired
    SIGPROF = libc::SIGPROF,
    /// Window resize signal
    SIGWINCH = libc::SIGWINCH,
    /// I/O now possible
    SIGIO = libc::SIGIO,
    /// Power failure
    #[cfg(any(target_os = "linux", target_os = "android"))]
    SIGPWR = libc::SIGPWR,
    /// Bad system call
    SIGSYS = libc::SIGSYS,
}

impl SignalName {
    /// Convert from platform signal number
    pub fn from_number(n: i32) -> Option<Self> {
        Self::all().find(|name| name.number() == n)
    }

    /// Every named signal on this platform, in declaration order
    pub fn all() -> impl Iterator<Item = SignalName> {
        use SignalName::*;
        const COMMON: [SignalName; 29] = [
            SIGHUP, SIGINT, SIGQUIT, SIGILL, SIGTRAP, SIGABRT, SIGBUS, SIGFPE, SIGKILL, SIGUSR1,
            SIGSEGV, SIGUSR2, SIGPIPE, SIGALRM, SIGTERM, SIGCHLD, SIGCONT, SIGSTOP, SIGTSTP,
            SIGTTIN, SIGTTOU, SIGURG, SIGXCPU, SIGXFSZ, SIGVTALRM, SIGPROF, SIGWINCH, SIGIO,
            SIGSYS,
        ];
        #[cfg(any(target_os = "linux", target_os = "android"))]
        const PLATFORM: [SignalName; 2] = [SIGSTKFLT, SIGPWR];
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        const PLATFORM: [SignalName; 0] = [];

        COMMON.into_iter().chain(PLATFORM)
    }

    /// Get signal number
    pub fn number(&self) -> i32 {
        *self as i32
    }

    /// Name without the SIG prefix, as used in symbolic references
    pub fn short_name(&self) -> &'static str {
        match self {
            SignalName::SIGHUP => "HUP",
            SignalName::SIGINT => "INT",
            SignalName::SIGQUIT => "QUIT",
            SignalName::SIGILL => "ILL",
            SignalName::SIGTRAP => "TRAP",
            SignalName::SIGABRT => "ABRT",
            SignalName::SIGBUS => "BUS",
            SignalName::SIGFPE => "FPE",
            SignalName::SIGKILL => "KILL",
            SignalName::SIGUSR1 => "USR1",
            SignalName::SIGSEGV => "SEGV",
            SignalName::SIGUSR2 => "USR2",
            SignalName::SIGPIPE => "PIPE",
            SignalName::SIGALRM => "ALRM",
            SignalName::SIGTERM => "TERM",
            #[cfg(any(target_os = "linux", target_os = "android"))]
            SignalName::SIGSTKFLT => "STKFLT",
            SignalName::SIGCHLD => "CHLD",
            SignalName::SIGCONT => "CONT",
            SignalName::SIGSTOP => "STOP",
            SignalName::SIGTSTP => "TSTP",
            SignalName::SIGTTIN => "TTIN",
            SignalName::SIGTTOU => "TTOU",
            SignalName::SIGURG => "URG",
            SignalName::SIGXCPU => "XCPU",
            SignalName::SIGXFSZ => "XFSZ",
            SignalName::SIGVTALRM => "VTALRM",
            SignalName::SIGPROF => "PROF",
            SignalName::SIGWINCH => "WINCH",
            SignalName::SIGIO => "IO",
            #[cfg(any(target_os = "linux", target_os = "android"))]
            SignalName::SIGPWR => "PWR",
            SignalName::SIGSYS => "SYS",
        }
    }

    /// Check if signal can be caught/blocked
    pub fn can_catch(&self) -> bool {
        !matches!(self, SignalName::SIGKILL | SignalName::SIGSTOP)
    }

    /// Check if signal terminates the process by default on every supported platform
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SignalName::SIGCHLD
                | SignalName::SIGCONT
                | SignalName::SIGSTOP
                | SignalName::SIGTSTP
                | SignalName::SIGTTIN
                | SignalName::SIGTTOU
                | SignalName::SIGURG
                | SignalName::SIGWINCH
                | SignalName::SIGIO
        )
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            SignalName::SIGHUP => "Hangup",
            SignalName::SIGINT => "Interrupt",
            SignalName::SIGQUIT => "Quit",
            SignalName::SIGILL => "Illegal instruction",
            SignalName::SIGTRAP => "Trace/breakpoint trap",
            SignalName::SIGABRT => "Aborted",
            SignalName::SIGBUS => "Bus error",
            SignalName::SIGFPE => "Floating point exception",
            SignalName::SIGKILL => "Killed",
            SignalName::SIGUSR1 => "User defined signal 1",
            SignalName::SIGSEGV => "Segmentation fault",
            SignalName::SIGUSR2 => "User defined signal 2",
            SignalName::SIGPIPE => "Broken pipe",
            SignalName::SIGALRM => "Alarm clock",
            SignalName::SIGTERM => "Terminated",
            #[cfg(any(target_os = "linux", target_os = "android"))]
            SignalName::SIGSTKFLT => "Stack fault",
            SignalName::SIGCHLD => "Child status changed",
            SignalName::SIGCONT => "Continued",
            SignalName::SIGSTOP => "Stopped (signal)",
            SignalName::SIGTSTP => "Stopped",
            SignalName::SIGTTIN => "Stopped (tty input)",
            SignalName::SIGTTOU => "Stopped (tty output)",
            SignalName::SIGURG => "Urgent I/O condition",
            SignalName::SIGXCPU => "CPU time limit exceeded",
            SignalName::SIGXFSZ => "File size limit exceeded",
            SignalName::SIGVTALRM => "Virtual timer expired",
            SignalName::SIGPROF => "Profiling timer expired",
            SignalName::SIGWINCH => "Window size changed",
            SignalName::SIGIO => "I/O possible",
            #[cfg(any(target_os = "linux", target_os = "android"))]
            SignalName::SIGPWR => "Power failure",
            SignalName::SIGSYS => "Bad system call",
        }
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIG{}", self.short_name())
    }
}

/// Any way a caller may name a signal
///
/// Never stored; resolved to a [`SignalNumber`] before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalRef<'a> {
    Number(i64),
    Name(Cow<'a, str>),
    Constant(SignalName),
}

impl From<i64> for SignalRef<'_> {
    fn from(n: i64) -> Self {
        SignalRef::Number(n)
    }
}

impl From<i32> for SignalRef<'_> {
    fn from(n: i32) -> Self {
        SignalRef::Number(n as i64)
    }
}

impl From<u32> for SignalRef<'_> {
    fn from(n: u32) -> Self {
        SignalRef::Number(n as i64)
    }
}

impl<'a> From<&'a str> for SignalRef<'a> {
    fn from(name: &'a str) -> Self {
        SignalRef::Name(Cow::Borrowed(name))
    }
}

impl From<String> for SignalRef<'_> {
    fn from(name: String) -> Self {
        SignalRef::Name(Cow::Owned(name))
    }
}

impl From<SignalName> for SignalRef<'_> {
    fn from(name: SignalName) -> Self {
        SignalRef::Constant(name)
    }
}

impl From<SignalNumber> for SignalRef<'_> {
    fn from(n: SignalNumber) -> Self {
        SignalRef::Number(n.into())
    }
}

/// What happens when a signal is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispositionKind {
    /// OS default action
    Default,
    /// Discarded by the OS
    Ignore,
    /// Recorded and run at the next drain
    Handler,
}

/// One recorded delivery taken from the pending log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub signal: SignalNumber,
    /// Recorded before the signal was last switched to Ignore or Default
    pub stale: bool,
}

/// Signal statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalStats {
    pub traps_installed: u64,
    pub signals_sent: u64,
    pub handlers_invoked: u64,
    pub occurrences_discarded: u64,
    pub pending_overflows: u64,
}

/// Snapshot of the registry and the OS-visible signal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    /// Every signal whose disposition differs from Default
    pub trapped: Vec<(SignalNumber, DispositionKind)>,
    pub blocked: Vec<SignalNumber>,
    pub pending: usize,
}
