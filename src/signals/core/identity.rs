/*!
 * Signal Identity
 * Resolves numeric, symbolic and constant references to one canonical number
 */

use super::types::{SignalError, SignalName, SignalNumber, SignalRef, SignalResult};
use nix::libc;

/// Historical names that share a number with a canonical signal
#[cfg(any(target_os = "linux", target_os = "android"))]
const ALIASES: &[(&str, i32)] = &[
    ("IOT", libc::SIGIOT),
    ("CLD", libc::SIGCHLD),
    ("POLL", libc::SIGPOLL),
];

#[cfg(not(any(target_os = "linux", target_os = "android")))]
const ALIASES: &[(&str, i32)] = &[("IOT", libc::SIGIOT)];

impl SignalRef<'_> {
    /// Resolve to the canonical signal number
    pub fn resolve(&self) -> SignalResult<SignalNumber> {
        match self {
            SignalRef::Number(n) => SignalNumber::new(*n),
            SignalRef::Name(name) => lookup_name(name),
            SignalRef::Constant(name) => SignalNumber::new(name.number() as i64),
        }
    }
}

/// Resolve any signal reference
pub fn resolve<'a>(signal: impl Into<SignalRef<'a>>) -> SignalResult<SignalNumber> {
    signal.into().resolve()
}

/// Resolve a batch, failing on the first invalid reference
pub fn resolve_all<'a, I, R>(signals: I) -> SignalResult<Vec<SignalNumber>>
where
    I: IntoIterator<Item = R>,
    R: Into<SignalRef<'a>>,
{
    signals
        .into_iter()
        .map(|signal| {
            let signal: SignalRef<'a> = signal.into();
            signal.resolve()
        })
        .collect()
}

/// Look up a symbolic name ("USR2" or "SIGUSR2")
pub fn lookup_name(name: &str) -> SignalResult<SignalNumber> {
    let short = name.strip_prefix("SIG").unwrap_or(name);

    let number = SignalName::all()
        .find(|signal| signal.short_name() == short)
        .map(|signal| signal.number())
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == short)
                .map(|(_, number)| *number)
        })
        .ok_or_else(|| SignalError::UnknownSignal(name.to_string()))?;

    SignalNumber::new(number as i64)
}

impl std::str::FromStr for SignalNumber {
    type Err = SignalError;

    fn from_str(name: &str) -> SignalResult<Self> {
        lookup_name(name)
    }
}
