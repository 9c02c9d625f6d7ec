/*!
 * Signal Delivery
 * A resolved signal addressed at this process or another one
 */

use super::registry::SignalRegistry;
use crate::core::types::Pid;
use crate::signals::core::traits::SignalBackend;
use crate::signals::core::types::{SignalNumber, SignalRef, SignalResult};
use std::fmt;

/// One resolved signal, ready to be sent
///
/// Owns no registry state; the methods without a registry argument use
/// [`SignalRegistry::global`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal {
    number: SignalNumber,
}

impl Signal {
    pub fn new<'a>(signal: impl Into<SignalRef<'a>>) -> SignalResult<Self> {
        Ok(Self {
            number: signal.into().resolve()?,
        })
    }

    pub fn number(&self) -> SignalNumber {
        self.number
    }

    /// Send and, when targeting this process, drain
    ///
    /// Returns the number of handlers run locally, always 0 for another
    /// process since it handles the signal in its own context.
    pub fn dispatch(&self, target: Option<Pid>) -> SignalResult<usize> {
        self.dispatch_with(SignalRegistry::global(), target)
    }

    /// Send without draining
    pub fn send(&self, target: Option<Pid>) -> SignalResult<()> {
        self.send_with(SignalRegistry::global(), target)
    }

    pub fn dispatch_with<B: SignalBackend>(
        &self,
        registry: &SignalRegistry<B>,
        target: Option<Pid>,
    ) -> SignalResult<usize> {
        registry.send(self.number, target)?;
        match target {
            None => Ok(registry.dispatch()),
            Some(_) => Ok(0),
        }
    }

    pub fn send_with<B: SignalBackend>(
        &self,
        registry: &SignalRegistry<B>,
        target: Option<Pid>,
    ) -> SignalResult<()> {
        registry.send(self.number, target)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.number, f)
    }
}

impl From<SignalNumber> for Signal {
    fn from(number: SignalNumber) -> Self {
        Self { number }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::core::traits::MockSignalBackend;
    use crate::signals::core::types::{Occurrence, SignalError, SignalName};
    use crate::signals::handler::Disposition;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_new_rejects_invalid_references() {
        assert_eq!(Signal::new(32), Err(SignalError::OutOfRange(32)));
        assert!(matches!(Signal::new("SOMETHING"), Err(SignalError::UnknownSignal(_))));
        assert_eq!(
            Signal::new("USR2").unwrap(),
            Signal::new(SignalName::SIGUSR2).unwrap()
        );
    }

    #[test]
    fn test_dispatch_to_self_sends_then_drains() {
        let usr2 = SignalNumber::of(SignalName::SIGUSR2);
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let mut backend = MockSignalBackend::new();
        backend.expect_install().returning(|_, _| Ok(()));
        let sink = delivered.clone();
        backend
            .expect_send()
            .withf(|_, pid| pid.is_none())
            .times(1)
            .returning(move |signal, _| {
                sink.lock().push(Occurrence {
                    signal,
                    stale: false,
                });
                Ok(())
            });
        let source = delivered.clone();
        backend
            .expect_take_pending()
            .returning(move || std::mem::take(&mut *source.lock()));
        backend.expect_overflowed().returning(|| 0);
        let registry = SignalRegistry::with_backend(backend);

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        registry
            .trap(
                usr2,
                Disposition::handler(move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        let signal = Signal::from(usr2);
        assert_eq!(signal.dispatch_with(&registry, None).unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_to_other_process_does_not_drain() {
        let mut backend = MockSignalBackend::new();
        backend
            .expect_send()
            .withf(|_, pid| *pid == Some(4242))
            .times(1)
            .returning(|_, _| Ok(()));
        backend.expect_take_pending().never();
        let registry = SignalRegistry::with_backend(backend);

        let signal = Signal::new("TERM").unwrap();
        assert_eq!(signal.dispatch_with(&registry, Some(4242)).unwrap(), 0);
    }

    #[test]
    fn test_delivery_error_propagates() {
        let mut backend = MockSignalBackend::new();
        backend.expect_send().returning(|signal, pid| {
            Err(SignalError::Delivery {
                signal,
                pid,
                reason: "EPERM: Operation not permitted".to_string(),
            })
        });
        backend.expect_take_pending().never();
        let registry = SignalRegistry::with_backend(backend);

        let result = Signal::new("TERM").unwrap().dispatch_with(&registry, Some(1));
        assert!(matches!(result, Err(SignalError::Delivery { pid: Some(1), .. })));
    }
}
