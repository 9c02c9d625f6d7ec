/*!
 * Signal Dispositions
 * Handler callbacks and the action bound to each signal
 */

use crate::signals::core::traits::OsAction;
use crate::signals::core::types::{DispositionKind, SignalNumber};
use std::fmt;
use std::sync::Arc;

/// Signal handler callback function type
pub type HandlerFn = Arc<dyn Fn(SignalNumber) + Send + Sync>;

/// Action bound to a signal in the registry
#[derive(Clone, Default)]
pub enum Disposition {
    /// Run the callback once per delivery, at the next drain
    Handler(HandlerFn),
    /// Discard deliveries
    Ignore,
    /// OS default action
    #[default]
    Default,
}

impl Disposition {
    /// Wrap a closure as a handler disposition
    pub fn handler<F>(callback: F) -> Self
    where
        F: Fn(SignalNumber) + Send + Sync + 'static,
    {
        Disposition::Handler(Arc::new(callback))
    }

    pub fn kind(&self) -> DispositionKind {
        match self {
            Disposition::Handler(_) => DispositionKind::Handler,
            Disposition::Ignore => DispositionKind::Ignore,
            Disposition::Default => DispositionKind::Default,
        }
    }

    /// OS disposition backing this one
    pub(crate) fn os_action(&self) -> OsAction {
        match self {
            Disposition::Handler(_) => OsAction::Catch,
            Disposition::Ignore => OsAction::Ignore,
            Disposition::Default => OsAction::Default,
        }
    }
}

impl fmt::Debug for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Handler(callback) => {
                write!(f, "Handler({:p})", Arc::as_ptr(callback) as *const ())
            }
            Disposition::Ignore => f.write_str("Ignore"),
            Disposition::Default => f.write_str("Default"),
        }
    }
}
