/*!
 * Signals Module
 * POSIX signal dispositions, masking and synchronous dispatch for this process
 */

pub mod backend;
pub mod core;
pub mod handler;
pub mod management;

// Re-export public API
pub use self::backend::UnixBackend;
pub use self::core::*;
pub use self::handler::{Disposition, HandlerFn, SignalOutcome};
pub use self::management::{Signal, SignalRegistry};
