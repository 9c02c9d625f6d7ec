/*!
 * Signal Handler - Dispositions and Execution
 */

mod callbacks;
mod executor;

// Re-export public API
pub use callbacks::{Disposition, HandlerFn};
pub use executor::{execute, SignalOutcome};
