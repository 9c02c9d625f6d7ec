/*!
 * Signal Core - Types and Traits
 * Fundamental types, identity resolution and the OS seam
 */

pub mod atomic_stats;
pub mod identity;
pub(crate) mod pending_log;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use atomic_stats::AtomicSignalStats;
pub use identity::{lookup_name, resolve, resolve_all};
pub use traits::*;
pub use types::*;
