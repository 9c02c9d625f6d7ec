/*!
 * Core Module
 * Fundamental types and limits
 */

pub mod limits;
pub mod types;

// Re-export for convenience
pub use limits::*;
pub use types::*;
