/*!
 * Core Types
 * Common types used across the crate
 */

/// Process ID type
///
/// Only values in `1..=i32::MAX` address a single process; anything else is
/// rejected before reaching kill(2), which would otherwise target a group.
pub type Pid = u32;
