/*!
 * Signal Limits and Constants
 *
 * Centralized location for the numeric bounds used by signal resolution
 * and the pending occurrence log.
 *
 * - Linux-compatible values are marked with [LINUX-COMPAT]
 * - Async-signal-safety constraints are marked with [SIGNAL-SAFE]
 */

// =============================================================================
// SIGNAL NUMBERS
// =============================================================================

/// Lowest valid signal number
/// 0 is the "null signal" used by kill(2) for existence probes, never a signal
pub const SIGNAL_MIN: i64 = 1;

/// Highest valid signal number (31)
/// [LINUX-COMPAT] Standard signals only; real-time signals start at 32
pub const SIGNAL_MAX: i64 = 31;

/// Size of per-signal tables indexed directly by signal number
pub const SIGNAL_TABLE_SIZE: usize = SIGNAL_MAX as usize + 1;

// =============================================================================
// PENDING LOG
// =============================================================================

/// Maximum recorded-but-undispatched occurrences (128 signals)
/// [LINUX-COMPAT] Matches typical Linux signal queue depth
/// [SIGNAL-SAFE] Fixed capacity, the OS handler never allocates
pub const MAX_PENDING_SIGNALS: usize = 128;
