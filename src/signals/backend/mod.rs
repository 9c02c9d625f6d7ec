/*!
 * Signal Backends
 * OS implementations of the SignalBackend seam
 */

mod unix;

pub use unix::UnixBackend;
