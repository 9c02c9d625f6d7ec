/*!
 * Monitoring
 * Structured tracing for signal handling
 */

mod tracer;

pub use tracer::{init_tracing, DrainSpan};
