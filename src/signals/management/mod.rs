/*!
 * Signal Management - Registry and Delivery
 */

mod delivery;
mod registry;

// Re-export public API
pub use delivery::Signal;
pub use registry::SignalRegistry;
