//! Tourdesk sales backend
//!
//! The sale aggregate of a tour operator: totals derived from subtotal,
//! discount, tax and accessory lines; seat capacity checks against the
//! trip; a payment ledger that never exceeds the sale total.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use modules::sales;
pub use modules::trips;
