// Health module
//
// Liveness and readiness probes; both are served without credentials.

pub mod controllers;

pub use controllers::configure;
