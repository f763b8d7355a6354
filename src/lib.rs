//! Netscope - parallel network device discovery with baseline drift detection
//!
//! This is the main binary crate that wires the workspace members together
//! and exposes the `netscope` command-line interface.

mod app;
pub mod cli;

pub use app::{AppHandle, create_app, create_app_with_collector};
pub use netscope_core::{Config, init_tracing};

// Re-export for convenience
pub use netscope_baseline;
pub use netscope_core;
pub use netscope_orchestrator;
