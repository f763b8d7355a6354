//! Netscope Core - Foundation crate shared by every netscope component
//!
//! # Modules
//!
//! - [`config`]: Strongly-typed configuration with file and environment variable support
//! - [`logging`]: Structured logging with tracing
//! - [`resilience`]: Retry with exponential backoff for transient failures
//!
//! # Configuration
//!
//! ```rust,ignore
//! use netscope_core::Config;
//!
//! let config = Config::load()?;
//! ```
//!
//! Environment variables use the `NETSCOPE__` prefix with double underscore separators:
//!
//! ```bash
//! NETSCOPE__DISCOVERY__MAX_CONCURRENT_DEVICES=8
//! NETSCOPE__LOGGING__FORMAT=pretty
//! ```
//!
//! # Logging
//!
//! ```rust,ignore
//! use netscope_core::init_tracing;
//!
//! init_tracing(&config.logging)?;
//! ```

pub mod config;
pub mod logging;
pub mod resilience;

pub use config::Config;
pub use logging::init_tracing;
