//! CLI Context - configuration and output shared by every command

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use netscope_core::Config;
use netscope_core::config::LoggingConfig;

use crate::cli::Cli;
use crate::cli::output::OutputWriter;

/// Lightweight context for CLI operations
pub struct CliContext {
    /// Application configuration
    pub config: Arc<Config>,

    /// Output writer configured based on CLI flags
    pub output: OutputWriter,
}

impl CliContext {
    /// Load configuration and install logging for this run
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = Self::load_config(cli.config.as_deref())?;
        Self::init_logging(&config.logging)?;

        Ok(Self {
            config: Arc::new(config),
            output: OutputWriter::new(cli.format, cli.quiet),
        })
    }

    fn load_config(path: Option<&Path>) -> Result<Config> {
        Config::load_from(path).with_context(|| match path {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Failed to load configuration. Check config/ and NETSCOPE__* env vars".into(),
        })
    }

    fn init_logging(logging: &LoggingConfig) -> Result<()> {
        netscope_core::init_tracing(logging).context("Failed to initialize logging")
    }
}
