//! Terminal output helpers

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

/// Output format for CLI results
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Table,
    /// JSON output for machine processing
    Json,
}

/// Writes command results to stdout and diagnostics to stderr
#[derive(Debug, Clone)]
pub struct OutputWriter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn header(&self, title: &str) {
        println!("{}", title);
        println!("{}", "=".repeat(title.chars().count()));
    }

    pub fn print(&self, line: &str) {
        println!("{}", line);
    }

    /// Progress and hints; silenced by `--quiet` and in JSON mode
    pub fn info(&self, message: &str) {
        if !self.quiet && self.format != OutputFormat::Json {
            eprintln!("{}", message);
        }
    }

    pub fn warn(&self, message: &str) {
        eprintln!("warning: {}", message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("error: {}", message);
    }

    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
