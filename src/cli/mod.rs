//! Netscope CLI - discovery jobs and drift reports from the command line
//!
//! ## Commands
//! - `discover`: fan discovery out over a set of devices and follow its progress
//! - `compare`: diff two stored snapshots of one device command
//! - `history`: list stored snapshot versions

mod commands;
mod context;
mod output;

pub use context::CliContext;
pub use output::{OutputFormat, OutputWriter};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Netscope - parallel device discovery and configuration drift detection
#[derive(Parser, Debug)]
#[command(
    name = "netscope",
    author = "Netscope Team",
    version,
    about = "Parallel network device discovery with baseline drift detection",
    long_about = "Netscope collects routing tables, MAC/ARP tables, neighbors and interfaces \
                  from many devices in parallel, stores them as versioned snapshots and \
                  reports drift between snapshots.\n\n\
                  Exit codes: 0 success, 1 drift or failed devices, 2 input error, 99 internal error."
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover one or more devices in parallel
    #[command(visible_alias = "d")]
    Discover(commands::discover::DiscoverArgs),

    /// Compare two stored snapshots of a device command
    #[command(visible_alias = "c")]
    Compare(commands::compare::CompareArgs),

    /// List stored snapshot versions of a device command
    #[command(visible_alias = "h")]
    History(commands::history::HistoryArgs),
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
    context: CliContext,
}

impl CliApp {
    /// Create a new CLI application instance
    pub async fn new() -> anyhow::Result<Self> {
        let cli = Cli::parse();
        let context = CliContext::new(&cli)?;
        Ok(Self { cli, context })
    }

    /// Run the CLI application
    pub async fn run(self) -> anyhow::Result<i32> {
        let exit_code = match self.cli.command {
            Commands::Discover(ref args) => commands::discover::run(&self.context, args).await,
            Commands::Compare(ref args) => commands::compare::run(&self.context, args).await,
            Commands::History(ref args) => commands::history::run(&self.context, args).await,
        }?;

        Ok(exit_code)
    }
}

/// Exit codes for CI integration
pub mod exit_codes {
    /// Success - no drift, every device discovered
    pub const SUCCESS: i32 = 0;
    /// Drift detected, or a job finished with failed devices
    pub const CHANGES_OR_FAILURES: i32 = 1;
    /// Configuration or input error
    pub const CONFIG_ERROR: i32 = 2;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = 99;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_arguments() {
        let cli = Cli::try_parse_from([
            "netscope",
            "discover",
            "--device",
            "core-1",
            "--device",
            "core-2",
            "--interfaces",
            "--arp",
            "--cache",
        ])
        .unwrap();

        let Commands::Discover(args) = cli.command else {
            panic!("expected discover");
        };
        assert_eq!(args.devices, vec!["core-1", "core-2"]);
        let options = args.options();
        assert!(options.interfaces && options.arp && options.cache_results);
        assert!(!options.bgp_routes);
    }

    #[test]
    fn test_compare_requires_both_versions() {
        let partial = Cli::try_parse_from([
            "netscope", "compare", "--device", "r1", "--command", "arp", "--old", "1",
        ]);
        assert!(partial.is_err());

        let only_new = Cli::try_parse_from([
            "netscope", "compare", "--device", "r1", "--command", "arp", "--new", "3",
        ]);
        assert!(only_new.is_err());

        let full = Cli::try_parse_from([
            "netscope", "--format", "json", "compare", "--device", "r1", "--command", "arp",
            "--old", "1", "--new", "3",
        ])
        .unwrap();
        assert_eq!(full.format, OutputFormat::Json);
    }
}
