//! Compare Command - report drift between two stored snapshots

use anyhow::Result;
use clap::Args;
use netscope_baseline::{
    BaselineComparison, ComparisonStatus, FileSnapshotStore, SnapshotStore, compare_versions,
    format_baseline_report,
};

use crate::cli::commands::resolve_command;
use crate::cli::context::CliContext;
use crate::cli::exit_codes;
use crate::cli::output::OutputFormat;

/// Arguments for the compare command
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Device identifier
    #[arg(short, long)]
    pub device: String,

    /// Category name (e.g. `interfaces`, `mac_table`) or the device command itself
    #[arg(short, long)]
    pub command: String,

    /// Baseline version; defaults to the second most recent
    #[arg(long, requires = "new")]
    pub old: Option<u64>,

    /// Version checked for drift; defaults to the most recent
    #[arg(long, requires = "old")]
    pub new: Option<u64>,
}

/// Run the compare command
pub async fn run(ctx: &CliContext, args: &CompareArgs) -> Result<i32> {
    let store = FileSnapshotStore::new(&ctx.config.snapshots.storage_dir);
    let command = resolve_command(&args.command);

    let comparison = match (args.old, args.new) {
        (Some(old), Some(new)) => {
            compare_versions(&store, &args.device, &command, old, new).await?
        }
        _ => compare_latest_two(&store, &args.device, &command).await?,
    };

    match ctx.output.format() {
        OutputFormat::Json => ctx.output.json(&comparison)?,
        OutputFormat::Table => ctx.output.print(format_baseline_report(&comparison).trim_end()),
    }

    Ok(exit_code(&comparison))
}

async fn compare_latest_two(
    store: &dyn SnapshotStore,
    device_id: &str,
    command: &str,
) -> Result<BaselineComparison> {
    let recent = store.list_versions(device_id, command, 2).await?;
    let comparison = match recent.as_slice() {
        [newest, previous] => {
            compare_versions(store, device_id, command, previous.version, newest.version).await?
        }
        [only] => BaselineComparison::unavailable(
            device_id,
            command,
            ComparisonStatus::NoBaseline,
            format!("only v{} is stored; nothing to compare against", only.version),
        )
        .with_versions(None, Some(only.version)),
        _ => BaselineComparison::unavailable(
            device_id,
            command,
            ComparisonStatus::NoBaseline,
            format!("no snapshots stored for {} on {}", command, device_id),
        ),
    };
    Ok(comparison)
}

fn exit_code(comparison: &BaselineComparison) -> i32 {
    match comparison.status {
        ComparisonStatus::Compared if comparison.has_changes() => exit_codes::CHANGES_OR_FAILURES,
        ComparisonStatus::Compared => exit_codes::SUCCESS,
        ComparisonStatus::NoBaseline | ComparisonStatus::VersionNotFound => {
            exit_codes::CONFIG_ERROR
        }
        ComparisonStatus::MalformedSnapshot | ComparisonStatus::MismatchedSnapshots => {
            exit_codes::INTERNAL_ERROR
        }
    }
}
