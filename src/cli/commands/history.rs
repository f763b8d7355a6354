//! History Command - list stored snapshot versions

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use netscope_baseline::{FileSnapshotStore, SnapshotStore};
use serde::Serialize;

use crate::cli::commands::resolve_command;
use crate::cli::context::CliContext;
use crate::cli::exit_codes;
use crate::cli::output::OutputFormat;

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Device identifier
    #[arg(short, long)]
    pub device: String,

    /// Category name or device command; omit to list tracked commands
    #[arg(short, long)]
    pub command: Option<String>,

    /// Maximum number of versions to show
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Version information for JSON output
#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub version: u64,
    pub created_at: DateTime<Utc>,
    /// Record count, when the payload is readable
    pub records: Option<usize>,
    pub notes: Option<String>,
}

/// Run the history command
pub async fn run(ctx: &CliContext, args: &HistoryArgs) -> Result<i32> {
    let store = FileSnapshotStore::new(&ctx.config.snapshots.storage_dir);

    let Some(command) = args.command.as_deref().map(resolve_command) else {
        let commands = store.list_commands(&args.device).await?;
        match ctx.output.format() {
            OutputFormat::Json => ctx.output.json(&commands)?,
            OutputFormat::Table => {
                ctx.output.header(&format!("Tracked commands for {}", args.device));
                if commands.is_empty() {
                    ctx.output.print("  (none)");
                }
                for command in &commands {
                    ctx.output.print(&format!("  {}", command));
                }
            }
        }
        return Ok(exit_codes::SUCCESS);
    };

    let limit = args
        .limit
        .unwrap_or(ctx.config.snapshots.default_history_limit);
    let versions: Vec<VersionInfo> = store
        .list_versions(&args.device, &command, limit)
        .await?
        .into_iter()
        .map(|snapshot| VersionInfo {
            version: snapshot.version,
            created_at: snapshot.created_at,
            records: snapshot.records().ok().map(|r| r.len()),
            notes: snapshot.notes,
        })
        .collect();

    match ctx.output.format() {
        OutputFormat::Json => ctx.output.json(&versions)?,
        OutputFormat::Table => {
            ctx.output
                .header(&format!("{} on {}", command, args.device));
            if versions.is_empty() {
                ctx.output.print("  (no snapshots stored)");
            }
            for v in &versions {
                ctx.output.print(&format!(
                    "  v{:<5} {}  {:>6}  {}",
                    v.version,
                    v.created_at.format("%Y-%m-%d %H:%M:%S"),
                    v.records
                        .map_or_else(|| "-".to_string(), |n| format!("{} rec", n)),
                    v.notes.as_deref().unwrap_or("")
                ));
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}
