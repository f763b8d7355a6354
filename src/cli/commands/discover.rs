//! Discover Command - dispatch a discovery job and follow it to completion

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use netscope_orchestrator::{
    AuthToken, DeviceJobRecord, DiscoveryCategory, DiscoveryOptions, DispatchError,
    DispatchRequest, JobRecord,
};

use crate::cli::context::CliContext;
use crate::cli::exit_codes;
use crate::cli::output::OutputFormat;
use crate::create_app;

/// Arguments for the discover command
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Device to discover (repeatable)
    #[arg(short, long = "device", required = true)]
    pub devices: Vec<String>,

    /// Collect static routes
    #[arg(long)]
    pub static_routes: bool,

    /// Collect OSPF routes
    #[arg(long)]
    pub ospf_routes: bool,

    /// Collect BGP routes
    #[arg(long)]
    pub bgp_routes: bool,

    /// Collect the MAC address table
    #[arg(long)]
    pub mac_table: bool,

    /// Collect CDP/LLDP neighbors
    #[arg(long)]
    pub neighbors: bool,

    /// Collect the ARP table
    #[arg(long)]
    pub arp: bool,

    /// Collect interfaces
    #[arg(long)]
    pub interfaces: bool,

    /// Collect every category
    #[arg(long)]
    pub all: bool,

    /// Store collected records as snapshots
    #[arg(long)]
    pub cache: bool,

    /// Credential forwarded to the device collection service
    #[arg(long, env = "NETSCOPE_AUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Milliseconds between progress polls
    #[arg(long, default_value_t = 500)]
    pub poll_interval_ms: u64,
}

impl DiscoverArgs {
    pub fn options(&self) -> DiscoveryOptions {
        let selected = [
            (self.static_routes, DiscoveryCategory::StaticRoutes),
            (self.ospf_routes, DiscoveryCategory::OspfRoutes),
            (self.bgp_routes, DiscoveryCategory::BgpRoutes),
            (self.mac_table, DiscoveryCategory::MacTable),
            (self.neighbors, DiscoveryCategory::Neighbors),
            (self.arp, DiscoveryCategory::Arp),
            (self.interfaces, DiscoveryCategory::Interfaces),
        ]
        .into_iter()
        .filter(|(enabled, _)| self.all || *enabled)
        .map(|(_, category)| category);

        let mut options = DiscoveryOptions::default()
            .with_categories(selected)
            .with_cache_results(self.cache);
        if let Some(token) = &self.token {
            options = options.with_auth_token(AuthToken::new(token.clone()));
        }
        options
    }
}

/// Run the discover command
pub async fn run(ctx: &CliContext, args: &DiscoverArgs) -> Result<i32> {
    let request = DispatchRequest::new(args.devices.clone(), args.options());
    if let Err(e) = request.validate() {
        ctx.output.error(&e.to_string());
        if matches!(e, DispatchError::NoCategories) {
            ctx.output
                .info("Select categories such as --interfaces --arp, or use --all");
        }
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let app = create_app(ctx.config.as_ref().clone());

    let handle = match app.orchestrator.submit(request).await {
        Ok(handle) => handle,
        Err(e) => {
            ctx.output.error(&e.to_string());
            app.shutdown().await;
            return Ok(exit_codes::INTERNAL_ERROR);
        }
    };

    ctx.output.info(&format!(
        "Job {} dispatched to {} device(s)",
        handle.job_id, handle.total_devices
    ));

    let poll_interval = Duration::from_millis(args.poll_interval_ms.max(10));
    let mut last_seen: Vec<(u8, String)> = Vec::new();
    let record = loop {
        let record = app.orchestrator.get_job_status(handle.job_id).await?;

        let progress: Vec<(u8, String)> = record
            .devices
            .iter()
            .map(|d| (d.progress, d.status.to_string()))
            .collect();
        if progress != last_seen {
            for device in &record.devices {
                ctx.output.info(&progress_line(device));
            }
            last_seen = progress;
        }

        if record.is_finished() {
            break record;
        }
        tokio::time::sleep(poll_interval).await;
    };

    app.shutdown().await;

    match ctx.output.format() {
        OutputFormat::Json => ctx.output.json(&record)?,
        OutputFormat::Table => print_job(ctx, &record),
    }

    if record.failed_count > 0 || record.error.is_some() {
        Ok(exit_codes::CHANGES_OR_FAILURES)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

fn progress_line(device: &DeviceJobRecord) -> String {
    format!(
        "  {:<24} {:<12} {:>3}%  {}",
        device.device_id,
        device.status,
        device.progress,
        device.current_step.as_deref().unwrap_or("")
    )
}

fn print_job(ctx: &CliContext, record: &JobRecord) {
    ctx.output.header(&format!("Discovery job {}", record.job_id));
    ctx.output.print(&format!(
        "Status: {}  Completed: {}  Failed: {}  Total: {}  Duration: {}",
        record.status,
        record.completed_count,
        record.failed_count,
        record.total,
        record
            .duration_ms
            .map_or_else(|| "-".to_string(), |ms| format!("{}ms", ms))
    ));
    if let Some(error) = &record.error {
        ctx.output.print(&format!("Error: {}", error));
    }

    ctx.output.print("");
    for device in &record.devices {
        let detail = device
            .error
            .as_deref()
            .or(device.current_step.as_deref())
            .unwrap_or("");
        ctx.output.print(&format!(
            "  {:<24} {:<12} {}",
            device.device_id, device.status, detail
        ));
    }
}
