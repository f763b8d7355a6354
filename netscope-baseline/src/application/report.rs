//! Plain-text rendering of comparison results

use std::fmt::Write;

use serde_json::Value;

use crate::application::diff::render_value;
use crate::domain::value_objects::{BaselineComparison, ComparisonResult};

/// Render a comparison into the fixed operator-facing layout.
///
/// ```text
/// Comparison Report
/// =================
/// Added: 1  Removed: 0  Changed: 1
///
/// Added (1):
///   + Gi0/2
///
/// Removed (0):
///   (none)
///
/// Changed (1):
///   ~ Gi0/1
///       status: up -> down
/// ```
pub fn format_comparison_report(result: &ComparisonResult) -> String {
    let mut out = String::new();
    let summary = &result.summary;

    let _ = writeln!(out, "Comparison Report");
    let _ = writeln!(out, "=================");
    let _ = writeln!(
        out,
        "Added: {}  Removed: {}  Changed: {}",
        summary.items_added, summary.items_removed, summary.items_changed
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Added ({}):", result.added.len());
    if result.added.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for entry in &result.added {
        let _ = writeln!(out, "  + {}", entry.key);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Removed ({}):", result.removed.len());
    if result.removed.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for entry in &result.removed {
        let _ = writeln!(out, "  - {}", entry.key);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Changed ({}):", result.changed.len());
    if result.changed.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for entry in &result.changed {
        let _ = writeln!(out, "  ~ {}", entry.key);
        for change in &entry.changes {
            let _ = writeln!(
                out,
                "      {}: {} -> {}",
                change.field,
                render_side(change.old.as_ref()),
                render_side(change.new.as_ref())
            );
        }
    }

    out
}

/// Render a baseline comparison, falling back to its error when nothing was compared
pub fn format_baseline_report(comparison: &BaselineComparison) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Device: {}  Command: {}",
        comparison.device_id, comparison.command
    );

    let baseline = comparison
        .baseline_version
        .map_or_else(|| "-".to_string(), |v| format!("v{}", v));
    let compared = comparison
        .compared_version
        .map_or_else(|| "live".to_string(), |v| format!("v{}", v));
    let _ = writeln!(out, "Baseline: {}  Compared: {}", baseline, compared);

    match &comparison.result {
        Some(result) => {
            let _ = writeln!(out);
            out.push_str(&format_comparison_report(result));
        }
        None => {
            let _ = writeln!(
                out,
                "Status: {} ({})",
                comparison.status,
                comparison.error.as_deref().unwrap_or("no details")
            );
        }
    }

    out
}

fn render_side(value: Option<&Value>) -> String {
    value.map_or_else(|| "<absent>".to_string(), render_value)
}
