//! CLI Commands Module
//!
//! This module contains all CLI subcommand implementations.

pub mod compare;
pub mod discover;
pub mod history;

use netscope_orchestrator::DiscoveryCategory;

/// Resolve `--command`: a category name (`mac_table`) or a literal device command
pub(crate) fn resolve_command(value: &str) -> String {
    match value.parse::<DiscoveryCategory>() {
        Ok(category) => category.command().to_string(),
        Err(_) => value.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}
