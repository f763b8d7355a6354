//! Baseline value objects

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entities::Record;

/// Commands whose structured output is tracked for drift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    StaticRoutes,
    OspfRoutes,
    BgpRoutes,
    MacTable,
    Neighbors,
    Arp,
    Interfaces,
}

impl CommandKind {
    pub const ALL: [CommandKind; 7] = [
        Self::StaticRoutes,
        Self::OspfRoutes,
        Self::BgpRoutes,
        Self::MacTable,
        Self::Neighbors,
        Self::Arp,
        Self::Interfaces,
    ];

    /// Device command whose output is stored under this kind
    pub fn command(&self) -> &'static str {
        match self {
            Self::StaticRoutes => "show ip route static",
            Self::OspfRoutes => "show ip route ospf",
            Self::BgpRoutes => "show ip bgp",
            Self::MacTable => "show mac address-table",
            Self::Neighbors => "show cdp neighbors detail",
            Self::Arp => "show ip arp",
            Self::Interfaces => "show interfaces",
        }
    }

    /// Fields that together identify one record of this command's output
    pub fn key_fields(&self) -> &'static [&'static str] {
        match self {
            Self::StaticRoutes | Self::OspfRoutes | Self::BgpRoutes => &["network", "mask"],
            Self::MacTable => &["destination_address", "vlan"],
            Self::Neighbors => &["destination_host", "local_port"],
            Self::Arp => &["address"],
            Self::Interfaces => &["interface"],
        }
    }

    pub fn from_command(command: &str) -> Option<Self> {
        let normalized = command.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL
            .into_iter()
            .find(|kind| kind.command().eq_ignore_ascii_case(&normalized))
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.command())
    }
}

/// One differing field between an old and a new record.
///
/// `None` means the field is absent from that side, which is distinct from a
/// present `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// A record together with the identity it was matched on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedRecord {
    pub key: String,
    pub record: Record,
}

/// A record present on both sides whose fields differ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedEntry {
    pub key: String,
    pub old: Record,
    pub new: Record,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub items_added: usize,
    pub items_removed: usize,
    pub items_changed: usize,
}

/// Semantic delta between two record sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub has_changes: bool,
    pub summary: ComparisonSummary,
    pub added: Vec<KeyedRecord>,
    pub removed: Vec<KeyedRecord>,
    pub changed: Vec<ChangedEntry>,
}

impl ComparisonResult {
    pub(crate) fn from_parts(
        added: Vec<KeyedRecord>,
        removed: Vec<KeyedRecord>,
        changed: Vec<ChangedEntry>,
    ) -> Self {
        let summary = ComparisonSummary {
            items_added: added.len(),
            items_removed: removed.len(),
            items_changed: changed.len(),
        };

        Self {
            has_changes: !(added.is_empty() && removed.is_empty() && changed.is_empty()),
            summary,
            added,
            removed,
            changed,
        }
    }
}

/// Outcome kind of a baseline comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    Compared,
    NoBaseline,
    VersionNotFound,
    MalformedSnapshot,
    MismatchedSnapshots,
}

impl std::fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compared => write!(f, "compared"),
            Self::NoBaseline => write!(f, "no_baseline"),
            Self::VersionNotFound => write!(f, "version_not_found"),
            Self::MalformedSnapshot => write!(f, "malformed_snapshot"),
            Self::MismatchedSnapshots => write!(f, "mismatched_snapshots"),
        }
    }
}

/// Structured outcome of comparing against stored snapshots.
///
/// Missing baselines and malformed payloads are expected conditions and are
/// reported here rather than raised as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub device_id: String,
    pub command: String,
    pub status: ComparisonStatus,
    /// Version of the reference snapshot, when one was found
    pub baseline_version: Option<u64>,
    /// Version of the compared snapshot; `None` for live data
    pub compared_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ComparisonResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BaselineComparison {
    pub fn compared(
        device_id: impl Into<String>,
        command: impl Into<String>,
        baseline_version: Option<u64>,
        compared_version: Option<u64>,
        result: ComparisonResult,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            command: command.into(),
            status: ComparisonStatus::Compared,
            baseline_version,
            compared_version,
            result: Some(result),
            error: None,
        }
    }

    pub fn unavailable(
        device_id: impl Into<String>,
        command: impl Into<String>,
        status: ComparisonStatus,
        error: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            command: command.into(),
            status,
            baseline_version: None,
            compared_version: None,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn with_versions(mut self, baseline: Option<u64>, compared: Option<u64>) -> Self {
        self.baseline_version = baseline;
        self.compared_version = compared;
        self
    }

    pub fn is_error(&self) -> bool {
        self.status != ComparisonStatus::Compared
    }

    /// Whether drift was detected; false when the comparison could not run
    pub fn has_changes(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.has_changes)
    }
}
