//! Orchestrator value objects

use std::fmt;
use std::str::FromStr;

use netscope_baseline::CommandKind;
use serde::{Deserialize, Serialize};

/// Lifecycle of one device within a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl DeviceStatus {
    /// Returns the set of valid target states from the current state.
    ///
    /// ```text
    /// Pending ──► InProgress ──► Completed
    ///   │             │
    ///   └─────────────┴──► Failed
    /// ```
    pub fn valid_transitions(&self) -> &[DeviceStatus] {
        match self {
            Self::Pending => &[Self::InProgress, Self::Failed],
            Self::InProgress => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => &[],
        }
    }

    pub fn can_transition_to(&self, target: &DeviceStatus) -> bool {
        self.valid_transitions().contains(target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Overall status of a job, derived from its device records.
///
/// `Completed` means every device reached a terminal state, whether or not it
/// succeeded. `Failed` is reserved for jobs where no device task could be
/// started at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Error returned when a device record would move backwards in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid device transition from {from} to {to}")]
pub struct DeviceTransitionError {
    pub from: DeviceStatus,
    pub to: DeviceStatus,
}

/// A kind of data collected from a device during discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryCategory {
    StaticRoutes,
    OspfRoutes,
    BgpRoutes,
    MacTable,
    /// CDP/LLDP neighbors
    Neighbors,
    Arp,
    Interfaces,
}

impl DiscoveryCategory {
    /// Declaration order; collection always follows it
    pub const ALL: [DiscoveryCategory; 7] = [
        Self::StaticRoutes,
        Self::OspfRoutes,
        Self::BgpRoutes,
        Self::MacTable,
        Self::Neighbors,
        Self::Arp,
        Self::Interfaces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaticRoutes => "static_routes",
            Self::OspfRoutes => "ospf_routes",
            Self::BgpRoutes => "bgp_routes",
            Self::MacTable => "mac_table",
            Self::Neighbors => "neighbors",
            Self::Arp => "arp",
            Self::Interfaces => "interfaces",
        }
    }

    /// The trackable command whose snapshots hold this category
    pub fn command_kind(&self) -> CommandKind {
        match self {
            Self::StaticRoutes => CommandKind::StaticRoutes,
            Self::OspfRoutes => CommandKind::OspfRoutes,
            Self::BgpRoutes => CommandKind::BgpRoutes,
            Self::MacTable => CommandKind::MacTable,
            Self::Neighbors => CommandKind::Neighbors,
            Self::Arp => CommandKind::Arp,
            Self::Interfaces => CommandKind::Interfaces,
        }
    }

    pub fn command(&self) -> &'static str {
        self.command_kind().command()
    }
}

impl fmt::Display for DiscoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown discovery category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for DiscoveryCategory {
    type Err = UnknownCategory;

    /// Accepts the category name (`mac_table`, `mac-table`) or its command text
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if let Some(category) = Self::ALL.iter().find(|c| c.as_str() == normalized) {
            return Ok(*category);
        }

        CommandKind::from_command(s)
            .and_then(|kind| Self::ALL.into_iter().find(|c| c.command_kind() == kind))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Opaque credential forwarded to the device collection service.
///
/// Never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Per-job discovery configuration, shared read-only by every device task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryOptions {
    pub static_routes: bool,
    pub ospf_routes: bool,
    pub bgp_routes: bool,
    pub mac_table: bool,
    pub neighbors: bool,
    pub arp: bool,
    pub interfaces: bool,
    /// Persist collected records as snapshots when the device succeeds
    pub cache_results: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<AuthToken>,
}

impl DiscoveryOptions {
    /// Every category enabled, caching off
    pub fn all() -> Self {
        Self::default().with_categories(DiscoveryCategory::ALL)
    }

    pub fn with_category(mut self, category: DiscoveryCategory) -> Self {
        *self.toggle_mut(category) = true;
        self
    }

    pub fn with_categories(self, categories: impl IntoIterator<Item = DiscoveryCategory>) -> Self {
        categories
            .into_iter()
            .fold(self, |options, category| options.with_category(category))
    }

    pub fn with_cache_results(mut self, cache_results: bool) -> Self {
        self.cache_results = cache_results;
        self
    }

    pub fn with_auth_token(mut self, token: AuthToken) -> Self {
        self.auth_token = Some(token);
        self
    }

    pub fn is_enabled(&self, category: DiscoveryCategory) -> bool {
        match category {
            DiscoveryCategory::StaticRoutes => self.static_routes,
            DiscoveryCategory::OspfRoutes => self.ospf_routes,
            DiscoveryCategory::BgpRoutes => self.bgp_routes,
            DiscoveryCategory::MacTable => self.mac_table,
            DiscoveryCategory::Neighbors => self.neighbors,
            DiscoveryCategory::Arp => self.arp,
            DiscoveryCategory::Interfaces => self.interfaces,
        }
    }

    /// Enabled categories in declaration order
    pub fn enabled_categories(&self) -> Vec<DiscoveryCategory> {
        DiscoveryCategory::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }

    fn toggle_mut(&mut self, category: DiscoveryCategory) -> &mut bool {
        match category {
            DiscoveryCategory::StaticRoutes => &mut self.static_routes,
            DiscoveryCategory::OspfRoutes => &mut self.ospf_routes,
            DiscoveryCategory::BgpRoutes => &mut self.bgp_routes,
            DiscoveryCategory::MacTable => &mut self.mac_table,
            DiscoveryCategory::Neighbors => &mut self.neighbors,
            DiscoveryCategory::Arp => &mut self.arp,
            DiscoveryCategory::Interfaces => &mut self.interfaces,
        }
    }
}
