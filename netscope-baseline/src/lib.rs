//! Netscope Baseline - versioned device snapshots and drift detection
//!
//! A *snapshot* is the structured output of one command captured from one
//! device at a point in time. Snapshots are versioned per `(device, command)`
//! and any of them can serve as a *baseline* for drift comparison.
//!
//! ```text
//! netscope-baseline/
//! ├── domain/           # Snapshot, records, comparison results
//! ├── application/      # Diff engine, baseline comparison, text report
//! └── infrastructure/   # Snapshot stores (in-memory, JSON files)
//! ```
//!
//! The diff engine is pure: [`compare`] keys records by a natural identity
//! (interface name, route prefix, MAC address...) and reports added, removed
//! and changed entries with field-level differences.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::baseline::{compare_baselines, compare_current_to_baseline, compare_versions};
pub use application::diff::{KeySpec, compare};
pub use application::report::{format_baseline_report, format_comparison_report};
pub use domain::entities::{NewSnapshot, Record, Snapshot};
pub use domain::value_objects::{
    BaselineComparison, ChangedEntry, CommandKind, ComparisonResult, ComparisonStatus,
    ComparisonSummary, FieldChange, KeyedRecord,
};
pub use infrastructure::{FileSnapshotStore, InMemorySnapshotStore, SnapshotStore, SnapshotStoreError};
