//! Baseline infrastructure layer

pub mod file_store;
pub mod snapshot_store;

pub use file_store::FileSnapshotStore;
pub use snapshot_store::{InMemorySnapshotStore, SnapshotStore, SnapshotStoreError};
