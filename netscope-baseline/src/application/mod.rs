//! Baseline application layer

pub mod baseline;
pub mod diff;
pub mod report;
