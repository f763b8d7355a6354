//! Orchestrator application layer

pub mod orchestrator;
pub mod runner;
pub mod worker;

pub use orchestrator::*;
pub use runner::*;
pub use worker::*;
