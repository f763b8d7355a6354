//! Orchestrator infrastructure layer

pub mod file_collector;
pub mod progress_registry;
pub mod task_queue;

pub use file_collector::*;
pub use progress_registry::*;
pub use task_queue::*;
