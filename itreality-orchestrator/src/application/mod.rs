//! Orchestrator application layer

pub mod scheduler;
pub mod service;
pub mod signal_orchestrator;
pub mod workflow;

pub use scheduler::SnapshotScheduler;
pub use service::{SnapshotRequestError, SnapshotService};
pub use signal_orchestrator::SignalOrchestrator;
pub use workflow::{SnapshotWorkflow, WorkflowError};
