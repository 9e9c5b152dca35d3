//! Orchestrator infrastructure layer

pub mod notifier;
pub mod probe_registry;
pub mod snapshot_store;
pub mod subscriber_directory;

pub use notifier::*;
pub use probe_registry::*;
pub use snapshot_store::*;
pub use subscriber_directory::*;
