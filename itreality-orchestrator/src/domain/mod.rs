//! Orchestrator domain: scheduling rules, entitlements and the interfaces
//! to persistence and notification.

pub mod entities;
pub mod entitlements;
pub mod errors;
pub mod notifier;
pub mod repositories;
pub mod schedule;
pub mod value_objects;

pub use entities::*;
pub use entitlements::*;
pub use errors::*;
pub use notifier::*;
pub use repositories::*;
pub use schedule::*;
pub use value_objects::*;
