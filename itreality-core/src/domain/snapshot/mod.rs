//! Snapshots: the stored `{signals, report}` pair for one domain and owner

pub mod entities;
pub mod value_objects;

pub use entities::*;
pub use value_objects::*;
