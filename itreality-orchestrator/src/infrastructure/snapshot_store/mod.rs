//! Snapshot persistence backends

mod memory;
mod postgres;

pub use memory::InMemorySnapshotStore;
pub use postgres::SqlxSnapshotStore;
