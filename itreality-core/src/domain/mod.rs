//! Domain Layer - signals, reports, snapshots and subscribers

pub mod report;
pub mod signals;
pub mod snapshot;
pub mod subscription;

#[allow(ambiguous_glob_reexports)]
pub use report::*;
#[allow(ambiguous_glob_reexports)]
pub use signals::*;
#[allow(ambiguous_glob_reexports)]
pub use snapshot::*;
#[allow(ambiguous_glob_reexports)]
pub use subscription::*;
