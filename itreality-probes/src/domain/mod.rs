//! Lookup seams the probes are written against

pub mod certificates;
pub mod dns;

pub use certificates::*;
pub use dns::*;
