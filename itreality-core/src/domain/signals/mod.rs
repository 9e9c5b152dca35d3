//! Domain signals
//!
//! Each signal category is collected by an independent [`Probe`] and lands in
//! a [`SignalBlock`]. A [`SignalBundle`] holds exactly one block per category
//! and is immutable once stored.

pub mod entities;
pub mod traits;
pub mod value_objects;

pub use entities::*;
pub use traits::*;
pub use value_objects::*;
