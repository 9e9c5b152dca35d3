//! IT Reality - point-in-time IT reality reports for a domain
//!
//! This is the binary crate that wires the probes, the report synthesizer
//! and the snapshot orchestrator together behind a CLI and a background
//! scheduler.

pub mod app;
pub mod cli;
pub mod workers;

pub use app::{App, build_orchestrator};
pub use itreality_core::{Config, init_tracing};

// Re-export for convenience
pub use itreality_core;
pub use itreality_llm;
pub use itreality_orchestrator;
pub use itreality_probes;
