//! IT Reality Core - foundation crate shared by the itreality crates
//!
//! # Modules
//!
//! - [`config`] - Strongly-typed configuration with TOML and environment variable support
//! - [`domain`] - Signals, reports, snapshots and subscribers
//! - [`logging`] - Structured logging with tracing
//!
//! # Configuration
//!
//! ```rust,ignore
//! use itreality_core::Config;
//!
//! let config = Config::load()?;
//! ```
//!
//! Environment variables use the `ITREALITY__` prefix with double underscore separators:
//!
//! ```bash
//! ITREALITY__PROBES__PROBE_TIMEOUT_SECONDS=20
//! ITREALITY__LLM__DEFAULT_MODEL=gpt-4o
//! ```

pub mod config;
pub mod domain;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
