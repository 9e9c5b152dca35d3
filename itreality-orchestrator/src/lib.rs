//! IT Reality Orchestrator - signal collection and snapshot lifecycle
//!
//! This crate turns the probes and the report synthesizer into stored
//! snapshots, on demand or on a schedule.
//!
//! # Features
//!
//! - **Signal collection** - every probe concurrently, each under its own timeout
//! - **Snapshot workflow** - collection plus synthesis under one run budget, then an insert-only store
//! - **Entitlements** - tier cooldown and domain ceiling for on-demand requests
//! - **Scheduling** - monthly re-snapshots for paid subscribers in a bounded worker pool
//! - **Notifications** - best-effort log or signed webhook delivery
//!
//! # Architecture
//!
//! ```text
//! itreality-orchestrator/
//! ├── application/          # Use cases
//! │   ├── signal_orchestrator.rs
//! │   ├── workflow.rs       # Pending → Completed | Failed
//! │   ├── scheduler.rs      # run_tick
//! │   └── service.rs        # request_snapshot
//! ├── infrastructure/       # Probe registry, stores, notifiers
//! └── domain/               # Schedule, entitlements, interfaces
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{
    SignalOrchestrator, SnapshotRequestError, SnapshotScheduler, SnapshotService,
    SnapshotWorkflow, WorkflowError,
};
