//! Runtime for facet actions.
//!
//! This crate drives [`Action`](facet_action::Action)s: it owns the
//! registry, runs lifecycles, propagates the events they return, and runs
//! asynchronous bodies on a bounded worker pool.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ActionManager                         │
//! │  registry · lifecycle · purge → refresh → trigger · waves   │
//! └──────────────┬───────────────────────────────▲──────────────┘
//!                │ Job                           │ Completion
//!                ▼                               │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        WorkerPool                           │
//! │  tokio runtime · Semaphore(max_concurrent) · spawn_blocking │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use facet_runtime::{ActionManager, InvokeOutcome};
//! use facet_runtime::config::FacetConfig;
//! use facet_action::Invocation;
//!
//! let mut manager = ActionManager::from_config(&FacetConfig::default())?;
//! manager.register_builtins()?;
//!
//! // Nothing to undo yet.
//! let outcome = manager.invoke("undo", Invocation::user())?;
//! assert_eq!(outcome, InvokeOutcome::NotAllowed);
//! # Ok::<(), facet_runtime::ManagerError>(())
//! ```

mod builtin;
pub mod config;
mod error;
mod manager;
mod wave;
mod worker;

pub use builtin::{RedoAction, UndoAction};
pub use error::ManagerError;
pub use manager::ActionManager;
pub use wave::{CycleGuard, InvokeOutcome, WaveId, WaveReport};
pub use worker::{Completion, Job, WorkerPool};
