//! Shared model state for facet.
//!
//! A *model* is one open face scan. Its payload belongs to the domain layer;
//! this crate only owns the lock around it, the snapshot contract that makes
//! it undoable, and the history of those snapshots.
//!
//! # Main Types
//!
//! - [`ModelResource`]: payload + one reader/writer lock, acquired only
//!   through scoped [`ModelReadGuard`] / [`ModelWriteGuard`]
//! - [`ModelState`]: what a payload must provide (snapshot support, `Send + Sync`)
//! - [`Snapshottable`] / [`ModelSnapshot`]: capture and restore
//! - [`ModelRegistry`]: open models and the current selection
//! - [`UndoStack`]: linear undo/redo history over snapshots
//!
//! # Locking Discipline
//!
//! ```text
//! any number of ModelReadGuard   ─┐
//!                                 ├─ mutually exclusive per ModelResource
//! exactly one ModelWriteGuard    ─┘
//! ```
//!
//! Guards release on drop, so a lock can never outlive the scope that took
//! it. Code touching several models takes one model's lock at a time.
//!
//! # Example
//!
//! ```
//! use facet_model::{ModelResource, ModelSnapshot, Snapshottable, SnapshotError};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct Scan {
//!     vertices: Vec<[f64; 3]>,
//! }
//!
//! impl Snapshottable for Scan {
//!     fn snapshot(&self) -> Result<ModelSnapshot, SnapshotError> {
//!         ModelSnapshot::from_state("scan", self)
//!     }
//!
//!     fn restore(&mut self, snapshot: &ModelSnapshot) -> Result<(), SnapshotError> {
//!         snapshot.validate("scan")?;
//!         *self = snapshot.to_state()?;
//!         Ok(())
//!     }
//! }
//!
//! let model = ModelResource::new("subject-01", Scan { vertices: vec![[0.0, 0.0, 1.0]] });
//! {
//!     let mut guard = model.write();
//!     let scan = guard.downcast_mut::<Scan>().expect("scan payload");
//!     scan.vertices[0][2] = -1.0;
//! }
//! let guard = model.read();
//! assert_eq!(guard.downcast_ref::<Scan>().map(|s| s.vertices[0][2]), Some(-1.0));
//! ```

mod registry;
mod resource;
mod snapshot;
mod undo;

pub use registry::ModelRegistry;
pub use resource::{ModelReadGuard, ModelResource, ModelState, ModelWriteGuard};
pub use snapshot::{ModelSnapshot, SnapshotError, Snapshottable, SNAPSHOT_VERSION};
pub use undo::{UndoEntry, UndoError, UndoOutcome, UndoStack, DEFAULT_MAX_UNDO};
