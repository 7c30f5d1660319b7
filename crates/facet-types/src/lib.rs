//! Core types for facet.
//!
//! The lowest layer of the workspace: identifiers shared by every other
//! crate and the [`ErrorCode`] contract that all error enums implement.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  facet-types   : ModelId, ActionId, ErrorCode   ◄── HERE    │
//! │  facet-event   : Event, EventSet                            │
//! │  facet-model   : ModelResource, Snapshottable, UndoStack    │
//! │  facet-action  : Action trait, Cache, AppContext            │
//! │  facet-runtime : ActionManager, WorkerPool, config          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use facet_types::{ActionId, ModelId};
//!
//! let model = ModelId::new();
//! let action = ActionId::new("invert_normals");
//!
//! assert!(model.to_string().starts_with("model:"));
//! assert_eq!(action.as_str(), "invert_normals");
//! ```

mod error;
mod id;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{ActionId, ModelId};
