//! Actions for facet.
//!
//! Every user- or system-initiated operation is an [`Action`]: a value with
//! a fixed four-step lifecycle, a static [`ActionSpec`] saying which events
//! trigger, refresh and purge it, and optionally a per-model [`Cache`] of
//! derived artifacts.
//!
//! # Crate Layout
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Action trait + ActionSpec                                  │
//! │   is_allowed → do_before_action → do_action → do_after_action
//! ├────────────────────────────────────────────────────────────┤
//! │ Invocation / ActionOutcome / ActionState                   │
//! ├────────────────────────────────────────────────────────────┤
//! │ AppContext: ModelRegistry, UndoStack, BusyIndicator, Status│
//! ├────────────────────────────────────────────────────────────┤
//! │ Cache<A>: non-blocking lock, off-thread refresh, purge     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Driving actions (propagation, workers) is the job of `facet-runtime`.
//! For unit tests of a single action use [`testing::ActionTestHarness`].

mod action;
mod cache;
mod context;
mod error;
mod invocation;
pub mod lifecycle;
mod spec;
pub mod testing;

pub use action::Action;
pub use cache::{Cache, CacheHandle};
pub use context::{
    AppContext, BusyIndicator, BusyToken, ModelJobToken, ModelJobs, StatusSink, TracingStatus,
};
pub use error::{ActionError, CacheError};
pub use invocation::{ActionOutcome, ActionPhase, ActionState, Invocation, Origin};
pub use spec::ActionSpec;
