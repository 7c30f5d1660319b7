//! The action trait.
//!
//! An [`Action`] is one user- or system-initiated operation. The manager
//! drives it through a fixed lifecycle; the action only fills in the steps.
//!
//! # Lifecycle
//!
//! | Step | Method | Thread | On `false` / error |
//! |------|--------|--------|--------------------|
//! | 1 | [`is_allowed`](Action::is_allowed) | coordinating | silent abort, nothing broadcast |
//! | 2 | [`do_before_action`](Action::do_before_action) | coordinating | cancelled, nothing broadcast |
//! | 3 | [`do_action`](Action::do_action) | coordinating or worker | error goes to step 4 |
//! | 4 | [`do_after_action`](Action::do_after_action) | coordinating | returns the events to broadcast |
//!
//! Independently of invocation, [`check_enable`](Action::check_enable) and
//! [`check_state`](Action::check_state) run on the coordinating thread
//! whenever a broadcast matches the action's refresh events, and
//! [`purge`](Action::purge) runs when it matches its purge events.
//!
//! # Threading
//!
//! Actions are shared as `Arc<dyn Action>` and `do_action` may run on a
//! worker thread, so every method takes `&self`. Mutable per-action data
//! (typically a [`Cache`](crate::Cache)) uses interior locking.
//!
//! `do_action` must only communicate through model write guards and caches.
//! It must not touch presentation state.
//!
//! # Example
//!
//! ```
//! use facet_action::{Action, ActionError, ActionOutcome, ActionSpec, AppContext, Invocation};
//! use facet_event::{Event, EventSet};
//!
//! struct Rename {
//!     spec: ActionSpec,
//! }
//!
//! impl Action for Rename {
//!     fn spec(&self) -> &ActionSpec {
//!         &self.spec
//!     }
//!
//!     fn is_allowed(&self, _app: &AppContext, inv: &Invocation) -> bool {
//!         inv.model.is_some()
//!     }
//!
//!     fn do_action(&self, app: &AppContext, inv: &Invocation) -> Result<(), ActionError> {
//!         let _model = inv.resolve_model(app)?;
//!         Ok(())
//!     }
//!
//!     fn do_after_action(
//!         &self,
//!         _app: &AppContext,
//!         _inv: &Invocation,
//!         outcome: &ActionOutcome,
//!     ) -> EventSet {
//!         if outcome.is_success() {
//!             EventSet::from(Event::SavedModel)
//!         } else {
//!             EventSet::empty()
//!         }
//!     }
//! }
//!
//! let rename = Rename { spec: ActionSpec::new("rename") };
//! assert!(!rename.is_allowed(&AppContext::new(), &Invocation::user()));
//! ```

use crate::context::AppContext;
use crate::error::ActionError;
use crate::invocation::{ActionOutcome, Invocation};
use crate::spec::ActionSpec;
use facet_event::EventSet;
use facet_types::ModelId;

/// A unit of work with a fixed lifecycle.
pub trait Action: Send + Sync {
    /// Returns the static configuration.
    fn spec(&self) -> &ActionSpec;

    /// Step 1: whether the invocation may proceed at all.
    ///
    /// Must not mutate anything. Default: always allowed.
    fn is_allowed(&self, _app: &AppContext, _inv: &Invocation) -> bool {
        true
    }

    /// Step 2: last chance to decline, e.g. after asking the user.
    ///
    /// Default: proceed.
    fn do_before_action(&self, _app: &AppContext, _inv: &Invocation) -> bool {
        true
    }

    /// Step 3: the mutating body.
    ///
    /// # Errors
    ///
    /// Any error is passed to [`do_after_action`](Action::do_after_action)
    /// as [`ActionOutcome::Failed`]; it does not stop the lifecycle.
    fn do_action(&self, app: &AppContext, inv: &Invocation) -> Result<(), ActionError>;

    /// Step 4: report and return the events to broadcast.
    ///
    /// Always called on the coordinating thread once `do_action` has
    /// returned, failed, or panicked. Default: broadcast nothing.
    fn do_after_action(
        &self,
        _app: &AppContext,
        _inv: &Invocation,
        _outcome: &ActionOutcome,
    ) -> EventSet {
        EventSet::empty()
    }

    /// Recomputes whether the action is enabled. Must not touch model data
    /// beyond read guards. Default: enabled.
    fn check_enable(&self, _app: &AppContext, _inv: &Invocation) -> bool {
        true
    }

    /// Recomputes the checked state of a checkable action. Default: unchecked.
    fn check_state(&self, _app: &AppContext, _inv: &Invocation) -> bool {
        false
    }

    /// Evicts this action's caches for `model`. Default: no caches.
    fn purge(&self, _model: ModelId) {}

    /// Drops everything this action keeps for `model`, which has been
    /// closed. Default: [`purge`](Action::purge).
    fn forget(&self, model: ModelId) {
        self.purge(model);
    }

    /// Model the events from `do_after_action` are broadcast for.
    ///
    /// Default: the invocation's model. Actions that operate on a model
    /// other than the selected one (undo, redo) override this.
    fn broadcast_model(&self, inv: &Invocation) -> Option<ModelId> {
        inv.model
    }

    /// Label shown to the user. Default: [`ActionSpec::name`].
    fn label(&self, _app: &AppContext) -> String {
        self.spec().name().to_string()
    }
}
