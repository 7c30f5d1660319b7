//! Test harness for [`Action`] implementations.
//!
//! Drives one action through its lifecycle against a real [`AppContext`]
//! without a manager, worker pool or propagation. Asynchronous actions run
//! inline.
//!
//! # Features
//!
//! - Full lifecycle per [`run`](ActionTestHarness::run), including undo capture
//! - Refresh and purge entry points
//! - Run log for assertions
//!
//! # Example
//!
//! ```
//! use facet_action::testing::{ActionTestHarness, RunStage};
//! use facet_action::{Action, ActionError, ActionOutcome, ActionSpec, AppContext, Invocation};
//! use facet_event::{Event, EventSet};
//!
//! struct Ping(ActionSpec);
//!
//! impl Action for Ping {
//!     fn spec(&self) -> &ActionSpec {
//!         &self.0
//!     }
//!
//!     fn do_action(&self, _app: &AppContext, _inv: &Invocation) -> Result<(), ActionError> {
//!         Ok(())
//!     }
//!
//!     fn do_after_action(&self, _: &AppContext, _: &Invocation, _: &ActionOutcome) -> EventSet {
//!         EventSet::from(Event::User)
//!     }
//! }
//!
//! let mut harness = ActionTestHarness::new(Ping(ActionSpec::new("ping")));
//! let record = harness.run(Invocation::user());
//!
//! assert_eq!(record.stage, RunStage::Finished);
//! assert_eq!(record.events, EventSet::from(Event::User));
//! assert_eq!(harness.run_log().len(), 1);
//! ```

use crate::action::Action;
use crate::context::AppContext;
use crate::invocation::{ActionOutcome, ActionState, Invocation};
use crate::lifecycle;
use facet_event::EventSet;
use facet_types::ModelId;
use std::sync::Arc;
use std::time::Instant;

/// How far a run got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    /// `is_allowed` returned `false`.
    NotAllowed,
    /// `do_before_action` returned `false`.
    Cancelled,
    /// All four steps ran.
    Finished,
}

/// Record of one lifecycle run.
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// The invocation that was run.
    pub invocation: Invocation,
    /// How far the run got.
    pub stage: RunStage,
    /// Outcome of `do_action`, if it ran.
    pub outcome: Option<ActionOutcome>,
    /// Events returned by `do_after_action`; empty unless finished.
    pub events: EventSet,
    /// Whether an undo entry was pushed.
    pub undo_captured: bool,
    /// Wall time of the run.
    pub elapsed_ms: u64,
}

/// Lifecycle driver for a single action.
pub struct ActionTestHarness<A: Action> {
    action: A,
    app: Arc<AppContext>,
    run_log: Vec<RunRecord>,
}

impl<A: Action> ActionTestHarness<A> {
    /// Creates a harness with a fresh [`AppContext`].
    pub fn new(action: A) -> Self {
        Self::with_context(action, Arc::new(AppContext::new()))
    }

    /// Creates a harness sharing an existing context.
    pub fn with_context(action: A, app: Arc<AppContext>) -> Self {
        Self {
            action,
            app,
            run_log: Vec::new(),
        }
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn app(&self) -> &Arc<AppContext> {
        &self.app
    }

    /// Runs the full lifecycle once and logs it.
    pub fn run(&mut self, invocation: Invocation) -> RunRecord {
        let start = Instant::now();
        let app = self.app.as_ref();
        let mut record = RunRecord {
            invocation: invocation.clone(),
            stage: RunStage::NotAllowed,
            outcome: None,
            events: EventSet::empty(),
            undo_captured: false,
            elapsed_ms: 0,
        };

        if self.action.is_allowed(app, &invocation) {
            if self.action.do_before_action(app, &invocation) {
                record.undo_captured =
                    lifecycle::capture_undo(&self.action, app, &invocation).unwrap_or(false);
                let outcome = lifecycle::execute(&self.action, app, &invocation);
                record.events = self.action.do_after_action(app, &invocation, &outcome);
                record.outcome = Some(outcome);
                record.stage = RunStage::Finished;
            } else {
                record.stage = RunStage::Cancelled;
            }
        }

        record.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.run_log.push(record.clone());
        record
    }

    /// Evaluates `check_enable` / `check_state` as a refresh would.
    pub fn refresh(&self, invocation: &Invocation) -> ActionState {
        let app = self.app.as_ref();
        ActionState {
            enabled: self.action.check_enable(app, invocation),
            checked: self.action.spec().is_checkable() && self.action.check_state(app, invocation),
            ..ActionState::default()
        }
    }

    /// Purges the action's caches for `model`.
    pub fn purge(&self, model: ModelId) {
        self.action.purge(model);
    }

    /// Returns the run log.
    pub fn run_log(&self) -> &[RunRecord] {
        &self.run_log
    }

    pub fn clear_logs(&mut self) {
        self.run_log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActionError, ActionSpec};
    use facet_event::Event;
    use facet_model::{ModelResource, ModelSnapshot, SnapshotError, Snapshottable};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Offset(f64);

    impl Snapshottable for Offset {
        fn snapshot(&self) -> Result<ModelSnapshot, SnapshotError> {
            ModelSnapshot::from_state("offset", self)
        }

        fn restore(&mut self, snapshot: &ModelSnapshot) -> Result<(), SnapshotError> {
            snapshot.validate("offset")?;
            *self = snapshot.to_state()?;
            Ok(())
        }
    }

    struct Shift {
        spec: ActionSpec,
        decline: bool,
    }

    impl Action for Shift {
        fn spec(&self) -> &ActionSpec {
            &self.spec
        }

        fn is_allowed(&self, _app: &AppContext, inv: &Invocation) -> bool {
            inv.model.is_some()
        }

        fn do_before_action(&self, _app: &AppContext, _inv: &Invocation) -> bool {
            !self.decline
        }

        fn do_action(&self, app: &AppContext, inv: &Invocation) -> Result<(), ActionError> {
            let model = inv.resolve_model(app)?;
            let mut guard = model.write();
            let offset = guard
                .downcast_mut::<Offset>()
                .ok_or_else(|| ActionError::UnexpectedState("not an offset".into()))?;
            offset.0 += 1.0;
            Ok(())
        }

        fn do_after_action(&self, _: &AppContext, _: &Invocation, outcome: &ActionOutcome) -> EventSet {
            if outcome.is_success() {
                EventSet::from(Event::AffineChange)
            } else {
                EventSet::empty()
            }
        }

        fn check_state(&self, _app: &AppContext, inv: &Invocation) -> bool {
            inv.model.is_some()
        }
    }

    fn shift(decline: bool) -> Shift {
        Shift {
            spec: ActionSpec::new("shift")
                .checkable()
                .undoable(Event::AffineChange),
            decline,
        }
    }

    #[test]
    fn not_allowed_without_model() {
        let mut harness = ActionTestHarness::new(shift(false));
        let record = harness.run(Invocation::user());
        assert_eq!(record.stage, RunStage::NotAllowed);
        assert!(record.outcome.is_none());
        assert!(record.events.is_empty());
    }

    #[test]
    fn declined_before_action_is_cancelled() {
        let mut harness = ActionTestHarness::new(shift(true));
        let model = harness.app().models().insert(ModelResource::new("m", Offset(0.0)));
        let record = harness.run(Invocation::user().with_model(model.id()));
        assert_eq!(record.stage, RunStage::Cancelled);
        assert!(!harness.app().undo().can_undo());
    }

    #[test]
    fn finished_run_captures_undo_and_mutates() {
        let mut harness = ActionTestHarness::new(shift(false));
        let model = harness.app().models().insert(ModelResource::new("m", Offset(0.0)));

        let record = harness.run(Invocation::user().with_model(model.id()));
        assert_eq!(record.stage, RunStage::Finished);
        assert!(record.undo_captured);
        assert_eq!(record.events, EventSet::from(Event::AffineChange));
        assert_eq!(model.read().downcast_ref::<Offset>(), Some(&Offset(1.0)));

        harness.app().undo().undo().expect("undo");
        assert_eq!(model.read().downcast_ref::<Offset>(), Some(&Offset(0.0)));
    }

    #[test]
    fn failure_reaches_after_action() {
        let mut harness = ActionTestHarness::new(shift(false));
        let missing = ModelId::new();
        let record = harness.run(Invocation::user().with_model(missing));
        assert_eq!(record.stage, RunStage::Finished);
        assert_eq!(
            record.outcome,
            Some(ActionOutcome::Failed(ActionError::ModelNotFound(missing)))
        );
        assert!(record.events.is_empty());
    }

    #[test]
    fn refresh_reports_checked_state() {
        let harness = ActionTestHarness::new(shift(false));
        let state = harness.refresh(&Invocation::user().with_model(ModelId::new()));
        assert!(state.enabled);
        assert!(state.checked);
    }
}
