//! Built-in `undo` and `redo` actions.
//!
//! Both go through the normal lifecycle so they can be bound to menus and
//! shortcuts like any other action. They refresh on every event so their
//! enabled state and label follow the history. Both stay disabled while an
//! asynchronous job on the model they would restore is in flight.

use facet_action::{Action, ActionError, ActionOutcome, ActionSpec, AppContext, Invocation};
use facet_event::{Event, EventSet};
use facet_model::{UndoError, UndoOutcome};
use facet_types::ModelId;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Undo,
    Redo,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Self::Undo => "Undo",
            Self::Redo => "Redo",
        }
    }
}

/// Shared body of the two history actions.
#[derive(Debug)]
struct HistoryStep {
    spec: ActionSpec,
    direction: Direction,
    last: Mutex<Option<UndoOutcome>>,
}

impl HistoryStep {
    fn new(id: &str, direction: Direction) -> Self {
        Self {
            spec: ActionSpec::new(id)
                .display_name(direction.verb())
                .tooltip(format!("{} the last change", direction.verb()))
                .refresh_on(EventSet::ALL),
            direction,
            last: Mutex::new(None),
        }
    }

    fn next_model(&self, app: &AppContext) -> Option<ModelId> {
        match self.direction {
            Direction::Undo => app.undo().undo_model(),
            Direction::Redo => app.undo().redo_model(),
        }
    }

    /// Something to step over, and no job in flight on its model.
    fn available(&self, app: &AppContext) -> bool {
        self.next_model(app)
            .is_some_and(|m| !app.jobs().is_active(m))
    }

    fn run(&self, app: &AppContext) -> Result<(), ActionError> {
        *self.last.lock() = None;
        if let Some(model) = self.next_model(app).filter(|&m| app.jobs().is_active(m)) {
            return Err(ActionError::ExecutionFailed(format!(
                "model {model} is busy with a running action"
            )));
        }
        let result: Result<UndoOutcome, UndoError> = match self.direction {
            Direction::Undo => app.undo().undo(),
            Direction::Redo => app.undo().redo(),
        };
        let outcome = result.map_err(|e| ActionError::ExecutionFailed(e.to_string()))?;
        tracing::debug!(model = %outcome.model, entry = %outcome.name, "{} applied", self.direction.verb());
        *self.last.lock() = Some(outcome);
        Ok(())
    }

    fn after(&self, app: &AppContext, outcome: &ActionOutcome) -> EventSet {
        if let Some(err) = outcome.error() {
            app.status()
                .message(&format!("{} failed: {err}", self.direction.verb()));
            return EventSet::empty();
        }
        self.last
            .lock()
            .as_ref()
            .map_or_else(EventSet::empty, |o| o.events | Event::RestoreChange)
    }

    fn scope(&self, inv: &Invocation) -> Option<ModelId> {
        self.last.lock().as_ref().map(|o| o.model).or(inv.model)
    }

    fn label(&self, app: &AppContext) -> String {
        let next = match self.direction {
            Direction::Undo => app.undo().undo_name(),
            Direction::Redo => app.undo().redo_name(),
        };
        match next {
            Some(name) => format!("{} {name}", self.direction.verb()),
            None => self.direction.verb().to_string(),
        }
    }
}

macro_rules! history_action {
    ($(#[$meta:meta])* $name:ident, $id:literal, $direction:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name(HistoryStep);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(HistoryStep::new($id, $direction))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Action for $name {
            fn spec(&self) -> &ActionSpec {
                &self.0.spec
            }

            fn is_allowed(&self, app: &AppContext, _inv: &Invocation) -> bool {
                self.0.available(app)
            }

            fn do_action(&self, app: &AppContext, _inv: &Invocation) -> Result<(), ActionError> {
                self.0.run(app)
            }

            fn do_after_action(
                &self,
                app: &AppContext,
                _inv: &Invocation,
                outcome: &ActionOutcome,
            ) -> EventSet {
                self.0.after(app, outcome)
            }

            fn check_enable(&self, app: &AppContext, _inv: &Invocation) -> bool {
                self.0.available(app)
            }

            fn broadcast_model(&self, inv: &Invocation) -> Option<ModelId> {
                self.0.scope(inv)
            }

            fn label(&self, app: &AppContext) -> String {
                self.0.label(app)
            }
        }
    };
}

history_action!(
    /// Restores the most recent undo entry. Registered as `undo`.
    UndoAction,
    "undo",
    Direction::Undo
);

history_action!(
    /// Re-applies the most recently undone entry. Registered as `redo`.
    RedoAction,
    "redo",
    Direction::Redo
);
