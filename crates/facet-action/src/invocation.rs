//! What an action is asked to do, and how it went.

use crate::context::AppContext;
use crate::error::ActionError;
use facet_event::EventSet;
use facet_model::ModelResource;
use facet_types::ModelId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Who started an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Requested by the presentation layer.
    User,
    /// Auto-invoked because a broadcast matched the action's trigger events.
    Cascade,
}

/// One request to run an action.
///
/// Cloned into the worker for asynchronous bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Events that caused this invocation. Empty for direct user requests.
    pub events: EventSet,
    /// Model the action should operate on.
    pub model: Option<ModelId>,
    /// Optional cursor position in model space.
    pub point: Option<[f64; 3]>,
    /// Who started it.
    pub origin: Origin,
}

impl Invocation {
    /// A direct user request with no model or point yet.
    #[must_use]
    pub fn user() -> Self {
        Self {
            events: EventSet::empty(),
            model: None,
            point: None,
            origin: Origin::User,
        }
    }

    /// A cascaded invocation caused by `events` on `model`.
    #[must_use]
    pub fn cascade(events: EventSet, model: Option<ModelId>) -> Self {
        Self {
            events,
            model,
            point: None,
            origin: Origin::Cascade,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = Some(model);
        self
    }

    #[must_use]
    pub fn with_point(mut self, point: [f64; 3]) -> Self {
        self.point = Some(point);
        self
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }

    /// Resolves the invocation's model through the registry.
    ///
    /// # Errors
    ///
    /// [`ActionError::NoModel`] when no model is set,
    /// [`ActionError::ModelNotFound`] when it is not open.
    pub fn resolve_model(&self, app: &AppContext) -> Result<Arc<ModelResource>, ActionError> {
        let id = self.model.ok_or(ActionError::NoModel)?;
        app.models().get(id).ok_or(ActionError::ModelNotFound(id))
    }
}

/// Result of `do_action`, handed to `do_after_action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The body ran to completion.
    Completed,
    /// The body returned an error or panicked.
    Failed(ActionError),
}

impl ActionOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns the error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ActionError> {
        match self {
            Self::Completed => None,
            Self::Failed(e) => Some(e),
        }
    }
}

impl From<Result<(), ActionError>> for ActionOutcome {
    fn from(result: Result<(), ActionError>) -> Self {
        match result {
            Ok(()) => Self::Completed,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Where an action is in its lifecycle.
///
/// ```text
/// Idle ─► Checking ─► Preparing ─► Executing ─► Finishing ─► Idle
///             │            │
///             └── false ───┴──────────────────────────────► Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionPhase {
    #[default]
    Idle,
    /// `is_allowed` is being evaluated.
    Checking,
    /// `do_before_action` is running.
    Preparing,
    /// `do_action` is running, inline or on a worker.
    Executing,
    /// `do_after_action` is running.
    Finishing,
}

/// Observable per-action state read by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionState {
    /// Result of the last `check_enable`.
    pub enabled: bool,
    /// Result of the last `check_state`; always `false` for non-checkable actions.
    pub checked: bool,
    /// `true` while an asynchronous body is running.
    pub busy: bool,
    /// Current lifecycle phase.
    pub phase: ActionPhase,
}

impl Default for ActionState {
    fn default() -> Self {
        Self {
            enabled: true,
            checked: false,
            busy: false,
            phase: ActionPhase::Idle,
        }
    }
}
