//! Lifecycle steps shared by the manager, workers and the test harness.

use crate::action::Action;
use crate::context::AppContext;
use crate::error::ActionError;
use crate::invocation::{ActionOutcome, Invocation};
use facet_model::UndoError;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Runs `do_action`, turning a panic into [`ActionError::Panicked`].
///
/// This is the only place a body runs, inline or on a worker, so a fault in
/// step 3 always produces an outcome for step 4.
pub fn execute(action: &dyn Action, app: &AppContext, inv: &Invocation) -> ActionOutcome {
    let result = catch_unwind(AssertUnwindSafe(|| action.do_action(app, inv)))
        .unwrap_or_else(|payload| Err(ActionError::Panicked(panic_message(payload.as_ref()))));
    if let Err(e) = &result {
        tracing::warn!(action = %action.spec().id(), error = %e, "action failed");
    }
    result.into()
}

/// Pushes an undo snapshot of the invocation's model if the action is undoable.
///
/// Returns `Ok(true)` when an entry was pushed. Invocations without a
/// resolvable model push nothing.
///
/// # Errors
///
/// Propagates [`UndoError::Capture`].
pub fn capture_undo(
    action: &dyn Action,
    app: &AppContext,
    inv: &Invocation,
) -> Result<bool, UndoError> {
    let spec = action.spec();
    let Some(events) = spec.undo_events() else {
        return Ok(false);
    };
    let Ok(model) = inv.resolve_model(app) else {
        return Ok(false);
    };
    app.undo().capture(&model, spec.name(), events)?;
    Ok(true)
}

/// Extracts the message from a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
