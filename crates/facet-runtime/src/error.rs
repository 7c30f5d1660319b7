//! Runtime errors.
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`ManagerError::UnknownAction`] | `MANAGER_UNKNOWN_ACTION` | No |
//! | [`ManagerError::DuplicateAction`] | `MANAGER_DUPLICATE_ACTION` | No |
//! | [`ManagerError::UnknownModel`] | `MANAGER_UNKNOWN_MODEL` | No |
//! | [`ManagerError::ModelBusy`] | `MANAGER_MODEL_BUSY` | Yes |
//! | [`ManagerError::PassLimitExceeded`] | `MANAGER_PASS_LIMIT_EXCEEDED` | No |
//! | [`ManagerError::WaitTimeout`] | `MANAGER_WAIT_TIMEOUT` | Yes |
//! | [`ManagerError::Undo`] | `MANAGER_UNDO` | Yes |
//! | [`ManagerError::Runtime`] | `MANAGER_RUNTIME` | No |

use crate::wave::WaveId;
use facet_model::UndoError;
use facet_types::{ErrorCode, ModelId};
use thiserror::Error;

/// Errors from the action manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// No action is registered under this name.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// An action with this name is already registered.
    #[error("action already registered: {0}")]
    DuplicateAction(String),

    /// The model is not open.
    #[error("unknown model: {0}")]
    UnknownModel(ModelId),

    /// A job on the model is still in flight.
    #[error("model {0} is busy with a running action")]
    ModelBusy(ModelId),

    /// A wave broadcast more often than the configured bound.
    #[error("{wave} exceeded {limit} propagation passes")]
    PassLimitExceeded { wave: WaveId, limit: usize },

    /// `wait_idle` ran out of time with jobs still running.
    #[error("timed out with {pending} job(s) still running")]
    WaitTimeout { pending: usize },

    /// Undo or redo failed.
    #[error(transparent)]
    Undo(#[from] UndoError),

    /// The worker runtime could not be started.
    #[error("worker runtime: {0}")]
    Runtime(String),
}

impl ErrorCode for ManagerError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownAction(_) => "MANAGER_UNKNOWN_ACTION",
            Self::DuplicateAction(_) => "MANAGER_DUPLICATE_ACTION",
            Self::UnknownModel(_) => "MANAGER_UNKNOWN_MODEL",
            Self::ModelBusy(_) => "MANAGER_MODEL_BUSY",
            Self::PassLimitExceeded { .. } => "MANAGER_PASS_LIMIT_EXCEEDED",
            Self::WaitTimeout { .. } => "MANAGER_WAIT_TIMEOUT",
            Self::Undo(_) => "MANAGER_UNDO",
            Self::Runtime(_) => "MANAGER_RUNTIME",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::WaitTimeout { .. } | Self::ModelBusy(_) => true,
            Self::Undo(e) => e.is_recoverable(),
            _ => false,
        }
    }
}
