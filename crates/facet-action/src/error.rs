//! Action layer errors.
//!
//! # Error Code Convention
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`ActionError::ExecutionFailed`] | `ACTION_EXECUTION_FAILED` | Yes |
//! | [`ActionError::NoModel`] | `ACTION_NO_MODEL` | No |
//! | [`ActionError::ModelNotFound`] | `ACTION_MODEL_NOT_FOUND` | No |
//! | [`ActionError::UnexpectedState`] | `ACTION_UNEXPECTED_STATE` | No |
//! | [`ActionError::Cache`] | `ACTION_CACHE` | Yes |
//! | [`ActionError::Panicked`] | `ACTION_PANICKED` | No |
//! | [`CacheError::ComputeFailed`] | `CACHE_COMPUTE_FAILED` | Yes |
//! | [`CacheError::Unavailable`] | `CACHE_UNAVAILABLE` | Yes |
//!
//! A failed `do_action` never aborts the lifecycle: the error travels to
//! `do_after_action` inside an [`ActionOutcome`](crate::ActionOutcome).

use facet_types::{ErrorCode, ModelId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of an action body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ActionError {
    /// The domain operation reported a failure.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The invocation carried no model but the action needs one.
    #[error("no model selected")]
    NoModel,

    /// The invocation names a model that is not open.
    #[error("model not found: {0}")]
    ModelNotFound(ModelId),

    /// The model payload is not what the action expected.
    #[error("unexpected model state: {0}")]
    UnexpectedState(String),

    /// A derived cache could not be rebuilt.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The body panicked on a worker.
    #[error("action panicked: {0}")]
    Panicked(String),
}

impl ErrorCode for ActionError {
    fn code(&self) -> &'static str {
        match self {
            Self::ExecutionFailed(_) => "ACTION_EXECUTION_FAILED",
            Self::NoModel => "ACTION_NO_MODEL",
            Self::ModelNotFound(_) => "ACTION_MODEL_NOT_FOUND",
            Self::UnexpectedState(_) => "ACTION_UNEXPECTED_STATE",
            Self::Cache(_) => "ACTION_CACHE",
            Self::Panicked(_) => "ACTION_PANICKED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::ExecutionFailed(_) | Self::Cache(_))
    }
}

/// Failure while rebuilding a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum CacheError {
    /// The compute closure failed.
    #[error("cache {cache}: compute failed: {reason}")]
    ComputeFailed { cache: String, reason: String },

    /// The source data needed for the artifact is missing.
    #[error("cache {cache}: source unavailable for {model}")]
    Unavailable { cache: String, model: ModelId },
}

impl ErrorCode for CacheError {
    fn code(&self) -> &'static str {
        match self {
            Self::ComputeFailed { .. } => "CACHE_COMPUTE_FAILED",
            Self::Unavailable { .. } => "CACHE_UNAVAILABLE",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_types::assert_error_codes;

    #[test]
    fn action_error_codes_valid() {
        assert_error_codes(
            &[
                ActionError::ExecutionFailed("x".into()),
                ActionError::NoModel,
                ActionError::ModelNotFound(ModelId::new()),
                ActionError::UnexpectedState("x".into()),
                ActionError::Panicked("x".into()),
            ],
            "ACTION_",
        );
    }

    #[test]
    fn cache_error_codes_valid() {
        assert_error_codes(
            &[
                CacheError::ComputeFailed {
                    cache: "curvature".into(),
                    reason: "x".into(),
                },
                CacheError::Unavailable {
                    cache: "curvature".into(),
                    model: ModelId::new(),
                },
            ],
            "CACHE_",
        );
    }

    #[test]
    fn cache_error_converts_and_stays_recoverable() {
        let err: ActionError = CacheError::ComputeFailed {
            cache: "curvature".into(),
            reason: "degenerate face".into(),
        }
        .into();
        assert_eq!(err.code(), "ACTION_CACHE");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("degenerate face"));
    }

    #[test]
    fn serde_roundtrip() {
        let err = ActionError::Panicked("index out of bounds".into());
        let json = serde_json::to_string(&err).expect("serialize");
        let back: ActionError = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, err);
    }
}
