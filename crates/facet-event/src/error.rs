//! Event layer errors.

use facet_types::ErrorCode;
use thiserror::Error;

/// Errors produced while parsing event names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The name does not match any [`Event`](crate::Event).
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

impl ErrorCode for EventError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownEvent(_) => "EVENT_UNKNOWN",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
