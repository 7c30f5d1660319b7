//! Model snapshots for undo.
//!
//! The [`Snapshottable`] trait is the only thing the undo history needs from
//! a payload: capture the state, and later put it back. The history never
//! looks inside a [`ModelSnapshot`].
//!
//! Snapshots hold a `serde_json::Value`. Numbers are kept as `f64` inside the
//! value tree (no text round trip), so restoring reproduces the captured
//! floating point state exactly.

use facet_types::ErrorCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot format version mismatch.
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    /// The snapshot was taken from a different kind of payload.
    #[error("kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: String, actual: String },

    /// Snapshot content is unusable.
    #[error("invalid snapshot data: {0}")]
    InvalidData(String),
}

impl ErrorCode for SnapshotError {
    fn code(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "SNAPSHOT_SERIALIZATION",
            Self::VersionMismatch { .. } => "SNAPSHOT_VERSION_MISMATCH",
            Self::KindMismatch { .. } => "SNAPSHOT_KIND_MISMATCH",
            Self::InvalidData(_) => "SNAPSHOT_INVALID_DATA",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Captured state of one model payload.
///
/// # Fields
///
/// - `kind`: payload type tag, checked on restore
/// - `version`: format version
/// - `state`: serialized payload
/// - `metadata`: free-form extras (e.g. which fields were captured)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// Payload type tag.
    pub kind: String,

    /// Snapshot format version.
    pub version: u32,

    /// Serialized payload.
    pub state: serde_json::Value,

    /// Optional metadata.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ModelSnapshot {
    /// Creates a snapshot from serializable state.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Serialization` if the state cannot be serialized.
    pub fn from_state<T: Serialize>(
        kind: impl Into<String>,
        state: &T,
    ) -> Result<Self, SnapshotError> {
        Ok(Self {
            kind: kind.into(),
            version: SNAPSHOT_VERSION,
            state: serde_json::to_value(state)?,
            metadata: HashMap::new(),
        })
    }

    /// Creates an empty snapshot (for payloads with nothing to restore).
    #[must_use]
    pub fn empty(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            version: SNAPSHOT_VERSION,
            state: serde_json::Value::Null,
            metadata: HashMap::new(),
        }
    }

    /// Deserializes the state.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Serialization` if deserialization fails.
    pub fn to_state<T: for<'de> Deserialize<'de>>(&self) -> Result<T, SnapshotError> {
        Ok(T::deserialize(&self.state)?)
    }

    /// Adds metadata.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Checks that this snapshot belongs to `expected_kind` and the current format.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind or version doesn't match.
    pub fn validate(&self, expected_kind: &str) -> Result<(), SnapshotError> {
        if self.kind != expected_kind {
            return Err(SnapshotError::KindMismatch {
                expected: expected_kind.to_string(),
                actual: self.kind.clone(),
            });
        }

        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: self.version,
            });
        }

        Ok(())
    }

    /// Returns true if the state is empty/null.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_null()
    }
}

/// Capture/restore capability of a model payload.
///
/// # Contract
///
/// - `snapshot()` captures everything an action may mutate
/// - `restore()` returns the payload to exactly the captured state
/// - both are called with the model's lock held (read for `snapshot`,
///   write for `restore`), so implementations need no locking of their own
pub trait Snapshottable {
    /// Captures the current state.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the state cannot be serialized.
    fn snapshot(&self) -> Result<ModelSnapshot, SnapshotError>;

    /// Restores state from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` on kind/version mismatch or invalid data.
    fn restore(&mut self, snapshot: &ModelSnapshot) -> Result<(), SnapshotError>;
}
