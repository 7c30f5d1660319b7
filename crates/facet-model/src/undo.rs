//! Linear undo/redo history over model snapshots.
//!
//! # Lifecycle of an Entry
//!
//! ```text
//!            push / capture            undo()               redo()
//! action ──────────────────► undo ───────────► redo ───────────► undo
//!                            stack             stack             stack
//!                              ▲                 │
//!                              │    any push     │
//!                              └──── clears ─────┘
//! ```
//!
//! Each entry remembers the model it belongs to, the snapshot that reverses
//! the change, the display name of the action that made it, and the
//! [`EventSet`] to broadcast once it is undone. `undo()` swaps the live state
//! with the stored snapshot under the model's write lock, so the same entry
//! (now holding the undone state) can be redone.
//!
//! The history is global: entries for different models interleave in the
//! order they were made. [`UndoStack::clear`] drops one model's entries when
//! it is closed.

use crate::resource::ModelResource;
use crate::snapshot::{ModelSnapshot, SnapshotError};
use chrono::{DateTime, Utc};
use facet_event::EventSet;
use facet_types::{ErrorCode, ModelId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

/// Default maximum number of undo entries kept.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Undo history errors.
#[derive(Debug, Error)]
pub enum UndoError {
    /// `undo()` on an empty undo stack.
    #[error("nothing to undo")]
    NothingToUndo,

    /// `redo()` on an empty redo stack.
    #[error("nothing to redo")]
    NothingToRedo,

    /// Capturing the pre-change state failed.
    #[error("capture failed for {name}: {source}")]
    Capture {
        name: String,
        #[source]
        source: SnapshotError,
    },

    /// Swapping the stored snapshot back in failed. The entry stays where it was.
    #[error("restore failed for {name}: {source}")]
    Restore {
        name: String,
        #[source]
        source: SnapshotError,
    },
}

impl ErrorCode for UndoError {
    fn code(&self) -> &'static str {
        match self {
            Self::NothingToUndo => "UNDO_NOTHING_TO_UNDO",
            Self::NothingToRedo => "UNDO_NOTHING_TO_REDO",
            Self::Capture { .. } => "UNDO_CAPTURE_FAILED",
            Self::Restore { .. } => "UNDO_RESTORE_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::NothingToUndo | Self::NothingToRedo)
    }
}

/// One reversible change.
#[derive(Debug, Clone)]
pub struct UndoEntry {
    model: Arc<ModelResource>,
    name: String,
    snapshot: ModelSnapshot,
    events: EventSet,
    created_at: DateTime<Utc>,
}

impl UndoEntry {
    /// Returns the model this entry restores.
    #[must_use]
    pub fn model(&self) -> &Arc<ModelResource> {
        &self.model
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stored snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &ModelSnapshot {
        &self.snapshot
    }

    /// Returns the events broadcast when this entry is applied.
    #[must_use]
    pub fn events(&self) -> EventSet {
        self.events
    }

    /// Returns when the entry was recorded.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Result of a successful `undo()` or `redo()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoOutcome {
    /// Model whose state was swapped.
    pub model: ModelId,
    /// Display name of the entry.
    pub name: String,
    /// Events to broadcast for `model`.
    pub events: EventSet,
}

#[derive(Debug)]
struct History {
    undo: VecDeque<UndoEntry>,
    redo: Vec<UndoEntry>,
    max_entries: usize,
}

/// Global undo/redo history.
///
/// All methods take `&self`; the stack is shared as `Arc<UndoStack>`. The
/// internal mutex is never held while a model lock is being acquired.
#[derive(Debug)]
pub struct UndoStack {
    history: Mutex<History>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    /// Creates a stack holding at most [`DEFAULT_MAX_UNDO`] entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_UNDO)
    }

    /// Creates a stack holding at most `max_entries` entries (minimum 1).
    #[must_use]
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            history: Mutex::new(History {
                undo: VecDeque::new(),
                redo: Vec::new(),
                max_entries: max_entries.max(1),
            }),
        }
    }

    /// Returns the depth limit.
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.history.lock().max_entries
    }

    /// Records a change. Discards the redo stack.
    ///
    /// When the depth limit is reached the oldest entry is dropped.
    pub fn push(
        &self,
        model: Arc<ModelResource>,
        name: impl Into<String>,
        snapshot: ModelSnapshot,
        events: EventSet,
    ) {
        let entry = UndoEntry {
            model,
            name: name.into(),
            snapshot,
            events,
            created_at: Utc::now(),
        };
        tracing::debug!(model = %entry.model.id(), name = %entry.name, events = %entry.events, "undo entry pushed");

        let mut history = self.history.lock();
        history.redo.clear();
        history.undo.push_back(entry);
        while history.undo.len() > history.max_entries {
            if let Some(dropped) = history.undo.pop_front() {
                tracing::trace!(name = %dropped.name, "oldest undo entry dropped");
            }
        }
    }

    /// Captures `model` under its read lock and pushes the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`UndoError::Capture`] if the payload cannot be snapshotted;
    /// nothing is pushed in that case.
    pub fn capture(
        &self,
        model: &Arc<ModelResource>,
        name: impl Into<String>,
        events: EventSet,
    ) -> Result<(), UndoError> {
        let name = name.into();
        let snapshot = model.capture().map_err(|source| UndoError::Capture {
            name: name.clone(),
            source,
        })?;
        self.push(Arc::clone(model), name, snapshot, events);
        Ok(())
    }

    /// Reverts the most recent entry and moves it to the redo stack.
    ///
    /// # Errors
    ///
    /// [`UndoError::NothingToUndo`] on an empty stack; [`UndoError::Restore`]
    /// if the swap fails, in which case the entry is put back.
    pub fn undo(&self) -> Result<UndoOutcome, UndoError> {
        let entry = self
            .history
            .lock()
            .undo
            .pop_back()
            .ok_or(UndoError::NothingToUndo)?;

        match Self::apply(entry) {
            Ok((entry, outcome)) => {
                self.history.lock().redo.push(entry);
                tracing::debug!(model = %outcome.model, name = %outcome.name, "undone");
                Ok(outcome)
            }
            Err((entry, err)) => {
                self.history.lock().undo.push_back(entry);
                Err(err)
            }
        }
    }

    /// Re-applies the most recently undone entry.
    ///
    /// # Errors
    ///
    /// [`UndoError::NothingToRedo`] on an empty redo stack;
    /// [`UndoError::Restore`] if the swap fails.
    pub fn redo(&self) -> Result<UndoOutcome, UndoError> {
        let entry = self
            .history
            .lock()
            .redo
            .pop()
            .ok_or(UndoError::NothingToRedo)?;

        match Self::apply(entry) {
            Ok((entry, outcome)) => {
                self.history.lock().undo.push_back(entry);
                tracing::debug!(model = %outcome.model, name = %outcome.name, "redone");
                Ok(outcome)
            }
            Err((entry, err)) => {
                self.history.lock().redo.push(entry);
                Err(err)
            }
        }
    }

    /// Swaps the entry's snapshot with the live state. The returned entry
    /// holds the state that was live before the swap.
    fn apply(mut entry: UndoEntry) -> Result<(UndoEntry, UndoOutcome), (UndoEntry, UndoError)> {
        match entry.model.exchange(&entry.snapshot) {
            Ok(previous) => {
                entry.snapshot = previous;
                let outcome = UndoOutcome {
                    model: entry.model.id(),
                    name: entry.name.clone(),
                    events: entry.events,
                };
                Ok((entry, outcome))
            }
            Err(source) => {
                tracing::warn!(model = %entry.model.id(), name = %entry.name, error = %source, "undo restore failed");
                let err = UndoError::Restore {
                    name: entry.name.clone(),
                    source,
                };
                Err((entry, err))
            }
        }
    }

    /// Returns `true` if there is something to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.history.lock().undo.is_empty()
    }

    /// Returns `true` if there is something to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.history.lock().redo.is_empty()
    }

    /// Returns `true` if any undo entry belongs to `model`.
    #[must_use]
    pub fn can_undo_for(&self, model: ModelId) -> bool {
        self.history
            .lock()
            .undo
            .iter()
            .any(|e| e.model.id() == model)
    }

    /// Display name of the entry `undo()` would revert.
    #[must_use]
    pub fn undo_name(&self) -> Option<String> {
        self.history.lock().undo.back().map(|e| e.name.clone())
    }

    /// Display name of the entry `redo()` would re-apply.
    #[must_use]
    pub fn redo_name(&self) -> Option<String> {
        self.history.lock().redo.last().map(|e| e.name.clone())
    }

    /// Model of the entry `undo()` would revert.
    #[must_use]
    pub fn undo_model(&self) -> Option<ModelId> {
        self.history.lock().undo.back().map(|e| e.model.id())
    }

    /// Model of the entry `redo()` would re-apply.
    #[must_use]
    pub fn redo_model(&self) -> Option<ModelId> {
        self.history.lock().redo.last().map(|e| e.model.id())
    }

    /// Number of undo entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.lock().undo.len()
    }

    /// Returns `true` if the undo stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.lock().undo.is_empty()
    }

    /// Number of redo entries.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.history.lock().redo.len()
    }

    /// Drops entries for one model, or everything with `None`.
    pub fn clear(&self, model: Option<ModelId>) {
        let mut history = self.history.lock();
        match model {
            Some(id) => {
                history.undo.retain(|e| e.model.id() != id);
                history.redo.retain(|e| e.model.id() != id);
            }
            None => {
                history.undo.clear();
                history.redo.clear();
            }
        }
    }
}
