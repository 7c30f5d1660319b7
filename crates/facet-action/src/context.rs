//! Explicit application context.
//!
//! Everything an action may touch besides its own caches lives here and is
//! passed in by reference: open models, the undo history, the busy
//! indicator, per-model job counts and the status sink. The context is shared as
//! `Arc<AppContext>` between the coordinating thread and workers.

use facet_model::{ModelRegistry, UndoStack};
use facet_types::ModelId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Receiver for short user-facing status messages.
pub trait StatusSink: Send + Sync {
    /// Shows a message.
    fn message(&self, text: &str);

    /// Clears the current message.
    fn clear(&self) {}
}

/// Status sink that forwards to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn message(&self, text: &str) {
        tracing::info!(target: "facet::status", "{text}");
    }
}

/// Application-wide busy indicator.
///
/// Reference counted over active user-initiated asynchronous jobs: busy
/// while at least one [`BusyToken`] is alive.
#[derive(Debug, Clone, Default)]
pub struct BusyIndicator {
    active: Arc<AtomicUsize>,
}

impl BusyIndicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count. The returned token decrements it on drop.
    #[must_use = "the indicator drops back as soon as the token is dropped"]
    pub fn acquire(&self) -> BusyToken {
        if self.active.fetch_add(1, Ordering::AcqRel) == 0 {
            tracing::debug!("busy");
        }
        BusyToken {
            active: Arc::clone(&self.active),
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.count() > 0
    }

    /// Number of live tokens.
    #[must_use]
    pub fn count(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

/// Keeps the [`BusyIndicator`] raised while alive.
#[derive(Debug)]
pub struct BusyToken {
    active: Arc<AtomicUsize>,
}

impl Drop for BusyToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            tracing::debug!("idle");
        }
    }
}

/// Asynchronous jobs in flight, counted per model.
///
/// Undo and redo consult this: restoring a model while a job that captured
/// or reads it is still pending would break the history.
#[derive(Debug, Clone, Default)]
pub struct ModelJobs {
    active: Arc<Mutex<HashMap<ModelId, usize>>>,
}

impl ModelJobs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one job on `model` until the returned token is dropped.
    #[must_use = "the job stops counting as soon as the token is dropped"]
    pub fn enter(&self, model: ModelId) -> ModelJobToken {
        *self.active.lock().entry(model).or_insert(0) += 1;
        ModelJobToken {
            active: Arc::clone(&self.active),
            model,
        }
    }

    /// Returns `true` while at least one job on `model` is in flight.
    #[must_use]
    pub fn is_active(&self, model: ModelId) -> bool {
        self.count(model) > 0
    }

    #[must_use]
    pub fn count(&self, model: ModelId) -> usize {
        self.active.lock().get(&model).copied().unwrap_or(0)
    }
}

/// Keeps one job counted against its model while alive.
#[derive(Debug)]
pub struct ModelJobToken {
    active: Arc<Mutex<HashMap<ModelId, usize>>>,
    model: ModelId,
}

impl ModelJobToken {
    #[must_use]
    pub fn model_id(&self) -> ModelId {
        self.model
    }
}

impl Drop for ModelJobToken {
    fn drop(&mut self) {
        let mut active = self.active.lock();
        if let Some(n) = active.get_mut(&self.model) {
            *n -= 1;
            if *n == 0 {
                active.remove(&self.model);
            }
        }
    }
}

/// Shared state handed to every action.
pub struct AppContext {
    models: ModelRegistry,
    undo: Arc<UndoStack>,
    busy: BusyIndicator,
    jobs: ModelJobs,
    status: Arc<dyn StatusSink>,
}

impl AppContext {
    /// Creates a context with an empty registry, a default undo stack and a
    /// tracing status sink.
    #[must_use]
    pub fn new() -> Self {
        Self::with_undo(UndoStack::new())
    }

    /// Creates a context around a configured undo stack.
    #[must_use]
    pub fn with_undo(undo: UndoStack) -> Self {
        Self {
            models: ModelRegistry::new(),
            undo: Arc::new(undo),
            busy: BusyIndicator::new(),
            jobs: ModelJobs::new(),
            status: Arc::new(TracingStatus),
        }
    }

    /// Replaces the status sink.
    #[must_use]
    pub fn with_status(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    #[must_use]
    pub fn undo(&self) -> &Arc<UndoStack> {
        &self.undo
    }

    #[must_use]
    pub fn busy(&self) -> &BusyIndicator {
        &self.busy
    }

    #[must_use]
    pub fn jobs(&self) -> &ModelJobs {
        &self.jobs
    }

    #[must_use]
    pub fn status(&self) -> &dyn StatusSink {
        self.status.as_ref()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("models", &self.models.len())
            .field("undo", &self.undo.len())
            .field("busy", &self.busy.count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_is_reference_counted() {
        let busy = BusyIndicator::new();
        assert!(!busy.is_busy());

        let a = busy.acquire();
        let b = busy.acquire();
        assert_eq!(busy.count(), 2);

        drop(a);
        assert!(busy.is_busy());
        drop(b);
        assert!(!busy.is_busy());
    }

    #[test]
    fn busy_clones_share_count() {
        let busy = BusyIndicator::new();
        let clone = busy.clone();
        let _token = clone.acquire();
        assert!(busy.is_busy());
    }

    #[test]
    fn model_jobs_count_per_model() {
        let jobs = ModelJobs::new();
        let (a, b) = (ModelId::new(), ModelId::new());

        let first = jobs.enter(a);
        let second = jobs.enter(a);
        assert_eq!(jobs.count(a), 2);
        assert!(!jobs.is_active(b));

        drop(first);
        assert!(jobs.is_active(a));
        drop(second);
        assert!(!jobs.is_active(a));
        assert!(jobs.active.lock().is_empty());
    }

    #[test]
    fn context_defaults() {
        let app = AppContext::new();
        assert!(app.models().is_empty());
        assert!(!app.undo().can_undo());
        assert!(!app.busy().is_busy());
        assert!(!app.jobs().is_active(ModelId::new()));
        app.status().message("ready");
    }
}
