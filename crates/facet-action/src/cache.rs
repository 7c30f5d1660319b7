//! Per-model derived artifacts.
//!
//! A [`Cache`] holds at most one artifact per [`ModelId`]. It is owned by the
//! action that produces the artifact and read by any action that needs it.
//!
//! # Operations
//!
//! | Operation | Blocks | Effect |
//! |-----------|--------|--------|
//! | [`lock`](Cache::lock) | never | handle to the artifact, or `None` if absent or refreshing |
//! | [`refresh`](Cache::refresh) | only for the swap | compute outside the lock, then install |
//! | [`purge`](Cache::purge) | only for the swap | evict; an in-flight refresh becomes stale |
//! | [`remove`](Cache::remove) | only for the swap | evict and forget the model once no refresh runs |
//!
//! # Staleness
//!
//! Every purge bumps the slot's generation. A refresh remembers the
//! generation it started from and drops its result if a purge happened
//! while it was computing, so an artifact computed from pre-purge data is
//! never installed.
//!
//! ```text
//! refresh ──compute────────────────────► swap? gen changed → discard
//!                 purge ─► gen += 1
//! ```
//!
//! A [`CacheHandle`] keeps its artifact alive on its own; a purge while a
//! handle is held evicts the entry for later readers without invalidating
//! the handle.

use crate::error::CacheError;
use facet_types::ModelId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

struct Slot<A> {
    artifact: RwLock<Option<Arc<A>>>,
    generation: AtomicU64,
    refreshing: AtomicUsize,
}

impl<A> Default for Slot<A> {
    fn default() -> Self {
        Self {
            artifact: RwLock::new(None),
            generation: AtomicU64::new(0),
            refreshing: AtomicUsize::new(0),
        }
    }
}

/// Marks a slot as refreshing for as long as it lives, including unwinding.
struct RefreshGuard<'a>(&'a AtomicUsize);

impl<'a> RefreshGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Keyed store of one artifact per model.
pub struct Cache<A> {
    name: String,
    slots: RwLock<HashMap<ModelId, Arc<Slot<A>>>>,
}

impl<A: Send + Sync> Cache<A> {
    /// Creates an empty cache. `name` appears in logs and errors.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn slot(&self, model: ModelId) -> Option<Arc<Slot<A>>> {
        self.slots.read().get(&model).cloned()
    }

    fn slot_or_insert(&self, model: ModelId) -> Arc<Slot<A>> {
        if let Some(slot) = self.slot(model) {
            return slot;
        }
        Arc::clone(self.slots.write().entry(model).or_default())
    }

    /// Returns a handle to the artifact for `model` without blocking.
    ///
    /// `None` when the entry is absent, a refresh is running, or the entry
    /// is being swapped at this instant.
    #[must_use]
    pub fn lock(&self, model: ModelId) -> Option<CacheHandle<A>> {
        let slot = self.slot(model)?;
        if slot.refreshing.load(Ordering::Acquire) > 0 {
            return None;
        }
        let guard = slot.artifact.try_read()?;
        let artifact = Arc::clone((*guard).as_ref()?);
        Some(CacheHandle { model, artifact })
    }

    /// Releases a handle. Equivalent to dropping it.
    pub fn release(&self, handle: CacheHandle<A>) {
        drop(handle);
    }

    /// Recomputes the artifact for `model`.
    ///
    /// `compute` runs without any cache lock held; only the final swap takes
    /// the write lock. Safe to call from a worker.
    ///
    /// Returns `Ok(true)` if the new artifact was installed and `Ok(false)`
    /// if a purge made it stale.
    ///
    /// # Errors
    ///
    /// Propagates the compute error. The previous artifact is left in place.
    pub fn refresh<F>(&self, model: ModelId, compute: F) -> Result<bool, CacheError>
    where
        F: FnOnce() -> Result<A, CacheError>,
    {
        let slot = self.slot_or_insert(model);
        let started_at = slot.generation.load(Ordering::Acquire);

        {
            let _refreshing = RefreshGuard::enter(&slot.refreshing);
            let artifact = compute()?;

            let mut current = slot.artifact.write();
            if slot.generation.load(Ordering::Acquire) != started_at {
                tracing::debug!(cache = %self.name, model = %model, "refresh discarded, purged meanwhile");
                return Ok(false);
            }
            *current = Some(Arc::new(artifact));
        }

        tracing::debug!(cache = %self.name, model = %model, "cache refreshed");
        Ok(true)
    }

    /// Evicts the artifact for `model`. Returns `true` if one was present.
    pub fn purge(&self, model: ModelId) -> bool {
        let Some(slot) = self.slot(model) else {
            return false;
        };
        let mut current = slot.artifact.write();
        slot.generation.fetch_add(1, Ordering::AcqRel);
        let evicted = current.take().is_some();
        if evicted {
            tracing::debug!(cache = %self.name, model = %model, "cache purged");
        }
        evicted
    }

    /// Evicts the artifact for `model` and drops its slot, for models that
    /// are gone for good. Returns `true` if an artifact was present.
    ///
    /// A slot with a refresh in progress is only purged; its stale result is
    /// discarded as usual and the slot goes with the next `remove`.
    pub fn remove(&self, model: ModelId) -> bool {
        let mut slots = self.slots.write();
        let Some(slot) = slots.get(&model).cloned() else {
            return false;
        };
        let evicted = {
            let mut current = slot.artifact.write();
            slot.generation.fetch_add(1, Ordering::AcqRel);
            current.take().is_some()
        };
        if slot.refreshing.load(Ordering::Acquire) == 0 {
            slots.remove(&model);
            tracing::debug!(cache = %self.name, model = %model, "cache slot removed");
        }
        evicted
    }

    /// Number of models the cache keeps a slot for.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evicts every model's artifact.
    pub fn purge_all(&self) {
        let models: Vec<ModelId> = self.slots.read().keys().copied().collect();
        for model in models {
            self.purge(model);
        }
    }

    /// Returns `true` if an artifact is present for `model`.
    #[must_use]
    pub fn contains(&self, model: ModelId) -> bool {
        self.slot(model)
            .is_some_and(|slot| slot.artifact.read().is_some())
    }

    /// Returns `true` while a refresh for `model` is computing.
    #[must_use]
    pub fn is_refreshing(&self, model: ModelId) -> bool {
        self.slot(model)
            .is_some_and(|slot| slot.refreshing.load(Ordering::Acquire) > 0)
    }
}

impl<A> fmt::Debug for Cache<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.name)
            .field("models", &self.slots.read().len())
            .finish()
    }
}

/// Shared read access to one cached artifact. Released on drop.
pub struct CacheHandle<A> {
    model: ModelId,
    artifact: Arc<A>,
}

impl<A> CacheHandle<A> {
    #[must_use]
    pub fn model_id(&self) -> ModelId {
        self.model
    }

    /// Returns the shared artifact.
    #[must_use]
    pub fn artifact(&self) -> &Arc<A> {
        &self.artifact
    }
}

impl<A> Deref for CacheHandle<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.artifact
    }
}

impl<A: fmt::Debug> fmt::Debug for CacheHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHandle")
            .field("model", &self.model)
            .field("artifact", &self.artifact)
            .finish()
    }
}
