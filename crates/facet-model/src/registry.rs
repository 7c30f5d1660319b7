//! Open models and the current selection.

use crate::resource::ModelResource;
use facet_types::ModelId;
use parking_lot::RwLock;
use std::sync::Arc;

/// The set of open models, in open order, plus which one is selected.
///
/// Shared through the application context. Removing the selected model
/// clears the selection.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RwLock<Vec<Arc<ModelResource>>>,
    selected: RwLock<Option<ModelId>>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model and returns the shared handle.
    ///
    /// A model whose id is already registered replaces the old entry.
    pub fn insert(&self, model: ModelResource) -> Arc<ModelResource> {
        self.insert_arc(Arc::new(model))
    }

    /// Adds an already shared model.
    pub fn insert_arc(&self, model: Arc<ModelResource>) -> Arc<ModelResource> {
        let mut models = self.models.write();
        models.retain(|m| m.id() != model.id());
        models.push(Arc::clone(&model));
        tracing::debug!(model = %model.id(), name = model.name(), "model registered");
        model
    }

    /// Looks up a model by id.
    #[must_use]
    pub fn get(&self, id: ModelId) -> Option<Arc<ModelResource>> {
        self.models.read().iter().find(|m| m.id() == id).cloned()
    }

    /// Removes a model. Clears the selection if it pointed at `id`.
    pub fn remove(&self, id: ModelId) -> Option<Arc<ModelResource>> {
        let removed = {
            let mut models = self.models.write();
            let pos = models.iter().position(|m| m.id() == id)?;
            models.remove(pos)
        };
        let mut selected = self.selected.write();
        if *selected == Some(id) {
            *selected = None;
        }
        tracing::debug!(model = %id, "model removed");
        Some(removed)
    }

    /// Returns the ids of all open models, in open order.
    #[must_use]
    pub fn ids(&self) -> Vec<ModelId> {
        self.models.read().iter().map(|m| m.id()).collect()
    }

    /// Returns every open model, in open order.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<ModelResource>> {
        self.models.read().clone()
    }

    /// Returns the number of open models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    /// Returns `true` if no model is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// Selects a model, or clears the selection with `None`.
    ///
    /// Returns `false` (and leaves the selection alone) if `id` is not open.
    pub fn select(&self, id: Option<ModelId>) -> bool {
        if let Some(id) = id {
            if self.get(id).is_none() {
                return false;
            }
        }
        *self.selected.write() = id;
        true
    }

    /// Returns the selected model id.
    #[must_use]
    pub fn selected_id(&self) -> Option<ModelId> {
        *self.selected.read()
    }

    /// Returns the selected model.
    #[must_use]
    pub fn selected(&self) -> Option<Arc<ModelResource>> {
        self.selected_id().and_then(|id| self.get(id))
    }
}
