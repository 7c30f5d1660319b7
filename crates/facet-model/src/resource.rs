//! Lockable model resources.
//!
//! [`ModelResource`] pairs a stable [`ModelId`] with an opaque payload behind
//! one `parking_lot::RwLock`. The lock is never handed out directly: callers
//! receive a [`ModelReadGuard`] or a [`ModelWriteGuard`], and only the write
//! guard exposes `&mut` access.
//!
//! # Acquisition
//!
//! | Method | Blocks | Returns |
//! |--------|--------|---------|
//! | [`read`](ModelResource::read) | yes | `ModelReadGuard` |
//! | [`write`](ModelResource::write) | yes | `ModelWriteGuard` |
//! | [`try_read`](ModelResource::try_read) | no | `Option<ModelReadGuard>` |
//! | [`try_write`](ModelResource::try_write) | no | `Option<ModelWriteGuard>` |
//! | [`try_read_for`](ModelResource::try_read_for) | up to timeout | `Option<ModelReadGuard>` |
//! | [`try_write_for`](ModelResource::try_write_for) | up to timeout | `Option<ModelWriteGuard>` |
//!
//! The lock is eventually fair: a waiting writer is not starved by a stream
//! of new readers.

use crate::snapshot::{ModelSnapshot, SnapshotError, Snapshottable};
use facet_types::ModelId;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Payload stored in a [`ModelResource`].
///
/// Implemented automatically for every `Snapshottable + Send + Sync + 'static`
/// type. The `as_any` accessors back the typed downcasts on the guards.
pub trait ModelState: Snapshottable + Send + Sync + 'static {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Snapshottable + Send + Sync + 'static> ModelState for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One open model: identity, display name, and its locked payload.
pub struct ModelResource {
    id: ModelId,
    name: String,
    state: RwLock<Box<dyn ModelState>>,
}

impl ModelResource {
    /// Creates a resource with a fresh [`ModelId`].
    #[must_use]
    pub fn new(name: impl Into<String>, state: impl ModelState) -> Self {
        Self::with_id(ModelId::new(), name, state)
    }

    /// Creates a resource with a given [`ModelId`].
    #[must_use]
    pub fn with_id(id: ModelId, name: impl Into<String>, state: impl ModelState) -> Self {
        Self {
            id,
            name: name.into(),
            state: RwLock::new(Box::new(state)),
        }
    }

    /// Returns the model id.
    #[must_use]
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquires shared read access, blocking while a writer holds the lock.
    pub fn read(&self) -> ModelReadGuard<'_> {
        ModelReadGuard {
            model: self.id,
            guard: self.state.read(),
        }
    }

    /// Acquires exclusive write access, blocking until all guards are released.
    pub fn write(&self) -> ModelWriteGuard<'_> {
        let guard = self.state.write();
        tracing::trace!(model = %self.id, "write lock acquired");
        ModelWriteGuard {
            model: self.id,
            guard,
        }
    }

    /// Attempts read access without blocking.
    #[must_use]
    pub fn try_read(&self) -> Option<ModelReadGuard<'_>> {
        self.state.try_read().map(|guard| ModelReadGuard {
            model: self.id,
            guard,
        })
    }

    /// Attempts write access without blocking.
    #[must_use]
    pub fn try_write(&self) -> Option<ModelWriteGuard<'_>> {
        self.state.try_write().map(|guard| ModelWriteGuard {
            model: self.id,
            guard,
        })
    }

    /// Attempts read access, waiting at most `timeout`.
    #[must_use]
    pub fn try_read_for(&self, timeout: Duration) -> Option<ModelReadGuard<'_>> {
        self.state.try_read_for(timeout).map(|guard| ModelReadGuard {
            model: self.id,
            guard,
        })
    }

    /// Attempts write access, waiting at most `timeout`.
    #[must_use]
    pub fn try_write_for(&self, timeout: Duration) -> Option<ModelWriteGuard<'_>> {
        self.state
            .try_write_for(timeout)
            .map(|guard| ModelWriteGuard {
                model: self.id,
                guard,
            })
    }

    /// Captures a snapshot under the read lock.
    ///
    /// # Errors
    ///
    /// Propagates the payload's [`SnapshotError`].
    pub fn capture(&self) -> Result<ModelSnapshot, SnapshotError> {
        self.read().snapshot()
    }

    /// Restores a snapshot under the write lock.
    ///
    /// # Errors
    ///
    /// Propagates the payload's [`SnapshotError`].
    pub fn restore(&self, snapshot: &ModelSnapshot) -> Result<(), SnapshotError> {
        self.write().restore(snapshot)
    }

    /// Swaps the current state for `snapshot` under one write lock and
    /// returns what was there before.
    ///
    /// # Errors
    ///
    /// Fails if the current state cannot be captured or the snapshot cannot
    /// be restored. On capture failure the payload is untouched.
    pub fn exchange(&self, snapshot: &ModelSnapshot) -> Result<ModelSnapshot, SnapshotError> {
        let mut guard = self.write();
        let previous = guard.snapshot()?;
        guard.restore(snapshot)?;
        Ok(previous)
    }
}

impl fmt::Debug for ModelResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelResource")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Shared read access to a model payload. Released on drop.
pub struct ModelReadGuard<'a> {
    model: ModelId,
    guard: RwLockReadGuard<'a, Box<dyn ModelState>>,
}

impl ModelReadGuard<'_> {
    /// Returns the id of the locked model.
    #[must_use]
    pub fn model_id(&self) -> ModelId {
        self.model
    }

    /// Returns the payload as `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (**self.guard).as_any().downcast_ref::<T>()
    }
}

impl Deref for ModelReadGuard<'_> {
    type Target = dyn ModelState;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

/// Exclusive write access to a model payload. Released on drop.
pub struct ModelWriteGuard<'a> {
    model: ModelId,
    guard: RwLockWriteGuard<'a, Box<dyn ModelState>>,
}

impl ModelWriteGuard<'_> {
    /// Returns the id of the locked model.
    #[must_use]
    pub fn model_id(&self) -> ModelId {
        self.model
    }

    /// Returns the payload as `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (**self.guard).as_any().downcast_ref::<T>()
    }

    /// Returns the payload as `&mut T`, if it is one.
    #[must_use]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        (**self.guard).as_any_mut().downcast_mut::<T>()
    }
}

impl Deref for ModelWriteGuard<'_> {
    type Target = dyn ModelState;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl DerefMut for ModelWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: i64,
    }

    impl Snapshottable for Counter {
        fn snapshot(&self) -> Result<ModelSnapshot, SnapshotError> {
            ModelSnapshot::from_state("counter", self)
        }

        fn restore(&mut self, snapshot: &ModelSnapshot) -> Result<(), SnapshotError> {
            snapshot.validate("counter")?;
            *self = snapshot.to_state()?;
            Ok(())
        }
    }

    #[test]
    fn readers_share() {
        let model = ModelResource::new("m", Counter { value: 1 });
        let a = model.read();
        let b = model.try_read().expect("second reader");
        assert_eq!(a.downcast_ref::<Counter>(), b.downcast_ref::<Counter>());
        assert!(model.try_write().is_none());
    }

    #[test]
    fn writer_excludes_everyone() {
        let model = ModelResource::new("m", Counter { value: 1 });
        let guard = model.write();
        assert!(model.try_read().is_none());
        assert!(model.try_write().is_none());
        assert!(model.try_read_for(Duration::from_millis(20)).is_none());
        drop(guard);
        assert!(model.try_read().is_some());
    }

    #[test]
    fn write_guard_mutates_typed_payload() {
        let model = ModelResource::new("m", Counter { value: 1 });
        {
            let mut guard = model.write();
            guard.downcast_mut::<Counter>().expect("counter").value = 7;
        }
        assert_eq!(model.read().downcast_ref::<Counter>(), Some(&Counter { value: 7 }));
    }

    #[test]
    fn wrong_downcast_is_none() {
        let model = ModelResource::new("m", Counter { value: 1 });
        assert!(model.read().downcast_ref::<String>().is_none());
    }

    #[test]
    fn exchange_returns_previous_state() {
        let model = ModelResource::new("m", Counter { value: 1 });
        let before = model.capture().expect("capture");
        model.write().downcast_mut::<Counter>().expect("counter").value = 2;

        let after = model.exchange(&before).expect("exchange");
        assert_eq!(model.read().downcast_ref::<Counter>(), Some(&Counter { value: 1 }));
        assert_eq!(after.to_state::<Counter>().expect("decode"), Counter { value: 2 });
    }

    #[test]
    fn guard_reports_model_id() {
        let model = ModelResource::new("m", Counter { value: 0 });
        assert_eq!(model.read().model_id(), model.id());
        assert_eq!(model.write().model_id(), model.id());
    }
}
