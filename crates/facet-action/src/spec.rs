//! Static per-action configuration.

use facet_event::EventSet;
use facet_types::ActionId;

/// Configuration fixed when an action is constructed.
///
/// | Field | Meaning |
/// |-------|---------|
/// | `trigger_events` | auto-invoke when any of these is broadcast |
/// | `refresh_events` | recompute enabled/checked on these |
/// | `purge_events` | evict this action's caches on these |
/// | `is_async` | run `do_action` on a worker |
/// | `checkable` | has a checked state |
/// | `undo_events` | capture an undo snapshot before `do_action`, broadcast these when undone |
///
/// # Example
///
/// ```
/// use facet_action::ActionSpec;
/// use facet_event::{Event, EventSet};
///
/// let spec = ActionSpec::new("invert_normals")
///     .display_name("Invert Normals")
///     .tooltip("Flip every face normal")
///     .purge_on(Event::MeshChange)
///     .asynchronous()
///     .undoable(EventSet::from(Event::MeshChange));
///
/// assert!(spec.is_async());
/// assert!(spec.purge_events().contains(Event::MeshChange));
/// assert_eq!(spec.undo_events(), Some(EventSet::from(Event::MeshChange)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    id: ActionId,
    display_name: String,
    tooltip: String,
    trigger_events: EventSet,
    refresh_events: EventSet,
    purge_events: EventSet,
    is_async: bool,
    checkable: bool,
    undo_events: Option<EventSet>,
}

impl ActionSpec {
    /// Creates a spec with no events, synchronous, not checkable, not undoable.
    ///
    /// The display name defaults to the id.
    #[must_use]
    pub fn new(id: impl Into<ActionId>) -> Self {
        let id = id.into();
        Self {
            display_name: id.as_str().to_string(),
            id,
            tooltip: String::new(),
            trigger_events: EventSet::empty(),
            refresh_events: EventSet::empty(),
            purge_events: EventSet::empty(),
            is_async: false,
            checkable: false,
            undo_events: None,
        }
    }

    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    #[must_use]
    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    /// Adds trigger events.
    #[must_use]
    pub fn trigger_on(mut self, events: impl Into<EventSet>) -> Self {
        self.trigger_events |= events.into();
        self
    }

    /// Adds refresh events.
    #[must_use]
    pub fn refresh_on(mut self, events: impl Into<EventSet>) -> Self {
        self.refresh_events |= events.into();
        self
    }

    /// Adds purge events.
    #[must_use]
    pub fn purge_on(mut self, events: impl Into<EventSet>) -> Self {
        self.purge_events |= events.into();
        self
    }

    /// Runs `do_action` on a worker.
    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    #[must_use]
    pub fn checkable(mut self) -> Self {
        self.checkable = true;
        self
    }

    /// Captures an undo snapshot of the invocation's model before `do_action`.
    /// `events` is broadcast when the entry is undone or redone.
    #[must_use]
    pub fn undoable(mut self, events: impl Into<EventSet>) -> Self {
        self.undo_events = Some(events.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &ActionId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn tooltip_text(&self) -> &str {
        &self.tooltip
    }

    #[must_use]
    pub fn trigger_events(&self) -> EventSet {
        self.trigger_events
    }

    #[must_use]
    pub fn refresh_events(&self) -> EventSet {
        self.refresh_events
    }

    #[must_use]
    pub fn purge_events(&self) -> EventSet {
        self.purge_events
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    #[must_use]
    pub fn is_checkable(&self) -> bool {
        self.checkable
    }

    #[must_use]
    pub fn undo_events(&self) -> Option<EventSet> {
        self.undo_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_event::Event;

    #[test]
    fn defaults() {
        let spec = ActionSpec::new("curvature");
        assert_eq!(spec.id().as_str(), "curvature");
        assert_eq!(spec.name(), "curvature");
        assert!(spec.trigger_events().is_empty());
        assert!(!spec.is_async());
        assert!(!spec.is_checkable());
        assert!(spec.undo_events().is_none());
    }

    #[test]
    fn event_builders_accumulate() {
        let spec = ActionSpec::new("a")
            .trigger_on(Event::MeshChange)
            .trigger_on(Event::LandmarksChange | Event::AffineChange)
            .refresh_on(EventSet::ALL);

        assert_eq!(spec.trigger_events().len(), 3);
        assert!(spec.refresh_events().contains(Event::User));
    }
}
