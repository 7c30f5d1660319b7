//! Composable event sets.
//!
//! An [`EventSet`] is a bit set over [`Event`]. Union, intersection and
//! membership are constant time; order and duplicates are irrelevant by
//! construction.

use crate::{Event, EventError};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    struct Flags: u32 {
        const MESH_CHANGE      = 1 << 0;
        const LANDMARKS_CHANGE = 1 << 1;
        const AFFINE_CHANGE    = 1 << 2;
        const MASK_CHANGE      = 1 << 3;
        const PATHS_CHANGE     = 1 << 4;
        const METRICS_CHANGE   = 1 << 5;
        const MODEL_SELECT     = 1 << 6;
        const LOADED_MODEL     = 1 << 7;
        const CLOSED_MODEL     = 1 << 8;
        const SAVED_MODEL      = 1 << 9;
        const VIEW_CHANGE      = 1 << 10;
        const CAMERA_CHANGE    = 1 << 11;
        const CACHE            = 1 << 12;
        const RESTORE_CHANGE   = 1 << 13;
        const ACT_CANCELLED    = 1 << 14;
        const ACT_COMPLETE     = 1 << 15;
        const USER             = 1 << 16;
        const ALL_VIEWS        = 1 << 17;
        const ALL_VIEWERS      = 1 << 18;
    }
}

impl Flags {
    fn of(event: Event) -> Self {
        match event {
            Event::None => Self::empty(),
            Event::MeshChange => Self::MESH_CHANGE,
            Event::LandmarksChange => Self::LANDMARKS_CHANGE,
            Event::AffineChange => Self::AFFINE_CHANGE,
            Event::MaskChange => Self::MASK_CHANGE,
            Event::PathsChange => Self::PATHS_CHANGE,
            Event::MetricsChange => Self::METRICS_CHANGE,
            Event::ModelSelect => Self::MODEL_SELECT,
            Event::LoadedModel => Self::LOADED_MODEL,
            Event::ClosedModel => Self::CLOSED_MODEL,
            Event::SavedModel => Self::SAVED_MODEL,
            Event::ViewChange => Self::VIEW_CHANGE,
            Event::CameraChange => Self::CAMERA_CHANGE,
            Event::Cache => Self::CACHE,
            Event::RestoreChange => Self::RESTORE_CHANGE,
            Event::ActCancelled => Self::ACT_CANCELLED,
            Event::ActComplete => Self::ACT_COMPLETE,
            Event::User => Self::USER,
            Event::AllViews => Self::ALL_VIEWS,
            Event::AllViewers => Self::ALL_VIEWERS,
        }
    }
}

/// Unordered, duplicate-free set of [`Event`]s.
///
/// This is the unit every action produces and every propagation step
/// consumes. It is `Copy` and cheap to pass around.
///
/// # Laws
///
/// - `a.union(b) == b.union(a)`
/// - `a.union(b).union(c) == a.union(b.union(c))`
/// - `a.union(b).contains(e) == a.contains(e) || b.contains(e)`
/// - `a.intersects(b) == b.intersects(a)`
///
/// # Example
///
/// ```
/// use facet_event::{Event, EventSet};
///
/// let a = EventSet::from(Event::MeshChange);
/// let b = EventSet::of(&[Event::LandmarksChange, Event::MeshChange]);
///
/// assert_eq!(a.union(b), b);
/// assert!(a.intersects(b));
/// assert!(!EventSet::empty().intersects(b));
/// assert_eq!(EventSet::from(Event::None), EventSet::empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Event>", into = "Vec<Event>")]
pub struct EventSet(Flags);

impl EventSet {
    /// Every event.
    pub const ALL: Self = Self(Flags::all());

    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Flags::empty())
    }

    /// Builds a set from a slice of events.
    #[must_use]
    pub fn of(events: &[Event]) -> Self {
        events.iter().copied().collect()
    }

    /// Returns the union of both sets.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0.union(other.0))
    }

    /// Returns the events present in both sets.
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        Self(self.0.intersection(other.0))
    }

    /// Returns the events of `self` that are not in `other`.
    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        Self(self.0.difference(other.0))
    }

    /// Returns `true` if `event` is a member.
    ///
    /// [`Event::None`] is never a member of any set.
    #[must_use]
    pub fn contains(self, event: Event) -> bool {
        let flag = Flags::of(event);
        !flag.is_empty() && self.0.contains(flag)
    }

    /// Returns `true` if every member of `other` is a member of `self`.
    #[must_use]
    pub fn contains_all(self, other: Self) -> bool {
        self.0.contains(other.0)
    }

    /// Returns `true` if the sets share at least one event.
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        self.0.intersects(other.0)
    }

    /// Returns `true` if no event is a member.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of member events.
    #[must_use]
    pub fn len(self) -> usize {
        self.0.bits().count_ones() as usize
    }

    /// Iterates over the members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Event> {
        Event::ALL.into_iter().filter(move |e| self.contains(*e))
    }

    /// Returns the member names in declaration order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(Event::name).collect()
    }

    /// Parses a `|` or `,` separated list of event names.
    ///
    /// Whitespace around names is ignored; an empty string or `None`
    /// yields the empty set.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownEvent`] for the first unrecognised name.
    ///
    /// # Example
    ///
    /// ```
    /// use facet_event::{Event, EventSet};
    ///
    /// let set = EventSet::parse("MeshChange | landmarks_change").unwrap();
    /// assert_eq!(set, EventSet::of(&[Event::MeshChange, Event::LandmarksChange]));
    /// assert!(EventSet::parse("").unwrap().is_empty());
    /// ```
    pub fn parse(list: &str) -> Result<Self, EventError> {
        list.split(['|', ','])
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Event::parse)
            .collect()
    }
}

impl From<Event> for EventSet {
    fn from(event: Event) -> Self {
        Self(Flags::of(event))
    }
}

impl From<Vec<Event>> for EventSet {
    fn from(events: Vec<Event>) -> Self {
        events.into_iter().collect()
    }
}

impl From<EventSet> for Vec<Event> {
    fn from(set: EventSet) -> Self {
        set.iter().collect()
    }
}

impl FromIterator<Event> for EventSet {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |acc, e| acc.union(Self::from(e)))
    }
}

impl BitOr for EventSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOr<Event> for EventSet {
    type Output = Self;

    fn bitor(self, rhs: Event) -> Self {
        self.union(Self::from(rhs))
    }
}

impl BitOr for Event {
    type Output = EventSet;

    fn bitor(self, rhs: Self) -> EventSet {
        EventSet::from(self).union(EventSet::from(rhs))
    }
}

impl BitOrAssign for EventSet {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl BitOrAssign<Event> for EventSet {
    fn bitor_assign(&mut self, rhs: Event) {
        *self = self.union(Self::from(rhs));
    }
}

impl BitAnd for EventSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl std::fmt::Display for EventSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "None")
        } else {
            write!(f, "{}", self.names().join("|"))
        }
    }
}
