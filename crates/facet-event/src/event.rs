//! The closed set of event tags.
//!
//! | Group | Events |
//! |-------|--------|
//! | Model data | `MeshChange`, `LandmarksChange`, `AffineChange`, `MaskChange`, `PathsChange`, `MetricsChange` |
//! | Model lifecycle | `LoadedModel`, `ClosedModel`, `SavedModel`, `ModelSelect`, `RestoreChange` |
//! | View | `ViewChange`, `CameraChange`, `AllViews`, `AllViewers` |
//! | Action outcome | `ActCancelled`, `ActComplete`, `Cache`, `User` |
//!
//! `None` is the absence of change and maps to the empty [`EventSet`](crate::EventSet).
//! `AllViews` and `AllViewers` are structural markers: they widen the scope
//! of a view-related event rather than describing a change themselves.

use crate::EventError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One kind of state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// No change.
    None,
    /// Mesh geometry or topology changed.
    MeshChange,
    /// Landmark positions changed.
    LandmarksChange,
    /// The model's affine transform changed.
    AffineChange,
    /// The anthropometric mask changed.
    MaskChange,
    /// Measurement paths changed.
    PathsChange,
    /// Computed metrics changed.
    MetricsChange,
    /// The selected model changed.
    ModelSelect,
    /// A model was loaded.
    LoadedModel,
    /// A model was closed.
    ClosedModel,
    /// A model was saved.
    SavedModel,
    /// View-level visualisation changed.
    ViewChange,
    /// Camera moved.
    CameraChange,
    /// A derived cache was rebuilt.
    Cache,
    /// State was restored from the undo history.
    RestoreChange,
    /// An action was cancelled before completing.
    ActCancelled,
    /// An action completed.
    ActComplete,
    /// A user gesture occurred.
    User,
    /// Marker: applies to every view of the model.
    AllViews,
    /// Marker: applies to every viewer.
    AllViewers,
}

impl Event {
    /// Every event except [`Event::None`], in declaration order.
    pub const ALL: [Event; 19] = [
        Self::MeshChange,
        Self::LandmarksChange,
        Self::AffineChange,
        Self::MaskChange,
        Self::PathsChange,
        Self::MetricsChange,
        Self::ModelSelect,
        Self::LoadedModel,
        Self::ClosedModel,
        Self::SavedModel,
        Self::ViewChange,
        Self::CameraChange,
        Self::Cache,
        Self::RestoreChange,
        Self::ActCancelled,
        Self::ActComplete,
        Self::User,
        Self::AllViews,
        Self::AllViewers,
    ];

    /// Returns the display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::MeshChange => "MeshChange",
            Self::LandmarksChange => "LandmarksChange",
            Self::AffineChange => "AffineChange",
            Self::MaskChange => "MaskChange",
            Self::PathsChange => "PathsChange",
            Self::MetricsChange => "MetricsChange",
            Self::ModelSelect => "ModelSelect",
            Self::LoadedModel => "LoadedModel",
            Self::ClosedModel => "ClosedModel",
            Self::SavedModel => "SavedModel",
            Self::ViewChange => "ViewChange",
            Self::CameraChange => "CameraChange",
            Self::Cache => "Cache",
            Self::RestoreChange => "RestoreChange",
            Self::ActCancelled => "ActCancelled",
            Self::ActComplete => "ActComplete",
            Self::User => "User",
            Self::AllViews => "AllViews",
            Self::AllViewers => "AllViewers",
        }
    }

    /// Returns `true` for the structural markers `AllViews` and `AllViewers`.
    #[must_use]
    pub fn is_marker(self) -> bool {
        matches!(self, Self::AllViews | Self::AllViewers)
    }

    /// Parses an event name.
    ///
    /// Matching ignores case, `_` and `-`, so `MeshChange`, `mesh_change`
    /// and `MESH-CHANGE` are equivalent.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownEvent`] if no event matches.
    ///
    /// # Example
    ///
    /// ```
    /// use facet_event::Event;
    ///
    /// assert_eq!(Event::parse("mesh_change"), Ok(Event::MeshChange));
    /// assert_eq!(Event::parse("LANDMARKS-CHANGE"), Ok(Event::LandmarksChange));
    /// assert!(Event::parse("teleport").is_err());
    /// ```
    pub fn parse(name: &str) -> Result<Self, EventError> {
        let wanted = normalize(name);
        if wanted == "none" {
            return Ok(Self::None);
        }
        Self::ALL
            .into_iter()
            .find(|e| normalize(e.name()) == wanted)
            .ok_or_else(|| EventError::UnknownEvent(name.trim().to_string()))
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for Event {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_excludes_none_and_is_unique() {
        assert!(!Event::ALL.contains(&Event::None));
        let unique: HashSet<_> = Event::ALL.iter().collect();
        assert_eq!(unique.len(), Event::ALL.len());
    }

    #[test]
    fn names_round_trip_through_parse() {
        for event in Event::ALL {
            assert_eq!(Event::parse(event.name()), Ok(event));
        }
        assert_eq!(Event::parse("None"), Ok(Event::None));
    }

    #[test]
    fn parse_is_lenient_about_case_and_separators() {
        assert_eq!(Event::parse("model_select"), Ok(Event::ModelSelect));
        assert_eq!(Event::parse(" CAMERA-CHANGE "), Ok(Event::CameraChange));
        assert_eq!("allviewers".parse::<Event>(), Ok(Event::AllViewers));
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(
            Event::parse("Teleport"),
            Err(EventError::UnknownEvent("Teleport".into()))
        );
        assert!(Event::parse("").is_err());
    }

    #[test]
    fn markers() {
        assert!(Event::AllViews.is_marker());
        assert!(Event::AllViewers.is_marker());
        assert!(!Event::MeshChange.is_marker());
    }

    #[test]
    fn serde_uses_variant_names() {
        let json = serde_json::to_string(&Event::LandmarksChange).expect("serialize event");
        assert_eq!(json, r#""LandmarksChange""#);
        let back: Event = serde_json::from_str(&json).expect("deserialize event");
        assert_eq!(back, Event::LandmarksChange);
    }
}
