//! Identifier types.
//!
//! Models are identified by a random UUID that stays stable for as long as
//! the model is open. Actions are identified by their registered name.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use uuid::Uuid;

/// Stable handle of one open model.
///
/// Every `ModelResource` carries exactly one `ModelId`; caches and undo
/// entries are keyed by it.
///
/// # Example
///
/// ```
/// use facet_types::ModelId;
///
/// let a = ModelId::new();
/// let b = ModelId::new();
/// assert_ne!(a, b);
/// let copy = a;
/// assert_eq!(a, copy);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelId(pub Uuid);

impl ModelId {
    /// Creates a new [`ModelId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "model:{}", self.0)
    }
}

/// Registered name of an action.
///
/// Names are unique within one `ActionManager`; they double as the lookup
/// key the presentation layer uses to invoke an action.
///
/// # Example
///
/// ```
/// use facet_types::ActionId;
///
/// let id = ActionId::new("undo");
/// assert_eq!(id.to_string(), "undo");
/// assert_eq!(id, ActionId::from("undo"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(String);

impl ActionId {
    /// Creates an id from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ActionId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for ActionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
