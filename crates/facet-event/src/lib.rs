//! Event tags for facet.
//!
//! An [`Event`] names one kind of state change ("the mesh changed", "a model
//! was selected"). Actions never exchange single events: everything that
//! flows between them is an [`EventSet`], an unordered duplicate-free
//! composition of events.
//!
//! # Where Event Sets Flow
//!
//! ```text
//! Action::do_after_action() ──► EventSet ──► ActionManager::broadcast()
//!                                                  │
//!                    ┌─────────────────────────────┼──────────────────────┐
//!                    ▼                             ▼                      ▼
//!          purge_events ∩ E ≠ ∅          refresh_events ∩ E ≠ ∅   trigger_events ∩ E ≠ ∅
//!          (evict caches)                (recompute state)        (auto-invoke)
//! ```
//!
//! # Usage
//!
//! ```
//! use facet_event::{Event, EventSet};
//!
//! let produced = EventSet::from(Event::MeshChange) | Event::LandmarksChange;
//! let purge_on = EventSet::of(&[Event::MeshChange, Event::AffineChange]);
//!
//! assert!(produced.contains(Event::MeshChange));
//! assert!(produced.intersects(purge_on));
//! assert_eq!(produced.to_string(), "MeshChange|LandmarksChange");
//! ```

mod error;
mod event;
mod set;

pub use error::EventError;
pub use event::Event;
pub use set::EventSet;
