//! Propagation waves.
//!
//! A wave is all propagation caused by one originating invocation or
//! broadcast. It stays open while any of its asynchronous jobs is still
//! running, so cascades that resume on completion belong to the same wave.
//!
//! Two bounds keep a wave finite:
//!
//! - [`CycleGuard`]: each action runs at most once per wave (the originator
//!   included)
//! - a pass limit: the number of broadcasts a wave may process

use facet_event::EventSet;
use facet_types::ActionId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identifier of one wave. Monotonic per manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveId(u64);

impl WaveId {
    #[must_use]
    pub const fn new(n: u64) -> Self {
        Self(n)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for WaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wave-{}", self.0)
    }
}

/// Records which actions a wave has invoked.
///
/// # Example
///
/// ```
/// use facet_runtime::CycleGuard;
/// use facet_types::ActionId;
///
/// let mut guard = CycleGuard::default();
/// assert!(guard.enter(&ActionId::new("a")));
/// assert!(guard.enter(&ActionId::new("b")));
/// assert!(!guard.enter(&ActionId::new("a")));
/// assert_eq!(guard.order().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    seen: HashSet<ActionId>,
    order: Vec<ActionId>,
}

impl CycleGuard {
    /// Marks `id` as invoked. Returns `false` if it already was.
    pub fn enter(&mut self, id: &ActionId) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.clone());
        self.order.push(id.clone());
        true
    }

    #[must_use]
    pub fn contains(&self, id: &ActionId) -> bool {
        self.seen.contains(id)
    }

    /// Invoked actions in invocation order.
    #[must_use]
    pub fn order(&self) -> &[ActionId] {
        &self.order
    }
}

/// In-flight wave bookkeeping.
#[derive(Debug)]
pub(crate) struct Wave {
    pub(crate) origin: Option<ActionId>,
    pub(crate) guard: CycleGuard,
    pub(crate) passes: usize,
    pub(crate) events: EventSet,
    pub(crate) pending: usize,
    pub(crate) aborted: bool,
}

impl Wave {
    pub(crate) fn new(origin: Option<ActionId>) -> Self {
        Self {
            origin,
            guard: CycleGuard::default(),
            passes: 0,
            events: EventSet::empty(),
            pending: 0,
            aborted: false,
        }
    }

    pub(crate) fn into_report(self, id: WaveId) -> WaveReport {
        WaveReport {
            wave: id,
            origin: self.origin,
            invoked: self.guard.order,
            broadcasts: self.passes,
            events: self.events,
            aborted: self.aborted,
        }
    }
}

/// Summary of a finished wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveReport {
    pub wave: WaveId,
    /// Action that started the wave; `None` for plain broadcasts.
    pub origin: Option<ActionId>,
    /// Every action invoked in the wave, in order, originator first.
    pub invoked: Vec<ActionId>,
    /// Number of non-empty broadcasts processed.
    pub broadcasts: usize,
    /// Union of everything broadcast.
    pub events: EventSet,
    /// `true` if the pass limit stopped the wave.
    pub aborted: bool,
}

impl WaveReport {
    /// Returns `true` if `name` ran in this wave.
    #[must_use]
    pub fn ran(&self, name: &str) -> bool {
        self.invoked.iter().any(|id| id.as_str() == name)
    }

    /// How often `name` ran in this wave (0 or 1 unless the guard is broken).
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.invoked.iter().filter(|id| id.as_str() == name).count()
    }
}

/// Result of [`ActionManager::invoke`](crate::ActionManager::invoke).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeOutcome {
    /// `is_allowed` declined. Nothing was broadcast.
    NotAllowed,
    /// `do_before_action` declined. Nothing was broadcast.
    Cancelled,
    /// The action's asynchronous body is already running for this model.
    Busy,
    /// A cascade reached an action still running for this model; it runs
    /// once that job completes.
    Queued,
    /// The body was handed to a worker; completion arrives through `pump`.
    Dispatched,
    /// The lifecycle finished and these events were broadcast.
    Completed(EventSet),
}
