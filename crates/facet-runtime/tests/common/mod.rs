//! Shared fixtures for runtime integration tests: a small mesh model and
//! a handful of actions over it.

#![allow(dead_code)]

use facet_action::{
    Action, ActionError, ActionOutcome, ActionSpec, AppContext, Cache, CacheError, Invocation,
    StatusSink,
};
use facet_event::{Event, EventSet};
use facet_model::{ModelResource, ModelSnapshot, SnapshotError, Snapshottable};
use facet_runtime::config::FacetConfig;
use facet_runtime::ActionManager;
use facet_types::ModelId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Generous bound for `wait_idle` in tests.
pub const WAIT: Duration = Duration::from_secs(10);

// =============================================================================
// Model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
}

impl Mesh {
    pub fn sample() -> Self {
        Self {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.25]],
            normals: vec![[0.0, 0.0, 1.0], [0.1, 0.0, 0.9], [0.0, 0.3, 0.7]],
        }
    }
}

impl Snapshottable for Mesh {
    fn snapshot(&self) -> Result<ModelSnapshot, SnapshotError> {
        ModelSnapshot::from_state("mesh", self)
    }

    fn restore(&mut self, snapshot: &ModelSnapshot) -> Result<(), SnapshotError> {
        snapshot.validate("mesh")?;
        *self = snapshot.to_state()?;
        Ok(())
    }
}

pub fn mesh_of(model: &ModelResource) -> Mesh {
    model
        .read()
        .downcast_ref::<Mesh>()
        .cloned()
        .expect("model holds a mesh")
}

pub fn manager() -> ActionManager {
    ActionManager::from_config(&FacetConfig::default()).expect("manager")
}

pub fn manager_with(config: &FacetConfig) -> ActionManager {
    ActionManager::from_config(config).expect("manager")
}

// =============================================================================
// Actions
// =============================================================================

/// Flips every normal. Asynchronous and undoable; holds the write lock for
/// `delay` to simulate heavy work.
pub struct InvertNormals {
    spec: ActionSpec,
    delay: Duration,
}

impl InvertNormals {
    pub fn new(delay: Duration) -> Self {
        Self {
            spec: ActionSpec::new("invert_normals")
                .display_name("Invert Normals")
                .asynchronous()
                .undoable(Event::MeshChange),
            delay,
        }
    }
}

impl Action for InvertNormals {
    fn spec(&self) -> &ActionSpec {
        &self.spec
    }

    fn is_allowed(&self, _app: &AppContext, inv: &Invocation) -> bool {
        inv.model.is_some()
    }

    fn do_action(&self, app: &AppContext, inv: &Invocation) -> Result<(), ActionError> {
        let model = inv.resolve_model(app)?;
        let mut guard = model.write();
        std::thread::sleep(self.delay);
        let mesh = guard
            .downcast_mut::<Mesh>()
            .ok_or_else(|| ActionError::UnexpectedState("not a mesh".into()))?;
        for n in &mut mesh.normals {
            for c in n.iter_mut() {
                *c = -*c;
            }
        }
        Ok(())
    }

    fn do_after_action(&self, _: &AppContext, _: &Invocation, outcome: &ActionOutcome) -> EventSet {
        if outcome.is_success() {
            EventSet::from(Event::MeshChange)
        } else {
            EventSet::empty()
        }
    }
}

/// Per-vertex curvature estimate, recomputed whenever the mesh changes.
pub struct Curvature {
    spec: ActionSpec,
    pub cache: Cache<Vec<f64>>,
    pub computed: AtomicUsize,
    pub purged: AtomicUsize,
    delay: Duration,
}

impl Curvature {
    pub fn new() -> Self {
        Self::build(ActionSpec::new("curvature"), Duration::ZERO)
    }

    /// Asynchronous variant whose compute takes `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self::build(ActionSpec::new("curvature").asynchronous(), delay)
    }

    fn build(spec: ActionSpec, delay: Duration) -> Self {
        Self {
            spec: spec
                .trigger_on(Event::MeshChange)
                .purge_on(Event::MeshChange | Event::ClosedModel),
            cache: Cache::new("curvature"),
            computed: AtomicUsize::new(0),
            purged: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn computed(&self) -> usize {
        self.computed.load(Ordering::SeqCst)
    }

    pub fn purged(&self) -> usize {
        self.purged.load(Ordering::SeqCst)
    }
}

impl Action for Curvature {
    fn spec(&self) -> &ActionSpec {
        &self.spec
    }

    fn is_allowed(&self, _app: &AppContext, inv: &Invocation) -> bool {
        inv.model.is_some()
    }

    fn do_action(&self, app: &AppContext, inv: &Invocation) -> Result<(), ActionError> {
        let model = inv.resolve_model(app)?;
        self.cache.refresh(model.id(), || {
            std::thread::sleep(self.delay);
            let guard = model.read();
            let mesh = guard.downcast_ref::<Mesh>().ok_or_else(|| CacheError::ComputeFailed {
                cache: "curvature".into(),
                reason: "not a mesh".into(),
            })?;
            Ok(mesh.normals.iter().map(|n| n[2]).collect())
        })?;
        self.computed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn purge(&self, model: ModelId) {
        if self.cache.purge(model) {
            self.purged.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn forget(&self, model: ModelId) {
        if self.cache.remove(model) {
            self.purged.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Records every hook the manager calls into a shared log as `hook:name`.
pub struct Recorder {
    spec: ActionSpec,
    emits: EventSet,
    fail: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new(spec: ActionSpec, emits: EventSet, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            spec,
            emits,
            fail: false,
            log: Arc::clone(log),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn record(&self, hook: &str) {
        self.log.lock().push(format!("{hook}:{}", self.spec.id()));
    }
}

impl Action for Recorder {
    fn spec(&self) -> &ActionSpec {
        &self.spec
    }

    fn do_action(&self, _app: &AppContext, _inv: &Invocation) -> Result<(), ActionError> {
        self.record("run");
        if self.fail {
            return Err(ActionError::ExecutionFailed("told to fail".into()));
        }
        Ok(())
    }

    fn do_after_action(
        &self,
        app: &AppContext,
        _inv: &Invocation,
        outcome: &ActionOutcome,
    ) -> EventSet {
        match outcome.error() {
            Some(e) => {
                app.status().message(&format!("{} failed: {e}", self.spec.name()));
                EventSet::empty()
            }
            None => self.emits,
        }
    }

    fn check_enable(&self, _app: &AppContext, inv: &Invocation) -> bool {
        // Registration and refresh_all query with no events; only log broadcasts.
        if !inv.events.is_empty() {
            self.record("refresh");
        }
        true
    }

    fn purge(&self, _model: ModelId) {
        self.record("purge");
    }
}

/// Status sink that keeps every message.
#[derive(Default)]
pub struct Messages(pub Mutex<Vec<String>>);

impl StatusSink for Messages {
    fn message(&self, text: &str) {
        self.0.lock().push(text.to_string());
    }
}
