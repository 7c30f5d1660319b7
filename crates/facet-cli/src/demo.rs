//! Demo scan model and the actions the CLI registers over it.

use facet_action::{
    Action, ActionError, ActionOutcome, ActionSpec, AppContext, Cache, CacheError, Invocation,
};
use facet_event::{Event, EventSet};
use facet_model::{ModelSnapshot, SnapshotError, Snapshottable};
use facet_types::ModelId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const SCAN_KIND: &str = "scan";

/// A tiny triangulated face scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub vertices: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    pub offset: [f64; 3],
}

impl Scan {
    /// A unit-square patch bent into a shallow dome.
    pub fn sample() -> Self {
        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                let (x, y) = (f64::from(i) / 3.0 - 0.5, f64::from(j) / 3.0 - 0.5);
                let z = 0.25 - (x * x + y * y) * 0.5;
                vertices.push([x, y, z]);
                let len = (x * x + y * y + 1.0).sqrt();
                normals.push([x / len, y / len, 1.0 / len]);
            }
        }
        Self {
            vertices,
            normals,
            offset: [0.0; 3],
        }
    }

    /// `true` while normals point away from the origin on average.
    pub fn outward(&self) -> bool {
        self.normals.iter().map(|n| n[2]).sum::<f64>() > 0.0
    }
}

impl Snapshottable for Scan {
    fn snapshot(&self) -> Result<ModelSnapshot, SnapshotError> {
        ModelSnapshot::from_state(SCAN_KIND, self)
    }

    fn restore(&mut self, snapshot: &ModelSnapshot) -> Result<(), SnapshotError> {
        snapshot.validate(SCAN_KIND)?;
        *self = snapshot.to_state()?;
        Ok(())
    }
}

fn not_a_scan() -> ActionError {
    ActionError::UnexpectedState("model is not a scan".into())
}

// ─── invert_normals ─────────────────────────────────────────────

/// Flips every normal. Asynchronous and undoable.
pub struct InvertNormals {
    spec: ActionSpec,
    work: Duration,
}

impl InvertNormals {
    pub fn new(work: Duration) -> Self {
        Self {
            spec: ActionSpec::new("invert_normals")
                .display_name("Invert Normals")
                .tooltip("Flip the orientation of every surface normal")
                .refresh_on(Event::LoadedModel | Event::ClosedModel | Event::ModelSelect)
                .asynchronous()
                .undoable(Event::MeshChange),
            work,
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
        std::thread::sleep(self.work);
        let scan = guard.downcast_mut::<Scan>().ok_or_else(not_a_scan)?;
        for n in &mut scan.normals {
            for c in n.iter_mut() {
                *c = -*c;
            }
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
            None => EventSet::from(Event::MeshChange),
            Some(e) => {
                app.status().message(&format!("Invert normals failed: {e}"));
                EventSet::empty()
            }
        }
    }

    fn check_enable(&self, app: &AppContext, _inv: &Invocation) -> bool {
        app.models().selected().is_some()
    }
}

// ─── curvature ──────────────────────────────────────────────────

/// Mean curvature estimate per vertex.
pub type CurvatureMap = Vec<f64>;

/// Keeps a curvature estimate per scan; recomputed whenever the mesh changes.
pub struct Curvature {
    spec: ActionSpec,
    cache: Cache<CurvatureMap>,
}

impl Curvature {
    pub fn new() -> Self {
        Self {
            spec: ActionSpec::new("curvature")
                .display_name("Curvature")
                .trigger_on(Event::MeshChange | Event::LoadedModel)
                .purge_on(Event::MeshChange | Event::ClosedModel),
            cache: Cache::new("curvature"),
        }
    }

    pub fn cache(&self) -> &Cache<CurvatureMap> {
        &self.cache
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
            let guard = model.read();
            let scan = guard
                .downcast_ref::<Scan>()
                .ok_or_else(|| CacheError::ComputeFailed {
                    cache: "curvature".into(),
                    reason: "model is not a scan".into(),
                })?;
            Ok(scan
                .vertices
                .iter()
                .zip(&scan.normals)
                .map(|(v, n)| v[0] * n[0] + v[1] * n[1] + v[2] * n[2])
                .collect())
        })?;
        Ok(())
    }

    fn do_after_action(&self, _: &AppContext, _: &Invocation, outcome: &ActionOutcome) -> EventSet {
        if outcome.is_success() {
            EventSet::from(Event::Cache)
        } else {
            EventSet::empty()
        }
    }

    fn purge(&self, model: ModelId) {
        self.cache.purge(model);
    }

    fn forget(&self, model: ModelId) {
        self.cache.remove(model);
    }
}

// ─── show_curvature ─────────────────────────────────────────────

/// Checkable toggle reflecting whether curvature is available for the
/// selected scan.
pub struct ShowCurvature {
    spec: ActionSpec,
    curvature: Arc<Curvature>,
}

impl ShowCurvature {
    pub fn new(curvature: Arc<Curvature>) -> Self {
        Self {
            spec: ActionSpec::new("show_curvature")
                .display_name("Show Curvature")
                .refresh_on(Event::Cache | Event::MeshChange | Event::ModelSelect)
                .checkable(),
            curvature,
        }
    }
}

impl Action for ShowCurvature {
    fn spec(&self) -> &ActionSpec {
        &self.spec
    }

    fn do_action(&self, _app: &AppContext, inv: &Invocation) -> Result<(), ActionError> {
        let model = inv.model.ok_or(ActionError::NoModel)?;
        let handle = self
            .curvature
            .cache()
            .lock(model)
            .ok_or_else(|| {
                ActionError::Cache(CacheError::Unavailable {
                    cache: "curvature".into(),
                    model,
                })
            })?;
        let peak = handle.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        tracing::info!(model = %model, peak, "curvature shown");
        self.curvature.cache().release(handle);
        Ok(())
    }

    fn do_after_action(
        &self,
        app: &AppContext,
        _inv: &Invocation,
        outcome: &ActionOutcome,
    ) -> EventSet {
        match outcome.error() {
            None => EventSet::from(Event::ViewChange),
            Some(e) => {
                app.status().message(&format!("Curvature not ready: {e}"));
                EventSet::empty()
            }
        }
    }

    fn check_state(&self, _app: &AppContext, inv: &Invocation) -> bool {
        inv.model
            .is_some_and(|m| self.curvature.cache().contains(m))
    }
}

// ─── translate ──────────────────────────────────────────────────

/// Moves the scan by the invocation point, or one unit along x.
pub struct Translate {
    spec: ActionSpec,
}

impl Translate {
    pub fn new() -> Self {
        Self {
            spec: ActionSpec::new("translate")
                .display_name("Translate")
                .undoable(Event::AffineChange),
        }
    }
}

impl Action for Translate {
    fn spec(&self) -> &ActionSpec {
        &self.spec
    }

    fn is_allowed(&self, _app: &AppContext, inv: &Invocation) -> bool {
        inv.model.is_some()
    }

    fn do_action(&self, app: &AppContext, inv: &Invocation) -> Result<(), ActionError> {
        let delta = inv.point.unwrap_or([1.0, 0.0, 0.0]);
        let model = inv.resolve_model(app)?;
        let mut guard = model.write();
        let scan = guard.downcast_mut::<Scan>().ok_or_else(not_a_scan)?;
        for (o, d) in scan.offset.iter_mut().zip(delta) {
            *o += d;
        }
        Ok(())
    }

    fn do_after_action(&self, _: &AppContext, _: &Invocation, outcome: &ActionOutcome) -> EventSet {
        if outcome.is_success() {
            EventSet::from(Event::AffineChange)
        } else {
            EventSet::empty()
        }
    }
}

/// Every demo action, with `show_curvature` sharing the curvature cache.
pub fn actions(work: Duration) -> Vec<Arc<dyn Action>> {
    let curvature = Arc::new(Curvature::new());
    let show = Arc::new(ShowCurvature::new(Arc::clone(&curvature)));
    vec![
        Arc::new(InvertNormals::new(work)) as Arc<dyn Action>,
        curvature,
        show,
        Arc::new(Translate::new()),
    ]
}
