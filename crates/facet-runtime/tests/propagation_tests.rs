//! Integration tests for event propagation through the ActionManager.

mod common;

use common::{manager, manager_with, mesh_of, Curvature, Mesh, Messages, Recorder};
use facet_action::{Action, ActionError, ActionSpec, AppContext, Invocation};
use facet_event::{Event, EventSet};
use facet_model::{ModelResource, UndoStack};
use facet_runtime::config::FacetConfig;
use facet_runtime::{ActionManager, InvokeOutcome, ManagerError};
use parking_lot::Mutex;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

fn mesh_events() -> EventSet {
    EventSet::from(Event::MeshChange)
}

// =============================================================================
// Ordering
// =============================================================================

mod ordering {
    use super::*;

    #[test]
    fn purge_then_refresh_then_trigger() {
        let log: Log = Arc::default();
        let mut mgr = manager();
        mgr.open_model(ModelResource::new("scan", Mesh::sample()))
            .expect("open");

        // Registered in reverse of the expected order on purpose.
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("t").trigger_on(Event::MeshChange),
            EventSet::empty(),
            &log,
        )))
        .expect("t");
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("r").refresh_on(Event::MeshChange),
            EventSet::empty(),
            &log,
        )))
        .expect("r");
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("p").purge_on(Event::MeshChange),
            EventSet::empty(),
            &log,
        )))
        .expect("p");
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("edit"),
            mesh_events(),
            &log,
        )))
        .expect("edit");
        log.lock().clear();

        let outcome = mgr.invoke("edit", Invocation::user()).expect("invoke");
        assert_eq!(outcome, InvokeOutcome::Completed(mesh_events()));
        assert_eq!(
            log.lock().as_slice(),
            ["run:edit", "purge:p", "refresh:r", "run:t"]
        );
    }

    /// Reads the curvature cache when the mesh changes.
    struct Peek {
        spec: ActionSpec,
        curvature: Arc<Curvature>,
        seen: Mutex<Vec<Option<Vec<f64>>>>,
    }

    impl Action for Peek {
        fn spec(&self) -> &ActionSpec {
            &self.spec
        }

        fn do_action(&self, _app: &AppContext, inv: &Invocation) -> Result<(), ActionError> {
            let model = inv.model.ok_or(ActionError::NoModel)?;
            let artifact = self.curvature.cache.lock(model).map(|h| (*h).clone());
            self.seen.lock().push(artifact);
            Ok(())
        }
    }

    fn peek(name: &str, curvature: &Arc<Curvature>) -> Arc<Peek> {
        Arc::new(Peek {
            spec: ActionSpec::new(name).trigger_on(Event::MeshChange),
            curvature: Arc::clone(curvature),
            seen: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn readers_never_see_a_purged_artifact() {
        let mut mgr = manager();
        let curvature = Arc::new(Curvature::new());
        let before = peek("before", &curvature);
        let after = peek("after", &curvature);
        mgr.register(before.clone()).expect("before");
        mgr.register(curvature.clone()).expect("curvature");
        mgr.register(after.clone()).expect("after");

        let model = mgr
            .open_model(ModelResource::new("scan", Mesh::sample()))
            .expect("open");
        mgr.broadcast(mesh_events(), Some(model.id())).expect("first");
        let stale = curvature.cache.lock(model.id()).expect("cached");
        before.seen.lock().clear();
        after.seen.lock().clear();

        {
            let mut guard = model.write();
            let mesh = guard.downcast_mut::<Mesh>().expect("mesh");
            for n in &mut mesh.normals {
                n[2] = 0.5;
            }
        }
        mgr.broadcast(mesh_events(), Some(model.id())).expect("second");

        // Purged before anything ran: the early reader finds nothing.
        assert_eq!(before.seen.lock().as_slice(), [None]);
        // The late reader sees the recomputed artifact, never the stale one.
        let fresh = after.seen.lock()[0].clone().expect("refreshed");
        assert_eq!(fresh, vec![0.5, 0.5, 0.5]);
        assert_ne!(fresh, *stale);
        assert_eq!(curvature.purged(), 1);
    }

    #[test]
    fn triggered_actions_run_in_registration_order() {
        let log: Log = Arc::default();
        let mut mgr = manager();
        for name in ["first", "second", "third"] {
            mgr.register(Arc::new(Recorder::new(
                ActionSpec::new(name).trigger_on(Event::LandmarksChange),
                EventSet::empty(),
                &log,
            )))
            .expect("register");
        }

        mgr.broadcast(EventSet::from(Event::LandmarksChange), None)
            .expect("broadcast");
        assert_eq!(
            log.lock().as_slice(),
            ["run:first", "run:second", "run:third"]
        );
    }

    #[test]
    fn unscoped_broadcast_purges_every_open_model() {
        let log: Log = Arc::default();
        let mut mgr = manager();
        mgr.open_model(ModelResource::new("a", Mesh::sample())).expect("a");
        mgr.open_model(ModelResource::new("b", Mesh::sample())).expect("b");
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("p").purge_on(Event::MaskChange),
            EventSet::empty(),
            &log,
        )))
        .expect("p");

        mgr.broadcast(EventSet::from(Event::MaskChange), None)
            .expect("broadcast");
        assert_eq!(log.lock().as_slice(), ["purge:p", "purge:p"]);
    }
}

// =============================================================================
// Cycles and bounds
// =============================================================================

mod cycles {
    use super::*;

    #[test]
    fn each_action_runs_once_per_wave() {
        let log: Log = Arc::default();
        let mut mgr = manager();
        // a → Mesh → b → Landmarks → {a, c}; c → Mesh → {b}
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("a").trigger_on(Event::LandmarksChange),
            mesh_events(),
            &log,
        )))
        .expect("a");
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("b").trigger_on(Event::MeshChange),
            EventSet::from(Event::LandmarksChange),
            &log,
        )))
        .expect("b");
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("c").trigger_on(Event::LandmarksChange),
            mesh_events(),
            &log,
        )))
        .expect("c");

        mgr.invoke("a", Invocation::user()).expect("invoke");
        assert_eq!(log.lock().as_slice(), ["run:a", "run:b", "run:c"]);

        let report = mgr.take_reports().pop().expect("report");
        assert_eq!(report.count("a"), 1);
        assert_eq!(report.count("b"), 1);
        assert_eq!(report.count("c"), 1);
        assert!(!report.aborted);
    }

    #[test]
    fn next_wave_may_run_the_same_actions_again() {
        let log: Log = Arc::default();
        let mut mgr = manager();
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("edit"),
            mesh_events(),
            &log,
        )))
        .expect("edit");
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("follow").trigger_on(Event::MeshChange),
            EventSet::empty(),
            &log,
        )))
        .expect("follow");

        mgr.invoke("edit", Invocation::user()).expect("first");
        mgr.invoke("edit", Invocation::user()).expect("second");
        assert_eq!(
            log.lock().as_slice(),
            ["run:edit", "run:follow", "run:edit", "run:follow"]
        );
        assert_eq!(mgr.take_reports().len(), 2);
    }

    #[test]
    fn pass_limit_is_an_error() {
        let log: Log = Arc::default();
        let mut config = FacetConfig::default();
        config.propagation.max_passes = 1;
        let mut mgr = manager_with(&config);
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("edit"),
            mesh_events(),
            &log,
        )))
        .expect("edit");
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("follow").trigger_on(Event::MeshChange),
            EventSet::from(Event::AffineChange),
            &log,
        )))
        .expect("follow");

        let err = mgr.invoke("edit", Invocation::user()).expect_err("limit");
        assert!(matches!(
            err,
            ManagerError::PassLimitExceeded { limit: 1, .. }
        ));
        assert!(mgr.take_reports().pop().expect("report").aborted);
    }
}

// =============================================================================
// Lifecycle outcomes
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn failure_reports_and_broadcasts_nothing() {
        let log: Log = Arc::default();
        let messages = Arc::new(Messages::default());
        let app = AppContext::new().with_status(messages.clone());
        let mut mgr =
            ActionManager::new(Arc::new(app), &FacetConfig::default()).expect("manager");
        mgr.register(Arc::new(
            Recorder::new(ActionSpec::new("broken"), mesh_events(), &log).failing(),
        ))
        .expect("broken");
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("follow").trigger_on(Event::MeshChange),
            EventSet::empty(),
            &log,
        )))
        .expect("follow");

        let outcome = mgr.invoke("broken", Invocation::user()).expect("invoke");
        assert_eq!(outcome, InvokeOutcome::Completed(EventSet::empty()));
        assert_eq!(log.lock().as_slice(), ["run:broken"]);
        assert_eq!(messages.0.lock().len(), 1);
        assert!(messages.0.lock()[0].contains("told to fail"));
    }

    #[test]
    fn not_allowed_is_silent() {
        let mut mgr = manager();
        let curvature = Arc::new(Curvature::new());
        mgr.register(curvature.clone()).expect("register");

        // No model open, so curvature declines.
        let outcome = mgr.invoke("curvature", Invocation::user()).expect("invoke");
        assert_eq!(outcome, InvokeOutcome::NotAllowed);
        assert_eq!(curvature.computed(), 0);
    }
}

// =============================================================================
// Models and undo
// =============================================================================

mod models {
    use super::*;

    #[test]
    fn close_model_purges_and_drops_history() {
        let mut mgr = ActionManager::new(
            Arc::new(AppContext::with_undo(UndoStack::with_max_entries(8))),
            &FacetConfig::default(),
        )
        .expect("manager");
        let curvature = Arc::new(Curvature::new());
        mgr.register(curvature.clone()).expect("register");

        let model = mgr
            .open_model(ModelResource::new("scan", Mesh::sample()))
            .expect("open");
        mgr.app()
            .undo()
            .capture(&model, "Edit", mesh_events())
            .expect("capture");
        mgr.broadcast(mesh_events(), Some(model.id())).expect("broadcast");
        assert!(curvature.cache.contains(model.id()));

        assert_eq!(curvature.cache.len(), 1);

        mgr.close_model(model.id()).expect("close");
        assert!(!curvature.cache.contains(model.id()));
        assert!(curvature.cache.is_empty());
        assert_eq!(curvature.purged(), 1);
        assert!(!mgr.app().undo().can_undo());
        assert!(mgr.app().models().is_empty());
        assert!(matches!(
            mgr.close_model(model.id()),
            Err(ManagerError::UnknownModel(_))
        ));
    }

    #[test]
    fn select_unknown_model_fails() {
        let mut mgr = manager();
        let stray = ModelResource::new("stray", Mesh::sample());
        assert!(matches!(
            mgr.select_model(stray.id()),
            Err(ManagerError::UnknownModel(_))
        ));
    }

    #[test]
    fn undo_broadcasts_restore_change_for_its_model() {
        let log: Log = Arc::default();
        let mut mgr = manager();
        mgr.register_builtins().expect("builtins");
        mgr.register(Arc::new(Recorder::new(
            ActionSpec::new("on_restore").trigger_on(Event::RestoreChange),
            EventSet::empty(),
            &log,
        )))
        .expect("listener");

        let first = mgr
            .open_model(ModelResource::new("first", Mesh::sample()))
            .expect("first");
        mgr.app()
            .undo()
            .capture(&first, "Edit", mesh_events())
            .expect("capture");
        {
            let mut guard = first.write();
            guard.downcast_mut::<Mesh>().expect("mesh").normals.clear();
        }
        // Undo targets the entry's model even with another one selected.
        mgr.open_model(ModelResource::new("second", Mesh::sample()))
            .expect("second");
        mgr.refresh_all();
        assert!(mgr.state("undo").expect("undo").enabled);
        assert_eq!(mgr.label("undo").as_deref(), Some("Undo Edit"));

        let outcome = mgr.invoke("undo", Invocation::user()).expect("undo");
        assert_eq!(
            outcome,
            InvokeOutcome::Completed(Event::MeshChange | Event::RestoreChange)
        );
        assert_eq!(mesh_of(&first), Mesh::sample());
        assert_eq!(log.lock().as_slice(), ["run:on_restore"]);
        assert!(!mgr.state("undo").expect("undo").enabled);
        assert!(mgr.state("redo").expect("redo").enabled);
    }
}
