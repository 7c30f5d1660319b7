//! The action manager: registry, lifecycle driver and event propagation.
//!
//! # Propagation
//!
//! Whenever an action finishes with a non-empty [`EventSet`] `E` for model
//! `m` (or unscoped), the manager processes one *pass*:
//!
//! ```text
//! E ──► 1. purge    every action with purge_events ∩ E ≠ ∅ evicts its caches for m
//!   ──► 2. refresh  every action with refresh_events ∩ E ≠ ∅ recomputes enabled/checked
//!   ──► 3. trigger  every action with trigger_events ∩ E ≠ ∅ not yet run in this wave
//!                   runs its full lifecycle with E; what it returns feeds back here
//! ```
//!
//! All purges complete before any refresh, and all refreshes before any
//! trigger. Triggered actions run in registration order.
//!
//! # Threading
//!
//! The manager lives on the coordinating thread. Synchronous bodies run
//! inline; asynchronous bodies go to the [`WorkerPool`] and their
//! completions are drained by [`pump`](ActionManager::pump), which never
//! blocks. [`wait_idle`](ActionManager::wait_idle) blocks up to a timeout
//! and exists for shutdown and tests.
//!
//! An asynchronous action runs at most once per model at a time. A user
//! invocation that hits a running (action, model) pair is answered with
//! [`InvokeOutcome::Busy`]; a cascade is queued in its wave and dispatched
//! when the running job completes, so a trigger is never lost. Undo and
//! redo are refused while a job on the entry's model is in flight.

use crate::builtin::{RedoAction, UndoAction};
use crate::config::FacetConfig;
use crate::error::ManagerError;
use crate::wave::{InvokeOutcome, Wave, WaveId, WaveReport};
use crate::worker::{Completion, Job, WorkerPool};
use facet_action::{
    lifecycle, Action, ActionOutcome, ActionPhase, ActionSpec, ActionState, AppContext, Invocation,
};
use facet_event::{Event, EventSet};
use facet_model::{ModelResource, UndoOutcome, UndoStack};
use facet_types::{ActionId, ModelId};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

struct Slot {
    action: Arc<dyn Action>,
    state: ActionState,
    /// Jobs in flight, per invocation model.
    running: HashMap<Option<ModelId>, usize>,
}

impl Slot {
    fn is_running(&self, model: Option<ModelId>) -> bool {
        self.running.contains_key(&model)
    }

    fn start(&mut self, model: Option<ModelId>) {
        *self.running.entry(model).or_insert(0) += 1;
        self.state.busy = true;
    }

    fn stop(&mut self, model: Option<ModelId>) {
        if let Some(n) = self.running.get_mut(&model) {
            *n -= 1;
            if *n == 0 {
                self.running.remove(&model);
            }
        }
        self.state.busy = !self.running.is_empty();
    }
}

/// A cascade invocation waiting for its action to finish on the same model.
struct Deferred {
    wave: WaveId,
    idx: usize,
    inv: Invocation,
}

/// Owns the registered actions and drives them.
pub struct ActionManager {
    app: Arc<AppContext>,
    slots: Vec<Slot>,
    index: HashMap<ActionId, usize>,
    pool: WorkerPool,
    max_passes: usize,
    last_wave: WaveId,
    waves: HashMap<WaveId, Wave>,
    deferred: VecDeque<Deferred>,
    reports: Vec<WaveReport>,
}

impl ActionManager {
    /// Creates a manager around an existing context.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Runtime`] if the worker pool cannot start.
    pub fn new(app: Arc<AppContext>, config: &FacetConfig) -> Result<Self, ManagerError> {
        Ok(Self {
            app,
            slots: Vec::new(),
            index: HashMap::new(),
            pool: WorkerPool::new(&config.workers)?,
            max_passes: config.propagation.max_passes.max(1),
            last_wave: WaveId::new(0),
            waves: HashMap::new(),
            deferred: VecDeque::new(),
            reports: Vec::new(),
        })
    }

    /// Creates a manager and a fresh context sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Runtime`] if the worker pool cannot start.
    pub fn from_config(config: &FacetConfig) -> Result<Self, ManagerError> {
        let app = AppContext::with_undo(UndoStack::with_max_entries(config.undo.max_entries));
        Self::new(Arc::new(app), config)
    }

    #[must_use]
    pub fn app(&self) -> &Arc<AppContext> {
        &self.app
    }

    // === Registry ===

    /// Registers an action for the rest of the session.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::DuplicateAction`] if the id is taken.
    pub fn register(&mut self, action: Arc<dyn Action>) -> Result<(), ManagerError> {
        let id = action.spec().id().clone();
        if self.index.contains_key(&id) {
            return Err(ManagerError::DuplicateAction(id.to_string()));
        }
        debug!(action = %id, "action registered");
        self.index.insert(id, self.slots.len());
        self.slots.push(Slot {
            action,
            state: ActionState::default(),
            running: HashMap::new(),
        });
        let query = self.query(EventSet::empty());
        self.refresh_slot(self.slots.len() - 1, &query);
        Ok(())
    }

    /// Registers the built-in `undo` and `redo` actions.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::DuplicateAction`] if either id is taken.
    pub fn register_builtins(&mut self) -> Result<(), ManagerError> {
        self.register(Arc::new(UndoAction::new()))?;
        self.register(Arc::new(RedoAction::new()))
    }

    fn index_of(&self, name: &str) -> Result<usize, ManagerError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| ManagerError::UnknownAction(name.to_string()))
    }

    /// Observable state of an action.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<ActionState> {
        self.index.get(name).map(|&i| self.slots[i].state)
    }

    /// Static configuration of an action.
    #[must_use]
    pub fn spec(&self, name: &str) -> Option<&ActionSpec> {
        self.index.get(name).map(|&i| self.slots[i].action.spec())
    }

    /// Current user-facing label of an action.
    #[must_use]
    pub fn label(&self, name: &str) -> Option<String> {
        self.index
            .get(name)
            .map(|&i| self.slots[i].action.label(&self.app))
    }

    /// Every registered action with its state, in registration order.
    pub fn actions(&self) -> impl Iterator<Item = (&ActionSpec, ActionState)> + '_ {
        self.slots.iter().map(|s| (s.action.spec(), s.state))
    }

    // === Invocation ===

    /// Runs an action's lifecycle as a new wave.
    ///
    /// An invocation without a model gets the selected model. Synchronous
    /// actions finish (including their cascade) before this returns;
    /// asynchronous ones return [`InvokeOutcome::Dispatched`], or
    /// [`InvokeOutcome::Busy`] while already running for the same model.
    ///
    /// # Errors
    ///
    /// [`ManagerError::UnknownAction`] for an unregistered name, or
    /// [`ManagerError::PassLimitExceeded`] if the cascade does not settle.
    pub fn invoke(
        &mut self,
        name: &str,
        mut inv: Invocation,
    ) -> Result<InvokeOutcome, ManagerError> {
        let idx = self.index_of(name)?;
        if inv.model.is_none() {
            inv.model = self.app.models().selected_id();
        }

        let id = self.slots[idx].action.spec().id().clone();
        let wave = self.begin_wave(Some(id.clone()));
        if let Some(w) = self.wave_mut(wave) {
            w.guard.enter(&id);
        }

        let result = self.run_lifecycle(wave, idx, inv);
        self.settle(wave);
        result
    }

    /// Broadcasts `events` for `model` as a new wave, e.g. after a user gesture.
    ///
    /// # Errors
    ///
    /// [`ManagerError::PassLimitExceeded`] if the cascade does not settle.
    pub fn broadcast(&mut self, events: EventSet, model: Option<ModelId>) -> Result<(), ManagerError> {
        let wave = self.begin_wave(None);
        let result = self.broadcast_in_wave(wave, events, model);
        self.settle(wave);
        result
    }

    /// Recomputes enabled/checked for every action.
    pub fn refresh_all(&mut self) {
        let query = self.query(EventSet::empty());
        for idx in 0..self.slots.len() {
            self.refresh_slot(idx, &query);
        }
    }

    fn run_lifecycle(
        &mut self,
        wave: WaveId,
        idx: usize,
        inv: Invocation,
    ) -> Result<InvokeOutcome, ManagerError> {
        let action = Arc::clone(&self.slots[idx].action);
        let id = action.spec().id().clone();
        let is_async = action.spec().is_async();

        if is_async && self.slots[idx].is_running(inv.model) {
            if inv.is_user() {
                debug!(action = %id, wave = %wave, model = ?inv.model, "already running");
                return Ok(InvokeOutcome::Busy);
            }
            let Some(w) = self.wave_mut(wave) else {
                return Ok(InvokeOutcome::Busy);
            };
            w.pending += 1;
            debug!(action = %id, wave = %wave, model = ?inv.model, "already running, queued");
            self.deferred.push_back(Deferred { wave, idx, inv });
            return Ok(InvokeOutcome::Queued);
        }

        self.set_phase(idx, ActionPhase::Checking);
        if !action.is_allowed(&self.app, &inv) {
            debug!(action = %id, wave = %wave, "not allowed");
            self.set_phase(idx, ActionPhase::Idle);
            return Ok(InvokeOutcome::NotAllowed);
        }

        self.set_phase(idx, ActionPhase::Preparing);
        if !action.do_before_action(&self.app, &inv) {
            debug!(action = %id, wave = %wave, "cancelled before action");
            self.set_phase(idx, ActionPhase::Idle);
            return Ok(InvokeOutcome::Cancelled);
        }

        if let Err(e) = lifecycle::capture_undo(action.as_ref(), &self.app, &inv) {
            warn!(action = %id, error = %e, "undo capture failed, change will not be undoable");
        }

        self.set_phase(idx, ActionPhase::Executing);
        if is_async {
            self.slots[idx].start(inv.model);
            let busy = inv.is_user().then(|| self.app.busy().acquire());
            let model_job = inv.model.map(|m| self.app.jobs().enter(m));
            let job = self.pool.submit(Job {
                action_id: id.clone(),
                action,
                app: Arc::clone(&self.app),
                invocation: inv,
                wave,
                busy,
                model_job,
            });
            if let Some(w) = self.wave_mut(wave) {
                w.pending += 1;
            }
            debug!(action = %id, wave = %wave, job, "dispatched");
            // Undo/redo availability depends on jobs in flight.
            self.refresh_all();
            return Ok(InvokeOutcome::Dispatched);
        }

        let outcome = lifecycle::execute(action.as_ref(), &self.app, &inv);
        let events = self.finish(wave, idx, &inv, &outcome)?;
        Ok(InvokeOutcome::Completed(events))
    }

    /// Runs `do_after_action` and propagates its events.
    fn finish(
        &mut self,
        wave: WaveId,
        idx: usize,
        inv: &Invocation,
        outcome: &ActionOutcome,
    ) -> Result<EventSet, ManagerError> {
        let action = Arc::clone(&self.slots[idx].action);

        self.set_phase(idx, ActionPhase::Finishing);
        let events = action.do_after_action(&self.app, inv, outcome);
        let scope = action.broadcast_model(inv);
        self.set_phase(idx, ActionPhase::Idle);

        debug!(
            action = %action.spec().id(),
            wave = %wave,
            success = outcome.is_success(),
            events = %events,
            "action finished"
        );
        self.broadcast_in_wave(wave, events, scope)?;
        Ok(events)
    }

    fn broadcast_in_wave(
        &mut self,
        wave: WaveId,
        events: EventSet,
        model: Option<ModelId>,
    ) -> Result<(), ManagerError> {
        if events.is_empty() {
            return Ok(());
        }

        let limit = self.max_passes;
        {
            let Some(w) = self.wave_mut(wave) else {
                return Ok(());
            };
            if w.aborted {
                debug!(wave = %wave, events = %events, "wave aborted, broadcast dropped");
                return Ok(());
            }
            w.passes += 1;
            w.events |= events;
            if w.passes > limit {
                w.aborted = true;
                warn!(wave = %wave, limit, "propagation pass limit exceeded");
                return Err(ManagerError::PassLimitExceeded { wave, limit });
            }
        }
        debug!(wave = %wave, events = %events, model = ?model, "broadcast");

        // 1. purge
        let targets = match model {
            Some(m) => vec![m],
            None => self.app.models().ids(),
        };
        for slot in &self.slots {
            if slot.action.spec().purge_events().intersects(events) {
                for m in &targets {
                    trace!(action = %slot.action.spec().id(), model = %m, "purge");
                    slot.action.purge(*m);
                }
            }
        }

        // 2. refresh
        let query = Invocation::cascade(events, model.or_else(|| self.app.models().selected_id()));
        for idx in 0..self.slots.len() {
            if self.slots[idx]
                .action
                .spec()
                .refresh_events()
                .intersects(events)
            {
                self.refresh_slot(idx, &query);
            }
        }

        // 3. trigger
        let matching: Vec<usize> = (0..self.slots.len())
            .filter(|&i| self.slots[i].action.spec().trigger_events().intersects(events))
            .collect();
        let mut to_run = Vec::with_capacity(matching.len());
        for idx in matching {
            let id = self.slots[idx].action.spec().id().clone();
            if self.wave_mut(wave).is_some_and(|w| w.guard.enter(&id)) {
                to_run.push(idx);
            } else {
                trace!(action = %id, wave = %wave, "already invoked in this wave");
            }
        }
        for idx in to_run {
            let outcome = self.run_lifecycle(wave, idx, Invocation::cascade(events, model))?;
            trace!(wave = %wave, ?outcome, "triggered");
        }

        Ok(())
    }

    fn refresh_slot(&mut self, idx: usize, query: &Invocation) {
        let action = Arc::clone(&self.slots[idx].action);
        let enabled = action.check_enable(&self.app, query);
        let checked = action.spec().is_checkable() && action.check_state(&self.app, query);
        let state = &mut self.slots[idx].state;
        state.enabled = enabled;
        state.checked = checked;
    }

    fn set_phase(&mut self, idx: usize, phase: ActionPhase) {
        self.slots[idx].state.phase = phase;
    }

    fn query(&self, events: EventSet) -> Invocation {
        Invocation::cascade(events, self.app.models().selected_id())
    }

    // === Waves ===

    fn begin_wave(&mut self, origin: Option<ActionId>) -> WaveId {
        self.last_wave = self.last_wave.next();
        let id = self.last_wave;
        trace!(wave = %id, origin = ?origin, "wave started");
        self.waves.insert(id, Wave::new(origin));
        id
    }

    fn wave_mut(&mut self, id: WaveId) -> Option<&mut Wave> {
        let wave = self.waves.get_mut(&id);
        debug_assert!(wave.is_some(), "{id} is not open");
        if wave.is_none() {
            warn!(wave = %id, "bookkeeping for an unknown wave");
        }
        wave
    }

    /// Closes the wave if none of its jobs is outstanding.
    fn settle(&mut self, id: WaveId) {
        if self.waves.get(&id).is_some_and(|w| w.pending == 0) {
            if let Some(wave) = self.waves.remove(&id) {
                let report = wave.into_report(id);
                debug!(
                    wave = %id,
                    invoked = report.invoked.len(),
                    broadcasts = report.broadcasts,
                    aborted = report.aborted,
                    "wave finished"
                );
                self.reports.push(report);
            }
        }
    }

    /// Takes the reports of waves finished since the last call.
    pub fn take_reports(&mut self) -> Vec<WaveReport> {
        std::mem::take(&mut self.reports)
    }

    // === Completions ===

    /// Processes every completion that has already arrived. Never blocks.
    ///
    /// Returns the number of completions processed.
    ///
    /// # Errors
    ///
    /// The first propagation error among the processed completions. All
    /// available completions are processed regardless.
    pub fn pump(&mut self) -> Result<usize, ManagerError> {
        let mut processed = 0;
        let mut first_err = None;
        while let Some(completion) = self.pool.try_next() {
            processed += 1;
            if let Err(e) = self.complete(completion) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(processed), Err)
    }

    /// Processes completions until no job is in flight or `timeout` passes.
    ///
    /// # Errors
    ///
    /// [`ManagerError::WaitTimeout`] if jobs are still running at the
    /// deadline, otherwise the first propagation error.
    pub fn wait_idle(&mut self, timeout: Duration) -> Result<(), ManagerError> {
        let deadline = Instant::now() + timeout;
        let mut first_err = None;
        while self.pool.in_flight() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ManagerError::WaitTimeout {
                    pending: self.pool.in_flight(),
                });
            }
            if let Some(completion) = self.pool.next_timeout(remaining) {
                if let Err(e) = self.complete(completion) {
                    first_err.get_or_insert(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// `true` when no asynchronous job is outstanding or queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pool.in_flight() == 0 && self.deferred.is_empty()
    }

    fn complete(&mut self, completion: Completion) -> Result<(), ManagerError> {
        let Completion {
            job,
            action_id,
            invocation,
            wave,
            outcome,
            busy,
            model_job,
        } = completion;

        let Some(&idx) = self.index.get(&action_id) else {
            warn!(action = %action_id, job, "completion for unregistered action");
            return Ok(());
        };
        self.slots[idx].stop(invocation.model);
        if let Some(w) = self.waves.get_mut(&wave) {
            w.pending = w.pending.saturating_sub(1);
        }
        drop(model_job);
        // Undo/redo availability depends on jobs in flight.
        self.refresh_all();

        let result = self.finish(wave, idx, &invocation, &outcome);
        drop(busy);
        let resumed = self.resume_deferred(idx, invocation.model);
        self.settle(wave);
        result.and(resumed)
    }

    /// Dispatches cascades that waited for `idx` to finish on `model`.
    fn resume_deferred(&mut self, idx: usize, model: Option<ModelId>) -> Result<(), ManagerError> {
        let mut first_err = None;
        while !self.slots[idx].is_running(model) {
            let Some(pos) = self
                .deferred
                .iter()
                .position(|d| d.idx == idx && d.inv.model == model)
            else {
                break;
            };
            let Some(Deferred { wave, inv, .. }) = self.deferred.remove(pos) else {
                break;
            };
            let aborted = match self.waves.get_mut(&wave) {
                Some(w) => {
                    w.pending = w.pending.saturating_sub(1);
                    w.aborted
                }
                None => true,
            };
            if aborted {
                debug!(wave = %wave, "queued invocation dropped with its wave");
            } else {
                debug!(action = %self.slots[idx].action.spec().id(), wave = %wave, "resuming queued invocation");
                if let Err(e) = self.run_lifecycle(wave, idx, inv) {
                    first_err.get_or_insert(e);
                }
            }
            self.settle(wave);
        }
        first_err.map_or(Ok(()), Err)
    }

    // === Models ===

    /// Registers and selects a model, then broadcasts `LoadedModel | ModelSelect`.
    ///
    /// # Errors
    ///
    /// Propagation errors from the broadcast.
    pub fn open_model(&mut self, model: ModelResource) -> Result<Arc<ModelResource>, ManagerError> {
        let model = self.app.models().insert(model);
        self.app.models().select(Some(model.id()));
        self.broadcast(Event::LoadedModel | Event::ModelSelect, Some(model.id()))?;
        Ok(model)
    }

    /// Closes a model: drops its undo history, has every action forget it,
    /// removes it, then broadcasts `ClosedModel | ModelSelect`.
    ///
    /// # Errors
    ///
    /// [`ManagerError::UnknownModel`] if it is not open.
    pub fn close_model(&mut self, id: ModelId) -> Result<(), ManagerError> {
        if self.app.models().get(id).is_none() {
            return Err(ManagerError::UnknownModel(id));
        }
        self.app.undo().clear(Some(id));
        for slot in &self.slots {
            slot.action.forget(id);
        }
        self.app.models().remove(id);
        self.broadcast(Event::ClosedModel | Event::ModelSelect, Some(id))
    }

    /// Selects an open model and broadcasts `ModelSelect`.
    ///
    /// # Errors
    ///
    /// [`ManagerError::UnknownModel`] if it is not open.
    pub fn select_model(&mut self, id: ModelId) -> Result<(), ManagerError> {
        if !self.app.models().select(Some(id)) {
            return Err(ManagerError::UnknownModel(id));
        }
        self.broadcast(EventSet::from(Event::ModelSelect), Some(id))
    }

    // === Undo ===

    /// Undoes the last change and broadcasts its events plus `RestoreChange`.
    ///
    /// # Errors
    ///
    /// [`ManagerError::ModelBusy`] while a job on the entry's model is in
    /// flight; [`ManagerError::Undo`] on an empty stack or failed restore.
    pub fn undo(&mut self) -> Result<UndoOutcome, ManagerError> {
        self.ensure_settled(self.app.undo().undo_model())?;
        let outcome = self.app.undo().undo()?;
        self.broadcast(outcome.events | Event::RestoreChange, Some(outcome.model))?;
        Ok(outcome)
    }

    /// Redoes the last undone change and broadcasts like [`undo`](Self::undo).
    ///
    /// # Errors
    ///
    /// [`ManagerError::ModelBusy`] while a job on the entry's model is in
    /// flight; [`ManagerError::Undo`] on an empty redo stack or failed restore.
    pub fn redo(&mut self) -> Result<UndoOutcome, ManagerError> {
        self.ensure_settled(self.app.undo().redo_model())?;
        let outcome = self.app.undo().redo()?;
        self.broadcast(outcome.events | Event::RestoreChange, Some(outcome.model))?;
        Ok(outcome)
    }

    fn ensure_settled(&self, model: Option<ModelId>) -> Result<(), ManagerError> {
        match model {
            Some(m) if self.app.jobs().is_active(m) => {
                debug!(model = %m, "history step refused, job in flight");
                Err(ManagerError::ModelBusy(m))
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for ActionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionManager")
            .field("actions", &self.slots.len())
            .field("open_waves", &self.waves.len())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_action::ActionError;
    use facet_model::{ModelSnapshot, SnapshotError, Snapshottable};
    use parking_lot::Mutex;

    struct Blank;

    impl Snapshottable for Blank {
        fn snapshot(&self) -> Result<ModelSnapshot, SnapshotError> {
            Ok(ModelSnapshot::empty("blank"))
        }

        fn restore(&mut self, snapshot: &ModelSnapshot) -> Result<(), SnapshotError> {
            snapshot.validate("blank")
        }
    }

    /// Sync action that logs each run and returns fixed events.
    struct Emit {
        spec: ActionSpec,
        emits: EventSet,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Action for Emit {
        fn spec(&self) -> &ActionSpec {
            &self.spec
        }

        fn do_action(&self, _app: &AppContext, _inv: &Invocation) -> Result<(), ActionError> {
            self.log.lock().push(self.spec.id().to_string());
            Ok(())
        }

        fn do_after_action(&self, _: &AppContext, _: &Invocation, _: &ActionOutcome) -> EventSet {
            self.emits
        }
    }

    fn emit(
        name: &str,
        trigger: EventSet,
        emits: EventSet,
        log: &Arc<Mutex<Vec<String>>>,
    ) -> Arc<dyn Action> {
        Arc::new(Emit {
            spec: ActionSpec::new(name).trigger_on(trigger),
            emits,
            log: Arc::clone(log),
        })
    }

    fn manager() -> ActionManager {
        ActionManager::from_config(&FacetConfig::default()).expect("manager")
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let log = Arc::default();
        let mut mgr = manager();
        mgr.register(emit("a", EventSet::empty(), EventSet::empty(), &log))
            .expect("first");
        let err = mgr
            .register(emit("a", EventSet::empty(), EventSet::empty(), &log))
            .expect_err("second");
        assert!(matches!(err, ManagerError::DuplicateAction(ref n) if n == "a"));
    }

    #[test]
    fn unknown_action_is_an_error() {
        let mut mgr = manager();
        assert!(matches!(
            mgr.invoke("nope", Invocation::user()),
            Err(ManagerError::UnknownAction(_))
        ));
    }

    #[test]
    fn originator_is_not_retriggered() {
        let log = Arc::default();
        let mut mgr = manager();
        let mesh = EventSet::from(Event::MeshChange);
        mgr.register(emit("self_loop", mesh, mesh, &log)).expect("register");

        let outcome = mgr.invoke("self_loop", Invocation::user()).expect("invoke");
        assert_eq!(outcome, InvokeOutcome::Completed(mesh));
        assert_eq!(log.lock().as_slice(), ["self_loop"]);
    }

    #[test]
    fn ping_pong_runs_each_once() {
        let log = Arc::default();
        let mut mgr = manager();
        let mesh = EventSet::from(Event::MeshChange);
        let lm = EventSet::from(Event::LandmarksChange);
        mgr.register(emit("ping", lm, mesh, &log)).expect("register");
        mgr.register(emit("pong", mesh, lm, &log)).expect("register");

        mgr.invoke("ping", Invocation::user()).expect("invoke");
        assert_eq!(log.lock().as_slice(), ["ping", "pong"]);

        let reports = mgr.take_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].invoked.len(), 2);
        assert_eq!(reports[0].broadcasts, 2);
    }

    #[test]
    fn pass_limit_stops_runaway_wave() {
        let log = Arc::default();
        let mut config = FacetConfig::default();
        config.propagation.max_passes = 2;
        let mut mgr = ActionManager::from_config(&config).expect("manager");

        let e = |ev| EventSet::from(ev);
        mgr.register(emit("a", EventSet::empty(), e(Event::MeshChange), &log)).expect("a");
        mgr.register(emit("b", e(Event::MeshChange), e(Event::LandmarksChange), &log)).expect("b");
        mgr.register(emit("c", e(Event::LandmarksChange), e(Event::AffineChange), &log)).expect("c");
        mgr.register(emit("d", e(Event::AffineChange), e(Event::MaskChange), &log)).expect("d");

        let err = mgr.invoke("a", Invocation::user()).expect_err("limit");
        assert!(matches!(err, ManagerError::PassLimitExceeded { limit: 2, .. }));
        assert!(!log.lock().contains(&"d".to_string()));

        let reports = mgr.take_reports();
        assert!(reports[0].aborted);
    }

    #[test]
    fn empty_events_do_not_cascade() {
        let log = Arc::default();
        let mut mgr = manager();
        mgr.register(emit("quiet", EventSet::empty(), EventSet::empty(), &log)).expect("quiet");
        mgr.register(emit("listener", EventSet::ALL, EventSet::empty(), &log)).expect("listener");

        mgr.invoke("quiet", Invocation::user()).expect("invoke");
        assert_eq!(log.lock().as_slice(), ["quiet"]);
    }

    #[test]
    fn invocation_defaults_to_selected_model() {
        struct Probe {
            spec: ActionSpec,
            seen: Mutex<Option<ModelId>>,
        }

        impl Action for Probe {
            fn spec(&self) -> &ActionSpec {
                &self.spec
            }

            fn do_action(&self, _app: &AppContext, inv: &Invocation) -> Result<(), ActionError> {
                *self.seen.lock() = inv.model;
                Ok(())
            }
        }

        let mut mgr = manager();
        let query = Arc::new(Probe {
            spec: ActionSpec::new("query"),
            seen: Mutex::new(None),
        });
        mgr.register(query.clone()).expect("register");

        let id = ModelId::new();
        let registry = mgr.app().models();
        registry.insert(ModelResource::with_id(id, "m", Blank));
        registry.select(Some(id));

        mgr.invoke("query", Invocation::user()).expect("invoke");
        assert_eq!(*query.seen.lock(), Some(id));
    }
}
