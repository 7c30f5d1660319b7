//! Bounded worker pool for asynchronous action bodies.
//!
//! # Flow
//!
//! ```text
//! coordinating thread                     worker runtime
//! ───────────────────                     ──────────────
//! submit(Job) ──────────────────────────► acquire permit (Semaphore)
//!                                         spawn_blocking(do_action)
//!                                         ok / error / panic
//! try_next() / next_timeout() ◄────────── Completion over mpsc
//! ```
//!
//! Every submitted job produces exactly one [`Completion`], whatever happens
//! to its body. The coordinating thread never blocks on a worker except in
//! [`WorkerPool::next_timeout`], which is meant for shutdown and tests.

use crate::config::WorkersConfig;
use crate::error::ManagerError;
use crate::wave::WaveId;
use facet_action::{
    lifecycle, Action, ActionError, ActionOutcome, AppContext, BusyToken, Invocation, ModelJobToken,
};
use facet_types::ActionId;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, Semaphore};

/// One asynchronous invocation.
pub struct Job {
    pub action_id: ActionId,
    pub action: Arc<dyn Action>,
    pub app: Arc<AppContext>,
    pub invocation: Invocation,
    pub wave: WaveId,
    /// Held until the completion has been processed.
    pub busy: Option<BusyToken>,
    /// Counts the job against its model until the completion is taken up.
    pub model_job: Option<ModelJobToken>,
}

/// Report of a finished job, delivered to the coordinating thread.
#[derive(Debug)]
pub struct Completion {
    pub job: u64,
    pub action_id: ActionId,
    pub invocation: Invocation,
    pub wave: WaveId,
    pub outcome: ActionOutcome,
    pub busy: Option<BusyToken>,
    pub model_job: Option<ModelJobToken>,
}

/// Owns the async runtime and the completion channel.
pub struct WorkerPool {
    runtime: Runtime,
    permits: Arc<Semaphore>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    next_job: u64,
    in_flight: usize,
}

impl WorkerPool {
    /// Starts a pool with `config.threads` runtime threads running at most
    /// `config.max_concurrent` bodies at once.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Runtime`] if the runtime cannot be built.
    pub fn new(config: &WorkersConfig) -> Result<Self, ManagerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.threads.max(1))
            .max_blocking_threads(config.max_concurrent.max(1))
            .thread_name("facet-worker")
            .enable_time()
            .build()
            .map_err(|e| ManagerError::Runtime(e.to_string()))?;
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        tracing::debug!(
            threads = config.threads,
            max_concurrent = config.max_concurrent,
            "worker pool started"
        );

        Ok(Self {
            runtime,
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            completions_tx,
            completions_rx,
            next_job: 0,
            in_flight: 0,
        })
    }

    /// Queues a job. Returns its job number.
    pub fn submit(&mut self, job: Job) -> u64 {
        self.next_job += 1;
        self.in_flight += 1;
        let job_no = self.next_job;

        let permits = Arc::clone(&self.permits);
        let tx = self.completions_tx.clone();

        self.runtime.spawn(async move {
            let Job {
                action_id,
                action,
                app,
                invocation,
                wave,
                busy,
                model_job,
            } = job;

            let outcome = match permits.acquire_owned().await {
                Ok(permit) => {
                    let inv = invocation.clone();
                    let body = tokio::task::spawn_blocking(move || {
                        let outcome = lifecycle::execute(action.as_ref(), &app, &inv);
                        drop(permit);
                        outcome
                    });
                    match body.await {
                        Ok(outcome) => outcome,
                        Err(e) => ActionOutcome::Failed(ActionError::Panicked(e.to_string())),
                    }
                }
                Err(_) => ActionOutcome::Failed(ActionError::ExecutionFailed(
                    "worker pool closed".into(),
                )),
            };

            tracing::trace!(action = %action_id, job = job_no, "job finished");
            let completion = Completion {
                job: job_no,
                action_id,
                invocation,
                wave,
                outcome,
                busy,
                model_job,
            };
            if tx.send(completion).is_err() {
                tracing::debug!(job = job_no, "completion dropped, pool is gone");
            }
        });

        tracing::debug!(job = job_no, in_flight = self.in_flight, "job submitted");
        job_no
    }

    /// Returns the next completion without blocking.
    pub fn try_next(&mut self) -> Option<Completion> {
        let completion = self.completions_rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(completion)
    }

    /// Waits up to `timeout` for the next completion.
    ///
    /// Must not be called from inside an async runtime.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<Completion> {
        let rx = &mut self.completions_rx;
        let completion = self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, rx.recv()).await })
            .ok()
            .flatten()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(completion)
    }

    /// Jobs submitted whose completion has not been taken yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("in_flight", &self.in_flight)
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}
