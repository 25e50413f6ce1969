//! Micro-batching coordinator: FIFO queue, size/time triggers, drain on shutdown.
//!
//! ```text
//! submit() ──► queue ──(len >= batch_size)──► cut batch ─┐
//!                 │                                      ├──► dispatch loop ──► processor
//!                 └──(timer, batch_frequency)──► cut ────┘          │
//!                                                                    ▼
//!                                            JobHandle ◄── results paired by position
//! ```
//!
//! Queue, timer slot and lifecycle live behind one lock that is never held
//! across an await. Batches are cut under that lock and handed to a single
//! dispatch task, so the processor sees at most one batch at a time and in
//! submission order.

mod dispatch;
mod state;
mod timer;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, oneshot};

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::events::BatchEvent;
use crate::job::{Job, JobHandle, PendingRequest};
use crate::processor::BatchProcessor;

use dispatch::{DispatchCommand, Trigger, spawn_dispatch_loop};
use state::QueueState;

pub use state::CoordinatorState;

/// Groups submitted jobs into batches and routes processor results back to callers.
///
/// Must be created and used inside a Tokio runtime.
pub struct BatchCoordinator<T, R> {
    shared: Arc<Shared<T, R>>,
}

struct Shared<T, R> {
    config: BatchConfig,
    state: Mutex<QueueState<T, R>>,
    dispatch_tx: mpsc::UnboundedSender<DispatchCommand<T, R>>,
}

impl<T, R> BatchCoordinator<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Start a coordinator and its dispatch task.
    ///
    /// Zero values in `config` fall back to the defaults.
    pub fn new(processor: Arc<dyn BatchProcessor<T, R>>, config: BatchConfig) -> Self {
        let config = BatchConfig::default()
            .with_batch_size(config.batch_size)
            .with_batch_frequency(config.batch_frequency);
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
        spawn_dispatch_loop(processor, dispatch_rx);

        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(QueueState::new()),
                dispatch_tx,
            }),
        }
    }

    /// Queue one job. Never waits for processing.
    ///
    /// Reaching `batch_size` cuts a batch immediately; otherwise the first
    /// job after an empty queue arms the `batch_frequency` timer.
    ///
    /// # Errors
    /// Returns `BatchError::ShuttingDown` once `shutdown` has been called. No
    /// handle is created in that case.
    pub fn submit(&self, job: Job<T>) -> Result<JobHandle<R>, BatchError> {
        let batch_size = self.shared.config.batch_size;
        let mut state = self.shared.lock_state();
        if state.lifecycle != CoordinatorState::Accepting {
            tracing::debug!(
                event = BatchEvent::JobRejected.as_str(),
                job_id = %job.id,
                state = state.lifecycle.as_str(),
                "rejecting job submitted during shutdown"
            );
            return Err(BatchError::ShuttingDown);
        }

        let job_id = job.id.clone();
        let (request, handle) = PendingRequest::new(job);
        state.queue.push_back(request);
        tracing::trace!(
            event = BatchEvent::JobAccepted.as_str(),
            %job_id,
            queued = state.queue.len(),
            "job queued"
        );

        if state.queue.len() >= batch_size {
            state.disarm_timer();
            while state.queue.len() >= batch_size {
                let batch = state.take_batch(batch_size);
                self.shared.send_batch(batch, Trigger::Size);
            }
            if !state.queue.is_empty() {
                self.shared.arm_timer(&mut state);
            }
        } else if state.timer.is_none() {
            self.shared.arm_timer(&mut state);
        }

        Ok(handle)
    }

    /// Convenience for `submit(Job::new(id, payload))`.
    ///
    /// # Errors
    /// Same as [`BatchCoordinator::submit`].
    pub fn submit_payload(
        &self,
        id: impl Into<String>,
        payload: T,
    ) -> Result<JobHandle<R>, BatchError> {
        self.submit(Job::new(id, payload))
    }

    /// Stop accepting jobs, flush everything still queued, and wait until
    /// every accepted job has been resolved.
    ///
    /// Safe to call more than once; later calls only wait for in-flight work.
    pub async fn shutdown(&self) {
        let batch_size = self.shared.config.batch_size;
        let drained = {
            let mut state = self.shared.lock_state();
            if state.lifecycle == CoordinatorState::Accepting {
                state.lifecycle = CoordinatorState::Draining;
                tracing::info!(
                    event = BatchEvent::ShutdownStarted.as_str(),
                    pending = state.queue.len(),
                    "batch coordinator shutting down"
                );
            }
            state.disarm_timer();
            while !state.queue.is_empty() {
                let batch = state.take_batch(batch_size);
                self.shared.send_batch(batch, Trigger::Shutdown);
            }

            let (done_tx, done_rx) = oneshot::channel();
            if self
                .shared
                .dispatch_tx
                .send(DispatchCommand::Barrier(done_tx))
                .is_err()
            {
                tracing::warn!("batch dispatch loop is gone; nothing left to drain");
            }
            done_rx
        };

        // Err means the dispatch loop is gone; any jobs it held resolved as abandoned.
        let _ = drained.await;

        let mut state = self.shared.lock_state();
        if state.lifecycle == CoordinatorState::Draining {
            state.lifecycle = CoordinatorState::Closed;
            tracing::info!(
                event = BatchEvent::ShutdownCompleted.as_str(),
                "batch coordinator closed"
            );
        }
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> BatchConfig {
        self.shared.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CoordinatorState {
        self.shared.lock_state().lifecycle
    }

    /// Whether shutdown has begun.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.state() != CoordinatorState::Accepting
    }

    /// Jobs queued but not yet cut into a batch.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.shared.lock_state().queue.len()
    }
}

impl<T, R> Shared<T, R> {
    fn lock_state(&self) -> MutexGuard<'_, QueueState<T, R>> {
        // Nothing panics while holding the lock; recover the data if it ever does.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand a cut batch to the dispatch loop. Caller holds the state lock so
    /// batches reach the loop in the order they were cut.
    fn send_batch(&self, requests: Vec<PendingRequest<T, R>>, trigger: Trigger) {
        if requests.is_empty() {
            return;
        }
        if self
            .dispatch_tx
            .send(DispatchCommand::Batch { requests, trigger })
            .is_err()
        {
            tracing::warn!(
                trigger = trigger.as_str(),
                "batch dispatch loop is gone; dropped batch resolves as abandoned"
            );
        }
    }
}
