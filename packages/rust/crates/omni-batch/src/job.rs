//! Job, result and completion-handle types.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::BatchError;

/// One unit of work submitted for batched processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job<T> {
    /// Caller-supplied identifier echoed back on the result. Not checked for uniqueness.
    pub id: String,
    /// Opaque payload handed to the batch processor.
    pub payload: T,
}

impl<T> Job<T> {
    /// Create a job from an id and payload.
    pub fn new(id: impl Into<String>, payload: T) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// Outcome delivered to the submitter of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct JobResult<R> {
    /// Identifier of the job this result belongs to.
    pub id: String,
    /// Success value at the job's batch position, or the batch failure.
    pub outcome: Result<R, BatchError>,
}

impl<R> JobResult<R> {
    /// Successful result.
    pub fn success(id: impl Into<String>, result: R) -> Self {
        Self {
            id: id.into(),
            outcome: Ok(result),
        }
    }

    /// Failed result.
    pub fn failure(id: impl Into<String>, error: BatchError) -> Self {
        Self {
            id: id.into(),
            outcome: Err(error),
        }
    }

    /// Whether the job produced a value.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Success value, if any.
    #[must_use]
    pub fn result(&self) -> Option<&R> {
        self.outcome.as_ref().ok()
    }

    /// Error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&BatchError> {
        self.outcome.as_ref().err()
    }

    /// Consume into a plain `Result`.
    ///
    /// # Errors
    /// Returns the batch error if the job failed.
    pub fn into_result(self) -> Result<R, BatchError> {
        self.outcome
    }
}

/// A job plus the single-use channel its result is delivered on.
///
/// Only the coordinator builds these; resolving consumes the request, so a
/// result is sent at most once.
pub(crate) struct PendingRequest<T, R> {
    pub(crate) job: Job<T>,
    responder: oneshot::Sender<JobResult<R>>,
}

impl<T, R> PendingRequest<T, R> {
    pub(crate) fn new(job: Job<T>) -> (Self, JobHandle<R>) {
        let (responder, rx) = oneshot::channel();
        let handle = JobHandle {
            id: job.id.clone(),
            rx,
        };
        (Self { job, responder }, handle)
    }

    /// Split into the payload and a resolver that remembers the job id.
    pub(crate) fn into_parts(self) -> (T, Resolver<R>) {
        (
            self.job.payload,
            Resolver {
                id: self.job.id,
                responder: self.responder,
            },
        )
    }
}

/// Delivery side of a pending request once its payload went to the processor.
pub(crate) struct Resolver<R> {
    id: String,
    responder: oneshot::Sender<JobResult<R>>,
}

impl<R> Resolver<R> {
    pub(crate) fn resolve(self, outcome: Result<R, BatchError>) {
        // The caller may have dropped its handle; nothing to deliver then.
        let _ = self.responder.send(JobResult {
            id: self.id,
            outcome,
        });
    }
}

/// Completion handle returned by `submit`.
///
/// Resolves to exactly one [`JobResult`] carrying the submitted job's id. If
/// the coordinator drops the job without resolving it, the handle yields
/// [`BatchError::Abandoned`] instead of waiting forever.
#[derive(Debug)]
#[must_use = "a job handle does nothing unless awaited"]
pub struct JobHandle<R> {
    id: String,
    rx: oneshot::Receiver<JobResult<R>>,
}

impl<R> JobHandle<R> {
    /// Identifier of the job this handle tracks.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<R> Future for JobHandle<R> {
    type Output = JobResult<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let polled = Pin::new(&mut self.rx).poll(cx);
        match polled {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(JobResult::failure(
                self.id.clone(),
                BatchError::Abandoned,
            )),
            Poll::Pending => Poll::Pending,
        }
    }
}
