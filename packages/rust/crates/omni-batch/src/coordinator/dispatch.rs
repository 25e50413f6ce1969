use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::BatchError;
use crate::events::BatchEvent;
use crate::job::{PendingRequest, Resolver};
use crate::processor::BatchProcessor;

/// Why a batch was cut from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Trigger {
    Size,
    Timer,
    Shutdown,
}

impl Trigger {
    pub(super) const fn as_str(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Timer => "timer",
            Self::Shutdown => "shutdown",
        }
    }
}

pub(super) enum DispatchCommand<T, R> {
    Batch {
        requests: Vec<PendingRequest<T, R>>,
        trigger: Trigger,
    },
    /// Signalled once every command queued before it has been handled.
    Barrier(oneshot::Sender<()>),
}

/// Single worker that runs batches one at a time, in the order they were cut.
pub(super) fn spawn_dispatch_loop<T, R>(
    processor: Arc<dyn BatchProcessor<T, R>>,
    mut command_rx: mpsc::UnboundedReceiver<DispatchCommand<T, R>>,
) -> JoinHandle<()>
where
    T: Send + 'static,
    R: Send + 'static,
{
    tokio::spawn(async move {
        let mut batch_seq = 0_u64;
        while let Some(command) = command_rx.recv().await {
            match command {
                DispatchCommand::Batch { requests, trigger } => {
                    batch_seq += 1;
                    run_batch(&processor, requests, trigger, batch_seq).await;
                }
                DispatchCommand::Barrier(done) => {
                    let _ = done.send(());
                }
            }
        }
        tracing::trace!(batches = batch_seq, "batch dispatch loop exiting");
    })
}

async fn run_batch<T, R>(
    processor: &Arc<dyn BatchProcessor<T, R>>,
    requests: Vec<PendingRequest<T, R>>,
    trigger: Trigger,
    batch_seq: u64,
) where
    T: Send + 'static,
    R: Send + 'static,
{
    if requests.is_empty() {
        return;
    }
    let batch_len = requests.len();
    let (payloads, resolvers): (Vec<T>, Vec<Resolver<R>>) = requests
        .into_iter()
        .map(PendingRequest::into_parts)
        .unzip();

    tracing::debug!(
        event = BatchEvent::DispatchStarted.as_str(),
        batch_seq,
        batch_len,
        trigger = trigger.as_str(),
        "dispatching batch"
    );
    let started = Instant::now();

    // Own task so a panicking processor surfaces as a JoinError.
    let worker = Arc::clone(processor);
    let joined = tokio::spawn(async move { worker.process(payloads).await }).await;
    let outcome = match joined {
        Ok(Ok(results)) if results.len() == batch_len => Ok(results),
        Ok(Ok(results)) => Err(BatchError::ResultCountMismatch {
            expected: batch_len,
            actual: results.len(),
        }),
        Ok(Err(error)) => Err(BatchError::from_processor_failure(&error)),
        Err(join_error) => Err(BatchError::Processing(format!(
            "batch processor panicked: {join_error}"
        ))),
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(results) => {
            for (resolver, result) in resolvers.into_iter().zip(results) {
                resolver.resolve(Ok(result));
            }
            tracing::debug!(
                event = BatchEvent::DispatchCompleted.as_str(),
                batch_seq,
                batch_len,
                elapsed_ms,
                "batch resolved"
            );
        }
        Err(error) => {
            tracing::warn!(
                event = BatchEvent::DispatchFailed.as_str(),
                batch_seq,
                batch_len,
                elapsed_ms,
                trigger = trigger.as_str(),
                error = %error,
                "batch processor failed; failing every job in the batch"
            );
            for resolver in resolvers {
                resolver.resolve(Err(error.clone()));
            }
        }
    }
}
