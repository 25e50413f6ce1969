//! Batch processor capability supplied by the integrator.

use std::future::Future;
use std::marker::PhantomData;

use anyhow::Result;
use async_trait::async_trait;

/// Async batch processor so the coordinator can drive real backends or test doubles.
///
/// Contract: the returned vector has the same length as `payloads`, and
/// position `i` of the output is the result for position `i` of the input.
/// A failure applies to the whole batch.
#[async_trait]
pub trait BatchProcessor<T, R>: Send + Sync
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Process one ordered batch of payloads.
    async fn process(&self, payloads: Vec<T>) -> Result<Vec<R>>;
}

/// Adapter turning an async closure into a [`BatchProcessor`].
pub struct FnProcessor<F, T, R> {
    f: F,
    _marker: PhantomData<fn(Vec<T>) -> Vec<R>>,
}

/// Wrap `f` as a batch processor.
///
/// ```rust,ignore
/// let squares = omni_batch::from_fn(|payloads: Vec<u64>| async move {
///     Ok(payloads.into_iter().map(|n| n * n).collect())
/// });
/// ```
pub fn from_fn<F, Fut, T, R>(f: F) -> FnProcessor<F, T, R>
where
    F: Fn(Vec<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<R>>> + Send,
{
    FnProcessor {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, T, R> BatchProcessor<T, R> for FnProcessor<F, T, R>
where
    F: Fn(Vec<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<R>>> + Send,
    T: Send + 'static,
    R: Send + 'static,
{
    async fn process(&self, payloads: Vec<T>) -> Result<Vec<R>> {
        (self.f)(payloads).await
    }
}
