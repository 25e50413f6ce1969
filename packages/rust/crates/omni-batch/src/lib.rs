//! omni-batch - Micro-batching coordinator for Omni DevEnv
//!
//! Callers submit individual jobs; the coordinator groups them into batches
//! of at most `batch_size` and hands each batch to a pluggable async
//! processor when the batch fills or `batch_frequency` elapses, whichever
//! comes first. Every accepted job gets exactly one [`JobResult`], paired
//! back by position from the processor output.
//!
//! # Architecture (ODF-REP Compliant)
//!
//! ```text
//! omni-batch/src/
//! ├── lib.rs          # Re-exports (this file)
//! ├── error.rs        # BatchError enum
//! ├── config.rs       # BatchConfig + layered BatchSettings
//! ├── job.rs          # Job, JobResult, JobHandle
//! ├── processor.rs    # BatchProcessor trait + closure adapter
//! ├── events.rs       # Log event names
//! └── coordinator/    # Queue, trigger timer, dispatch loop, shutdown drain
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use omni_batch::{BatchConfig, BatchCoordinator, from_fn};
//!
//! let squares = from_fn(|payloads: Vec<u64>| async move {
//!     Ok(payloads.into_iter().map(|n| n * n).collect())
//! });
//! let coordinator = BatchCoordinator::new(Arc::new(squares), BatchConfig::new(Some(4), None));
//!
//! let handle = coordinator.submit_payload("job-1", 3)?;
//! coordinator.shutdown().await;
//! assert_eq!(handle.await.into_result()?, 9);
//! ```

// ============================================================================
// Module Declarations (ODF-REP: Atomic Structure)
// ============================================================================

mod config;
mod coordinator;
mod error;
mod events;
mod job;
mod processor;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use config::{BatchConfig, BatchSettings, DEFAULT_BATCH_FREQUENCY_MS, DEFAULT_BATCH_SIZE};
pub use coordinator::{BatchCoordinator, CoordinatorState};
pub use error::BatchError;
pub use events::BatchEvent;
pub use job::{Job, JobHandle, JobResult};
pub use processor::{BatchProcessor, FnProcessor, from_fn};
