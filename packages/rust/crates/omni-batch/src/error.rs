//! Error types for the batch coordinator.
//!
//! Follows ODF-REP: Library crates use `thiserror` for explicit error enums.

use thiserror::Error;

/// Error types for batch submission and processing.
///
/// `Clone` so that one processor failure can be delivered to every job of the
/// batch it belongs to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Submission attempted after shutdown began.
    #[error("Cannot submit job - the system is shutting down.")]
    ShuttingDown,

    /// The batch processor failed; carries its message verbatim.
    #[error("{0}")]
    Processing(String),

    /// The batch processor failed without a usable message.
    #[error("Unknown error")]
    Unknown,

    /// The batch processor broke its same-length contract.
    #[error("Batch processor returned {actual} results for {expected} jobs")]
    ResultCountMismatch {
        /// Jobs in the batch.
        expected: usize,
        /// Results returned by the processor.
        actual: usize,
    },

    /// The pending request was dropped without being resolved.
    #[error("Job was dropped before its batch was resolved")]
    Abandoned,

    /// Settings could not be read or parsed.
    #[error("Invalid batch settings: {0}")]
    Config(String),
}

impl BatchError {
    /// Normalize a processor failure into a per-job error.
    ///
    /// Failures whose message is blank become [`BatchError::Unknown`].
    #[must_use]
    pub fn from_processor_failure(error: &anyhow::Error) -> Self {
        let message = error.to_string();
        if message.trim().is_empty() {
            Self::Unknown
        } else {
            Self::Processing(message)
        }
    }
}
