//! Stable event names attached to coordinator log records.

/// Log event emitted by the coordinator, recorded as the `event` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchEvent {
    /// Job appended to the queue.
    JobAccepted,
    /// Job refused because shutdown began.
    JobRejected,
    /// Trigger timer armed.
    TimerArmed,
    /// Trigger timer elapsed and flushed a partial batch.
    TimerFired,
    /// Batch handed to the processor.
    DispatchStarted,
    /// Batch results delivered.
    DispatchCompleted,
    /// Batch failed; every job received the error.
    DispatchFailed,
    /// Shutdown began draining the queue.
    ShutdownStarted,
    /// Drain finished; coordinator closed.
    ShutdownCompleted,
}

impl BatchEvent {
    /// Dotted event name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JobAccepted => "batch.job.accepted",
            Self::JobRejected => "batch.job.rejected",
            Self::TimerArmed => "batch.timer.armed",
            Self::TimerFired => "batch.timer.fired",
            Self::DispatchStarted => "batch.dispatch.started",
            Self::DispatchCompleted => "batch.dispatch.completed",
            Self::DispatchFailed => "batch.dispatch.failed",
            Self::ShutdownStarted => "batch.shutdown.started",
            Self::ShutdownCompleted => "batch.shutdown.completed",
        }
    }
}

impl std::fmt::Display for BatchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
