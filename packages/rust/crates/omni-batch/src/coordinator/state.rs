//! Queue, timer slot and lifecycle guarded by the coordinator lock.

use std::collections::VecDeque;

use tokio::task::JoinHandle;

use crate::job::PendingRequest;

/// Coordinator lifecycle. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Accepting submissions.
    Accepting,
    /// Shutdown began; remaining jobs are being drained.
    Draining,
    /// Drain finished.
    Closed,
}

impl CoordinatorState {
    /// Lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepting => "accepting",
            Self::Draining => "draining",
            Self::Closed => "closed",
        }
    }
}

/// The one outstanding trigger timer. `generation` lets a timer that lost a
/// race recognise it was superseded.
pub(super) struct ArmedTimer {
    pub(super) generation: u64,
    pub(super) handle: JoinHandle<()>,
}

pub(super) struct QueueState<T, R> {
    pub(super) lifecycle: CoordinatorState,
    pub(super) queue: VecDeque<PendingRequest<T, R>>,
    pub(super) timer: Option<ArmedTimer>,
    next_timer_generation: u64,
}

impl<T, R> QueueState<T, R> {
    pub(super) fn new() -> Self {
        Self {
            lifecycle: CoordinatorState::Accepting,
            queue: VecDeque::new(),
            timer: None,
            next_timer_generation: 0,
        }
    }

    pub(super) fn next_timer_generation(&mut self) -> u64 {
        self.next_timer_generation = self.next_timer_generation.wrapping_add(1);
        self.next_timer_generation
    }

    /// Cancel the armed timer, if any. Idempotent.
    pub(super) fn disarm_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.handle.abort();
        }
    }

    /// Called from the timer task itself: release the slot without aborting
    /// the caller. Returns `false` if this timer was already superseded.
    pub(super) fn claim_timer(&mut self, generation: u64) -> bool {
        match self.timer {
            Some(ref timer) if timer.generation == generation => {
                self.timer = None;
                true
            }
            _ => false,
        }
    }

    /// Remove the oldest `max` requests (or all, if fewer) in FIFO order.
    pub(super) fn take_batch(&mut self, max: usize) -> Vec<PendingRequest<T, R>> {
        let take = max.min(self.queue.len());
        self.queue.drain(..take).collect()
    }
}
