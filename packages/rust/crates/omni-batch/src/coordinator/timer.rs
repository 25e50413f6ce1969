use std::sync::Arc;

use crate::events::BatchEvent;

use super::Shared;
use super::dispatch::Trigger;
use super::state::{ArmedTimer, CoordinatorState, QueueState};

impl<T, R> Shared<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Arm the flush timer. Caller holds the state lock and has checked that
    /// no timer is armed.
    pub(super) fn arm_timer(self: &Arc<Self>, state: &mut QueueState<T, R>) {
        let generation = state.next_timer_generation();
        let delay = self.config.batch_frequency;
        let shared = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.on_timer_fired(generation);
        });
        state.timer = Some(ArmedTimer { generation, handle });
        tracing::trace!(
            event = BatchEvent::TimerArmed.as_str(),
            generation,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "batch timer armed"
        );
    }

    fn on_timer_fired(self: &Arc<Self>, generation: u64) {
        let mut state = self.lock_state();
        if !state.claim_timer(generation) {
            return;
        }
        let batch = state.take_batch(self.config.batch_size);
        tracing::trace!(
            event = BatchEvent::TimerFired.as_str(),
            generation,
            batch_len = batch.len(),
            "batch timer fired"
        );
        self.send_batch(batch, Trigger::Timer);
        if !state.queue.is_empty() && state.lifecycle == CoordinatorState::Accepting {
            self.arm_timer(&mut state);
        }
    }
}
