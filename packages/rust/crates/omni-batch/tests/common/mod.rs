//! Shared test doubles for omni-batch integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use omni_batch::BatchProcessor;

/// How the mock responds to a batch.
pub enum Mode {
    /// Square every payload.
    Square,
    /// Fail the whole batch with this message.
    Fail(&'static str),
    /// Return one result fewer than requested.
    DropLast,
    /// Panic when a batch contains this payload, square otherwise.
    PanicOn(u64),
}

/// Squaring processor that records every batch it receives.
pub struct RecordingProcessor {
    mode: Mode,
    delay: Duration,
    batches: Mutex<Vec<Vec<u64>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl RecordingProcessor {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            delay: Duration::ZERO,
            batches: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn squaring() -> Self {
        Self::new(Mode::Square)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Batches seen so far, in call order.
    pub fn batches(&self) -> Vec<Vec<u64>> {
        self.batches.lock().expect("batches lock").clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchProcessor<u64, u64> for RecordingProcessor {
    async fn process(&self, payloads: Vec<u64>) -> Result<Vec<u64>> {
        self.batches
            .lock()
            .expect("batches lock")
            .push(payloads.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        match self.mode {
            Mode::Square => Ok(payloads.iter().map(|n| n * n).collect()),
            Mode::Fail(message) => Err(anyhow::anyhow!(message)),
            Mode::DropLast => {
                let mut results: Vec<u64> = payloads.iter().map(|n| n * n).collect();
                results.pop();
                Ok(results)
            }
            Mode::PanicOn(poison) => {
                assert!(!payloads.contains(&poison), "poisoned payload {poison}");
                Ok(payloads.iter().map(|n| n * n).collect())
            }
        }
    }
}
