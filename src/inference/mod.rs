//! Real-time classification of the latest hand observation.

mod state;

pub use state::InferenceState;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::events::EventSender;
use crate::landmarks::LatestFrame;
use crate::model_slot::ModelSlot;

/// Time between two classification ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(125);

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Failed to start inference thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Periodically classifies the latest frame against the current model.
///
/// The loop is either stopped or running. `start` and `stop` are idempotent,
/// and once `stop` returns the worker has exited: no further tick runs and no
/// further event is sent.
#[derive(Debug)]
pub struct InferenceLoop {
    frames: LatestFrame,
    models: ModelSlot,
    events: EventSender,
    interval: Duration,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<InferenceState>>,
    worker: Option<JoinHandle<()>>,
}

impl InferenceLoop {
    pub fn new(frames: LatestFrame, models: ModelSlot, events: EventSender) -> Self {
        Self {
            frames,
            models,
            events,
            interval: DEFAULT_TICK_INTERVAL,
            running: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(InferenceState::default())),
            worker: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some() && self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the label bookkeeping.
    pub fn state(&self) -> InferenceState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    pub fn start(&mut self) -> Result<(), InferenceError> {
        if self.is_running() {
            return Ok(());
        }
        // A worker that exited on its own still has to be reaped.
        self.join_worker();
        if let Ok(mut state) = self.state.lock() {
            *state = InferenceState::enabled();
        }
        self.running.store(true, Ordering::SeqCst);
        let worker = TickWorker {
            frames: self.frames.clone(),
            models: self.models.clone(),
            events: self.events.clone(),
            interval: self.interval,
            running: Arc::clone(&self.running),
            state: Arc::clone(&self.state),
        };
        let handle = thread::Builder::new()
            .name("inference-loop".to_string())
            .spawn(move || worker.run());
        match handle {
            Ok(handle) => {
                self.worker = Some(handle);
                tracing::info!("Inference loop started ({:?} ticks)", self.interval);
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                if let Ok(mut state) = self.state.lock() {
                    state.enabled = false;
                }
                Err(err.into())
            }
        }
    }

    pub fn stop(&mut self) {
        if self.join_worker() {
            tracing::info!("Inference loop stopped");
        }
    }

    fn join_worker(&mut self) -> bool {
        self.running.store(false, Ordering::SeqCst);
        if let Ok(mut state) = self.state.lock() {
            state.enabled = false;
        }
        let Some(handle) = self.worker.take() else {
            return false;
        };
        handle.thread().unpark();
        let _ = handle.join();
        true
    }
}

impl Drop for InferenceLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

struct TickWorker {
    frames: LatestFrame,
    models: ModelSlot,
    events: EventSender,
    interval: Duration,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<InferenceState>>,
}

impl TickWorker {
    fn run(self) {
        let mut deadline = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            if !self.tick() {
                self.running.store(false, Ordering::SeqCst);
                break;
            }
            deadline += self.interval;
            let now = Instant::now();
            if deadline < now {
                deadline = now;
            }
            self.wait_until(deadline);
        }
    }

    /// Returns false once the receiver is gone.
    fn tick(&self) -> bool {
        let frame = self.frames.latest();
        let model = self.models.current();
        let events = match self.state.lock() {
            Ok(mut state) => state.tick(frame.as_deref(), model.as_deref()),
            Err(_) => return false,
        };
        for event in events {
            if self.events.send(event).is_err() {
                tracing::debug!("Inference event receiver dropped");
                return false;
            }
        }
        true
    }

    fn wait_until(&self, deadline: Instant) {
        while self.running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::park_timeout(deadline - now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn start_and_stop_are_idempotent() {
        let (tx, _rx) = mpsc::channel();
        let mut inference = InferenceLoop::new(LatestFrame::new(), ModelSlot::new(), tx)
            .with_interval(Duration::from_millis(5));
        assert!(!inference.is_running());
        inference.stop();

        inference.start().unwrap();
        inference.start().unwrap();
        assert!(inference.is_running());
        assert!(inference.state().enabled);

        inference.stop();
        inference.stop();
        assert!(!inference.is_running());
        assert!(!inference.state().enabled);
    }
}
