use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use super::{HandFrame, LatestFrame};
use crate::events::{EventSender, GestureEvent};

/// Roughly one display frame at 60 Hz.
const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Opaque producer of per-frame hand landmarks.
pub trait LandmarkDetector: Send {
    /// Next detector frame, or `Ok(None)` when nothing new is available yet.
    fn next_frame(&mut self) -> Result<Option<HandFrame>, DetectorError>;

    /// True once the detector will never produce another frame.
    fn is_exhausted(&self) -> bool {
        false
    }
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Landmark detector unavailable: {0}")]
    Unavailable(String),
    #[error("Landmark detection failed: {0}")]
    Detection(String),
    #[error("Failed to read frames from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid frame on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// Drives a detector on a background thread and publishes its frames.
///
/// Every new frame replaces the contents of the shared [`LatestFrame`] slot and
/// is announced with a [`GestureEvent::Prediction`]. Frames whose timestamp did
/// not advance are dropped.
pub struct LandmarkFeed {
    instance_id: Uuid,
    slot: LatestFrame,
    events: EventSender,
    frame_interval: Duration,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl LandmarkFeed {
    pub fn new(slot: LatestFrame, events: EventSender) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            slot,
            events,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Start pulling frames from `detector`, replacing any running detector.
    pub fn enable<D>(&mut self, detector: D) -> Result<(), DetectorError>
    where
        D: LandmarkDetector + 'static,
    {
        self.disable();
        let stop = Arc::new(AtomicBool::new(false));
        self.stop = Arc::clone(&stop);
        let slot = self.slot.clone();
        let events = self.events.clone();
        let instance_id = self.instance_id;
        let interval = self.frame_interval;
        let worker = thread::Builder::new()
            .name("landmark-feed".to_string())
            .spawn(move || run_feed(detector, slot, events, stop, instance_id, interval))
            .map_err(|err| {
                DetectorError::Unavailable(format!("feed thread failed to start: {err}"))
            })?;
        self.worker = Some(worker);
        Ok(())
    }

    /// Stop the detector thread and clear the latest frame.
    pub fn disable(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            tracing::info!(instance_id = %self.instance_id, "Landmark feed disabled");
        }
        self.slot.clear();
    }
}

impl Drop for LandmarkFeed {
    fn drop(&mut self) {
        self.disable();
    }
}

fn run_feed<D: LandmarkDetector>(
    mut detector: D,
    slot: LatestFrame,
    events: EventSender,
    stop: Arc<AtomicBool>,
    instance_id: Uuid,
    interval: Duration,
) {
    tracing::info!(%instance_id, "Landmark feed enabled");
    if events.send(GestureEvent::WebcamEnabled { instance_id }).is_err() {
        return;
    }
    let mut last_timestamp: Option<f64> = None;
    while !stop.load(Ordering::SeqCst) {
        match detector.next_frame() {
            Ok(Some(frame)) => {
                if last_timestamp != Some(frame.timestamp_ms) {
                    last_timestamp = Some(frame.timestamp_ms);
                    let timestamp_ms = frame.timestamp_ms;
                    let frame = slot.publish(frame);
                    let sent = events.send(GestureEvent::Prediction {
                        frame,
                        timestamp_ms,
                        instance_id,
                    });
                    if sent.is_err() {
                        break;
                    }
                }
            }
            Ok(None) if detector.is_exhausted() => break,
            Ok(None) => {}
            Err(err) => {
                tracing::error!(%instance_id, "Landmark detector failed: {err}");
                let _ = events.send(GestureEvent::Error {
                    instance_id,
                    message: err.to_string(),
                });
                break;
            }
        }
        thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct FailingDetector;

    impl LandmarkDetector for FailingDetector {
        fn next_frame(&mut self) -> Result<Option<HandFrame>, DetectorError> {
            Err(DetectorError::Detection("camera unplugged".into()))
        }
    }

    #[test]
    fn duplicate_timestamps_are_published_once() {
        let (tx, rx) = mpsc::channel();
        let slot = LatestFrame::new();
        let mut feed = LandmarkFeed::new(slot.clone(), tx).with_frame_interval(Duration::ZERO);
        let frames = vec![
            HandFrame::new(1.0, Vec::new()),
            HandFrame::new(1.0, Vec::new()),
            HandFrame::new(2.0, Vec::new()),
        ];
        feed.enable(crate::landmarks::ReplayDetector::from_frames(frames))
            .unwrap();
        while feed.is_running() {
            thread::sleep(Duration::from_millis(1));
        }
        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events[0], GestureEvent::WebcamEnabled { .. }));
        let timestamps: Vec<f64> = events
            .iter()
            .filter_map(|event| match event {
                GestureEvent::Prediction { timestamp_ms, .. } => Some(*timestamp_ms),
                _ => None,
            })
            .collect();
        assert_eq!(timestamps, vec![1.0, 2.0]);
        assert_eq!(slot.latest().unwrap().timestamp_ms, 2.0);
    }

    #[test]
    fn detector_failure_emits_error_and_stops() {
        let (tx, rx) = mpsc::channel();
        let mut feed = LandmarkFeed::new(LatestFrame::new(), tx);
        let id = feed.instance_id();
        feed.enable(FailingDetector).unwrap();
        while feed.is_running() {
            thread::sleep(Duration::from_millis(1));
        }
        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.iter().any(|event| matches!(
            event,
            GestureEvent::Error { instance_id, message }
                if *instance_id == id && message.contains("camera unplugged")
        )));
    }
}
