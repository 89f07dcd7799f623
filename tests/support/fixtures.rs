use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use handsign::artifact::{ArtifactOrigin, ModelArtifact};
use handsign::dataset::Dataset;
use handsign::events::GestureEvent;
use handsign::landmarks::{FEATURE_LEN, HandFrame, LANDMARK_COUNT, Landmark, Sample};
use handsign::ml::MinMaxScaling;
use handsign::ml::mlp::{MlpModel, parameter_count};

/// A hand whose landmarks spread out from `value`.
pub fn hand(value: f32) -> Vec<Landmark> {
    (0..LANDMARK_COUNT)
        .map(|i| {
            let offset = i as f32 * 0.01;
            Landmark::new(value + offset, value - offset, value * 0.5)
        })
        .collect()
}

pub fn sample(value: f32) -> Sample {
    Sample::new(hand(value))
}

pub fn frame(timestamp_ms: f64, wrist_x: f32) -> HandFrame {
    let mut landmarks = hand(0.5);
    landmarks[0].x = wrist_x;
    HandFrame::new(timestamp_ms, vec![landmarks])
}

/// `{"open": [A], "closed": [B]}` with one sample per class.
pub fn open_closed_dataset() -> Dataset {
    let mut dataset = Dataset::new();
    dataset.add_sample("open", sample(0.2)).unwrap();
    dataset.add_sample("closed", sample(0.8)).unwrap();
    dataset
}

/// Upload document with `per_class` samples for each label.
pub fn upload_json(labels: &[&str], per_class: usize) -> String {
    let mut dataset = Dataset::new();
    for (class_idx, label) in labels.iter().enumerate() {
        for sample_idx in 0..per_class {
            let value = 0.1 + class_idx as f32 * 0.3 + sample_idx as f32 * 0.01;
            dataset.add_sample(label, sample(value)).unwrap();
        }
    }
    dataset.to_json().unwrap()
}

/// Hand-built model: wrist `x` below ~0.5 reads as "open", above as "closed".
pub fn threshold_model(version: u64) -> ModelArtifact {
    let hidden = 1;
    let mut params = vec![0.0f32; parameter_count(FEATURE_LEN, hidden, 2)];
    params[0] = 1.0;
    let w2 = FEATURE_LEN + hidden;
    params[w2] = -10.0;
    params[w2 + 1] = 10.0;
    params[w2 + 2] = 5.0;
    let model = MlpModel::from_parameters(
        vec!["open".into(), "closed".into()],
        FEATURE_LEN,
        hidden,
        MinMaxScaling::identity(FEATURE_LEN),
        &params,
    )
    .unwrap();
    ModelArtifact::new(Arc::new(model), version, ArtifactOrigin::Trained)
}

/// Deterministic probe inputs spread over the unit cube.
pub fn probe_set() -> Vec<Vec<f32>> {
    (0..8)
        .map(|k| {
            (0..FEATURE_LEN)
                .map(|i| ((i * 7 + k * 13) % 17) as f32 / 17.0)
                .collect()
        })
        .collect()
}

/// Collect events until `pred` matches one or `timeout` passes.
pub fn wait_for_event(
    rx: &Receiver<GestureEvent>,
    timeout: Duration,
    mut pred: impl FnMut(&GestureEvent) -> bool,
) -> Vec<GestureEvent> {
    let deadline = Instant::now() + timeout;
    let mut seen = Vec::new();
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(remaining) {
            Ok(event) => {
                let done = pred(&event);
                seen.push(event);
                if done {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    seen
}
