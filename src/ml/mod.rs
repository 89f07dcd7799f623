//! Gesture classifiers behind a small capability trait.
//!
//! Only a single dense network exists today ([`MlpModel`]); the rest of the
//! crate talks to it through [`GestureClassifier`] so another backend can be
//! added without touching the artifact store or the inference loop.

pub mod mlp;
mod scaling;

pub use mlp::MlpModel;
pub use scaling::MinMaxScaling;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classifier backend identifier stored in artifact metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[default]
    #[serde(rename = "mlp_v1")]
    MlpV1,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::MlpV1 => "mlp_v1",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One label with the classifier's confidence in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub confidence: f32,
}

/// A trained classifier mapping a 63-float feature vector to label scores.
pub trait GestureClassifier: Send + Sync + fmt::Debug {
    fn kind(&self) -> ModelKind;

    /// Labels in output order.
    fn labels(&self) -> &[String];

    fn input_dim(&self) -> usize;

    fn hidden_units(&self) -> usize;

    fn scaling(&self) -> &MinMaxScaling;

    /// Probabilities aligned with [`GestureClassifier::labels`]. Empty when the
    /// input has the wrong length.
    fn predict_proba(&self, features: &[f32]) -> Vec<f32>;

    /// Flat parameter list in the order the weights payload stores it.
    fn weights(&self) -> Vec<f32>;

    fn output_dim(&self) -> usize {
        self.labels().len()
    }

    /// Every label with its confidence, highest first. Equal confidences keep
    /// label order.
    fn classify(&self, features: &[f32]) -> Vec<LabelScore> {
        let proba = self.predict_proba(features);
        let mut scores: Vec<LabelScore> = self
            .labels()
            .iter()
            .zip(proba)
            .map(|(label, confidence)| LabelScore {
                label: label.clone(),
                confidence,
            })
            .collect();
        scores.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        scores
    }

    /// Highest-confidence label, first in label order on ties.
    fn top(&self, features: &[f32]) -> Option<LabelScore> {
        let proba = self.predict_proba(features);
        if proba.is_empty() {
            return None;
        }
        let best = argmax(&proba);
        self.labels().get(best).map(|label| LabelScore {
            label: label.clone(),
            confidence: proba[best],
        })
    }
}

pub(crate) fn softmax_into(raw: &[f32], out: &mut [f32]) {
    if raw.is_empty() || out.len() != raw.len() {
        return;
    }
    let max = raw
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut sum = 0.0f32;
    for (slot, &v) in out.iter_mut().zip(raw) {
        let e = (v - max).exp();
        *slot = e;
        sum += e;
    }
    if sum == 0.0 {
        let uniform = 1.0 / (raw.len() as f32);
        out.fill(uniform);
        return;
    }
    for v in out.iter_mut() {
        *v /= sum;
    }
}

/// Index of the largest value; the earliest index wins ties.
pub fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fixed {
        labels: Vec<String>,
        proba: Vec<f32>,
        scaling: MinMaxScaling,
    }

    impl GestureClassifier for Fixed {
        fn kind(&self) -> ModelKind {
            ModelKind::MlpV1
        }
        fn labels(&self) -> &[String] {
            &self.labels
        }
        fn input_dim(&self) -> usize {
            1
        }
        fn hidden_units(&self) -> usize {
            0
        }
        fn scaling(&self) -> &MinMaxScaling {
            &self.scaling
        }
        fn predict_proba(&self, _features: &[f32]) -> Vec<f32> {
            self.proba.clone()
        }
        fn weights(&self) -> Vec<f32> {
            Vec::new()
        }
    }

    fn fixed(proba: Vec<f32>) -> Fixed {
        Fixed {
            labels: vec!["a".into(), "b".into(), "c".into()],
            proba,
            scaling: MinMaxScaling::identity(1),
        }
    }

    #[test]
    fn softmax_sums_to_one_and_survives_large_logits() {
        let mut out = [0.0f32; 3];
        softmax_into(&[1000.0, 1000.0, -1000.0], &mut out);
        let sum: f32 = out.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!((out[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn classify_sorts_descending_and_keeps_ties_in_label_order() {
        let model = fixed(vec![0.25, 0.5, 0.25]);
        let labels: Vec<String> = model
            .classify(&[0.0])
            .into_iter()
            .map(|score| score.label)
            .collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
    }

    #[test]
    fn top_prefers_first_label_on_tie() {
        let model = fixed(vec![0.4, 0.4, 0.2]);
        let best = model.top(&[0.0]).unwrap();
        assert_eq!(best.label, "a");
        assert_eq!(best.confidence, 0.4);
        assert!(fixed(Vec::new()).top(&[0.0]).is_none());
    }

    #[test]
    fn model_kind_uses_stable_wire_name() {
        assert_eq!(serde_json::to_string(&ModelKind::MlpV1).unwrap(), "\"mlp_v1\"");
        assert_eq!(ModelKind::MlpV1.to_string(), "mlp_v1");
    }
}
