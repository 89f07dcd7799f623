use crate::ml::{GestureClassifier, MinMaxScaling, ModelKind, softmax_into};

/// Dense `input -> hidden (ReLU) -> output (softmax)` network.
///
/// `weights1` is row-major `hidden x input`, `weights2` is row-major
/// `output x hidden`. Inputs are min-max scaled before the first layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpModel {
    pub labels: Vec<String>,
    pub input_dim: usize,
    pub hidden_size: usize,
    pub weights1: Vec<f32>,
    pub bias1: Vec<f32>,
    pub weights2: Vec<f32>,
    pub bias2: Vec<f32>,
    pub scaling: MinMaxScaling,
}

/// Number of f32 parameters for the given layer sizes.
pub fn parameter_count(input: usize, hidden: usize, output: usize) -> usize {
    hidden * (input + 1) + output * (hidden + 1)
}

/// Output width implied by a parameter count, if the count fits the layout.
pub fn implied_output_dim(params: usize, input: usize, hidden: usize) -> Option<usize> {
    let first = hidden * (input + 1);
    let rest = params.checked_sub(first)?;
    if rest % (hidden + 1) != 0 {
        return None;
    }
    Some(rest / (hidden + 1))
}

impl MlpModel {
    /// Rebuild a model from a flat parameter list laid out as
    /// `weights1, bias1, weights2, bias2`.
    pub fn from_parameters(
        labels: Vec<String>,
        input_dim: usize,
        hidden_size: usize,
        scaling: MinMaxScaling,
        params: &[f32],
    ) -> Result<Self, String> {
        let output = labels.len();
        let expected = parameter_count(input_dim, hidden_size, output);
        if params.len() != expected {
            return Err(format!(
                "expected {expected} parameters, found {}",
                params.len()
            ));
        }
        let (weights1, rest) = params.split_at(hidden_size * input_dim);
        let (bias1, rest) = rest.split_at(hidden_size);
        let (weights2, bias2) = rest.split_at(output * hidden_size);
        let model = Self {
            labels,
            input_dim,
            hidden_size,
            weights1: weights1.to_vec(),
            bias1: bias1.to_vec(),
            weights2: weights2.to_vec(),
            bias2: bias2.to_vec(),
            scaling,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), String> {
        let input = self.input_dim;
        let hidden = self.hidden_size;
        let classes = self.labels.len();
        if input == 0 || hidden == 0 {
            return Err("layer sizes must be non-zero".to_string());
        }
        if classes == 0 {
            return Err("model has no labels".to_string());
        }
        if self.weights1.len() != input * hidden {
            return Err("weights1 length mismatch".to_string());
        }
        if self.bias1.len() != hidden {
            return Err("bias1 length mismatch".to_string());
        }
        if self.weights2.len() != classes * hidden {
            return Err("weights2 length mismatch".to_string());
        }
        if self.bias2.len() != classes {
            return Err("bias2 length mismatch".to_string());
        }
        if !self.scaling.is_consistent(input) {
            return Err("normalization length mismatch".to_string());
        }
        let all_finite = self
            .weights1
            .iter()
            .chain(&self.bias1)
            .chain(&self.weights2)
            .chain(&self.bias2)
            .all(|v| v.is_finite());
        if !all_finite {
            return Err("non-finite parameter".to_string());
        }
        Ok(())
    }

    fn forward(&self, features: &[f32]) -> Vec<f32> {
        let input = self.input_dim;
        let hidden = self.hidden_size;
        let classes = self.labels.len();

        let mut normalized = vec![0.0f32; input];
        self.scaling.apply_into(features, &mut normalized);

        let mut hidden_act = vec![0.0f32; hidden];
        for h in 0..hidden {
            let row = &self.weights1[h * input..(h + 1) * input];
            let sum: f32 = row.iter().zip(&normalized).map(|(w, x)| w * x).sum();
            hidden_act[h] = (sum + self.bias1[h]).max(0.0);
        }

        let mut logits = vec![0.0f32; classes];
        for c in 0..classes {
            let row = &self.weights2[c * hidden..(c + 1) * hidden];
            let sum: f32 = row.iter().zip(&hidden_act).map(|(w, a)| w * a).sum();
            logits[c] = sum + self.bias2[c];
        }

        let mut probs = vec![0.0f32; classes];
        softmax_into(&logits, &mut probs);
        probs
    }
}

impl GestureClassifier for MlpModel {
    fn kind(&self) -> ModelKind {
        ModelKind::MlpV1
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn hidden_units(&self) -> usize {
        self.hidden_size
    }

    fn scaling(&self) -> &MinMaxScaling {
        &self.scaling
    }

    fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        if features.len() != self.input_dim || self.labels.is_empty() || self.hidden_size == 0 {
            return Vec::new();
        }
        self.forward(features)
    }

    fn weights(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(parameter_count(
            self.input_dim,
            self.hidden_size,
            self.labels.len(),
        ));
        out.extend_from_slice(&self.weights1);
        out.extend_from_slice(&self.bias1);
        out.extend_from_slice(&self.weights2);
        out.extend_from_slice(&self.bias2);
        out
    }
}
