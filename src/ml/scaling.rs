use serde::{Deserialize, Serialize};

const MIN_RANGE: f32 = 1e-6;

/// Per-feature min-max scaling into `[0, 1]`, fitted once over a training set.
///
/// Features whose observed range is (nearly) zero scale to `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaling {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl MinMaxScaling {
    /// Fit over `rows`, each at least `dim` long.
    pub fn fit<R: AsRef<[f32]>>(rows: &[R], dim: usize) -> Self {
        if rows.is_empty() {
            return Self::identity(dim);
        }
        let mut min = vec![f32::INFINITY; dim];
        let mut max = vec![f32::NEG_INFINITY; dim];
        for row in rows {
            for (i, &v) in row.as_ref().iter().take(dim).enumerate() {
                min[i] = min[i].min(v);
                max[i] = max[i].max(v);
            }
        }
        Self { min, max }
    }

    /// Scaling that leaves values in `[0, 1]` unchanged.
    pub fn identity(dim: usize) -> Self {
        Self {
            min: vec![0.0; dim],
            max: vec![1.0; dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.min.len()
    }

    pub fn is_consistent(&self, dim: usize) -> bool {
        self.min.len() == dim
            && self.max.len() == dim
            && self
                .min
                .iter()
                .zip(&self.max)
                .all(|(lo, hi)| lo.is_finite() && hi.is_finite())
    }

    pub fn apply_into(&self, features: &[f32], out: &mut [f32]) {
        for (i, (slot, &v)) in out.iter_mut().zip(features).enumerate() {
            let lo = self.min[i];
            let range = self.max[i] - lo;
            *slot = if range.abs() < MIN_RANGE {
                0.0
            } else {
                (v - lo) / range
            };
        }
    }

    pub fn apply(&self, features: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0f32; features.len().min(self.dim())];
        self.apply_into(features, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_then_apply_maps_to_unit_range() {
        let rows = vec![vec![0.0, 5.0, 2.0], vec![10.0, 5.0, 4.0]];
        let scaling = MinMaxScaling::fit(&rows, 3);
        assert_eq!(scaling.min, vec![0.0, 5.0, 2.0]);
        assert_eq!(scaling.max, vec![10.0, 5.0, 4.0]);

        let out = scaling.apply(&[5.0, 7.0, 4.0]);
        assert_eq!(out, vec![0.5, 0.0, 1.0]);
    }

    #[test]
    fn consistency_checks_length_and_finiteness() {
        let scaling = MinMaxScaling::identity(2);
        assert!(scaling.is_consistent(2));
        assert!(!scaling.is_consistent(3));
        let broken = MinMaxScaling {
            min: vec![f32::NAN, 0.0],
            max: vec![1.0, 1.0],
        };
        assert!(!broken.is_consistent(2));
    }
}
