use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};

use super::MlpModel;
use crate::dataset::TrainingExample;
use crate::ml::{MinMaxScaling, softmax_into};
use crate::training::{CancelToken, TrainOptions, TrainingError};

const MIN_PROBABILITY: f32 = 1e-7;

/// Mini-batch SGD over `examples`, reporting mean cross-entropy per epoch.
///
/// Scaling is fitted once over the full example set before the first epoch.
/// `cancel` is checked before every epoch; the thread yields after each one.
pub fn train_mlp(
    examples: &[TrainingExample],
    labels: &[String],
    options: &TrainOptions,
    cancel: &CancelToken,
    on_epoch: &mut dyn FnMut(usize, f32),
) -> Result<MlpModel, TrainingError> {
    if examples.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }
    let n_classes = labels.len();
    let d = options.input_size;
    let hidden = options.hidden_units.max(1);
    let batch_size = options.batch_size.max(1);

    let targets = examples
        .iter()
        .map(|example| {
            labels
                .iter()
                .position(|label| *label == example.label)
                .ok_or_else(|| {
                    TrainingError::Backend(format!("unknown label '{}'", example.label))
                })
        })
        .collect::<Result<Vec<usize>, _>>()?;

    let rows: Vec<&[f32]> = examples.iter().map(|e| e.features.as_slice()).collect();
    let scaling = MinMaxScaling::fit(&rows, d);
    let inputs: Vec<Vec<f32>> = rows.iter().map(|row| scaling.apply(row)).collect();

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut weights1 = glorot_uniform(&mut rng, d, hidden);
    let mut bias1 = vec![0.0f32; hidden];
    let mut weights2 = glorot_uniform(&mut rng, hidden, n_classes);
    let mut bias2 = vec![0.0f32; n_classes];

    let mut indices: Vec<usize> = (0..examples.len()).collect();
    let mut hidden_pre = vec![0.0f32; hidden];
    let mut hidden_act = vec![0.0f32; hidden];
    let mut logits = vec![0.0f32; n_classes];
    let mut probs = vec![0.0f32; n_classes];
    let mut d_hidden = vec![0.0f32; hidden];

    for epoch in 1..=options.epochs {
        if cancel.is_cancelled() {
            return Err(TrainingError::Cancelled {
                completed_epochs: epoch - 1,
            });
        }
        if options.shuffle {
            indices.shuffle(&mut rng);
        }
        let mut loss_sum = 0.0f32;

        for batch in indices.chunks(batch_size) {
            let mut d_w1 = vec![0.0f32; weights1.len()];
            let mut d_b1 = vec![0.0f32; bias1.len()];
            let mut d_w2 = vec![0.0f32; weights2.len()];
            let mut d_b2 = vec![0.0f32; bias2.len()];

            for &idx in batch {
                let x = &inputs[idx];
                for h in 0..hidden {
                    let row = &weights1[h * d..(h + 1) * d];
                    let sum: f32 = row.iter().zip(x).map(|(w, v)| w * v).sum();
                    hidden_pre[h] = sum + bias1[h];
                    hidden_act[h] = hidden_pre[h].max(0.0);
                }
                for c in 0..n_classes {
                    let row = &weights2[c * hidden..(c + 1) * hidden];
                    let sum: f32 = row.iter().zip(&hidden_act).map(|(w, a)| w * a).sum();
                    logits[c] = sum + bias2[c];
                }
                softmax_into(&logits, &mut probs);

                let y = targets[idx];
                loss_sum -= probs[y].clamp(MIN_PROBABILITY, 1.0).ln();

                d_hidden.fill(0.0);
                for c in 0..n_classes {
                    let target = if c == y { 1.0 } else { 0.0 };
                    let dz2 = probs[c] - target;
                    d_b2[c] += dz2;
                    let base = c * hidden;
                    for h in 0..hidden {
                        d_w2[base + h] += dz2 * hidden_act[h];
                        d_hidden[h] += dz2 * weights2[base + h];
                    }
                }
                for h in 0..hidden {
                    if hidden_pre[h] <= 0.0 {
                        continue;
                    }
                    d_b1[h] += d_hidden[h];
                    let base = h * d;
                    for i in 0..d {
                        d_w1[base + i] += d_hidden[h] * x[i];
                    }
                }
            }

            let scale = options.learning_rate / batch.len() as f32;
            for (w, g) in weights1.iter_mut().zip(&d_w1) {
                *w -= scale * g;
            }
            for (b, g) in bias1.iter_mut().zip(&d_b1) {
                *b -= scale * g;
            }
            for (w, g) in weights2.iter_mut().zip(&d_w2) {
                *w -= scale * g;
            }
            for (b, g) in bias2.iter_mut().zip(&d_b2) {
                *b -= scale * g;
            }
        }

        let loss = loss_sum / examples.len() as f32;
        if !loss.is_finite() {
            return Err(TrainingError::Diverged { epoch });
        }
        tracing::debug!(epoch, loss, "Training epoch complete");
        on_epoch(epoch, loss);
        std::thread::yield_now();
    }

    let model = MlpModel {
        labels: labels.to_vec(),
        input_dim: d,
        hidden_size: hidden,
        weights1,
        bias1,
        weights2,
        bias2,
        scaling,
    };
    model.validate().map_err(TrainingError::Backend)?;
    Ok(model)
}

fn glorot_uniform(rng: &mut StdRng, fan_in: usize, fan_out: usize) -> Vec<f32> {
    let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
    (0..fan_in * fan_out)
        .map(|_| (rng.random::<f32>() * 2.0 - 1.0) * limit)
        .collect()
}
