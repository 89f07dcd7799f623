use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use handsign::artifact::{ArtifactOrigin, ModelArtifact};
use handsign::dataset::Dataset;
use handsign::landmarks::{FEATURE_LEN, LANDMARK_COUNT, Landmark, Sample};
use handsign::training::{TrainOptions, Trainer};

const LABELS: [&str; 4] = ["open", "closed", "point", "peace"];
const SAMPLES_PER_CLASS: usize = 25;

fn sample(value: f32) -> Sample {
    Sample::new(
        (0..LANDMARK_COUNT)
            .map(|i| Landmark::new(value + i as f32 * 0.01, value, 0.0))
            .collect(),
    )
}

fn setup_dataset() -> Dataset {
    let mut dataset = Dataset::new();
    for (class_idx, label) in LABELS.iter().enumerate() {
        for i in 0..SAMPLES_PER_CLASS {
            let value = class_idx as f32 * 0.25 + i as f32 * 0.001;
            dataset.add_sample(label, sample(value)).expect("seed sample");
        }
    }
    dataset
}

fn setup_model(dataset: &Dataset) -> ModelArtifact {
    let options = TrainOptions {
        epochs: 5,
        ..TrainOptions::default()
    };
    let classifier = Trainer::new(options)
        .train(dataset, |_, _| {})
        .expect("train");
    ModelArtifact::new(classifier, 1, ArtifactOrigin::Trained)
}

fn bench_classify(c: &mut Criterion) {
    let model = setup_model(&setup_dataset());
    let features: Vec<f32> = (0..FEATURE_LEN).map(|i| i as f32 / FEATURE_LEN as f32).collect();
    c.bench_with_input(
        BenchmarkId::new("classify", LABELS.len()),
        &features,
        |b, features| {
            b.iter(|| model.classify(black_box(features)));
        },
    );
}

fn bench_train_epoch(c: &mut Criterion) {
    let dataset = setup_dataset();
    let options = TrainOptions {
        epochs: 1,
        ..TrainOptions::default()
    };
    c.bench_with_input(
        BenchmarkId::new("train_epoch", dataset.sample_count()),
        &dataset,
        |b, dataset| {
            b.iter(|| {
                Trainer::new(options.clone())
                    .train(black_box(dataset), |_, _| {})
                    .expect("train");
            });
        },
    );
}

criterion_group!(benches, bench_classify, bench_train_epoch);
criterion_main!(benches);
