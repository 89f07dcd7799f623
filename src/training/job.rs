use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use super::{CancelToken, TrainOptions, Trainer, TrainingError, TrainingSession};
use crate::dataset::Dataset;
use crate::ml::GestureClassifier;

/// Progress of a background training run, tagged with its model version.
#[derive(Debug)]
pub enum TrainingMessage {
    Epoch {
        version: u64,
        epoch: usize,
        loss: f32,
    },
    Finished {
        version: u64,
        session: TrainingSession,
        result: Result<Arc<dyn GestureClassifier>, TrainingError>,
    },
}

/// Handle to a training run on its own thread.
#[derive(Debug)]
pub struct TrainingJob {
    version: u64,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl TrainingJob {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel and wait for the thread to exit.
    pub fn cancel_and_join(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Train on a background thread, streaming [`TrainingMessage`]s to `tx`.
///
/// The dataset is moved into the job so it cannot change during the run.
pub fn spawn_training(
    dataset: Dataset,
    options: TrainOptions,
    version: u64,
    tx: Sender<TrainingMessage>,
) -> TrainingJob {
    let cancel = CancelToken::new();
    let job_cancel = cancel.clone();
    let handle = thread::spawn(move || {
        let mut trainer = Trainer::with_cancel(options, job_cancel);
        let progress = tx.clone();
        let result = trainer.train(&dataset, |epoch, loss| {
            let _ = progress.send(TrainingMessage::Epoch {
                version,
                epoch,
                loss,
            });
        });
        let _ = tx.send(TrainingMessage::Finished {
            version,
            session: trainer.session().clone(),
            result,
        });
    });
    TrainingJob {
        version,
        cancel,
        handle: Some(handle),
    }
}
