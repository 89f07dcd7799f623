//! End-to-end gesture workflow: collect data, train, persist, and test live.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::artifact::{
    self, ArtifactError, ArtifactOrigin, ArtifactPayload, ArtifactPayloads, ModelArtifact,
};
use crate::config::AppConfig;
use crate::dataset::{Dataset, DatasetRecorder, DatasetSummary, ValidationError};
use crate::error::HandsignError;
use crate::events::EventSender;
use crate::inference::InferenceLoop;
use crate::landmarks::{LandmarkDetector, LandmarkFeed, LatestFrame};
use crate::model_slot::{Adoption, ModelSlot};
use crate::training::{
    TrainingError, TrainingJob, TrainingMessage, TrainingSession, Trainer, spawn_training,
};

const WAIT_POLL: Duration = Duration::from_millis(50);

fn no_active_run() -> HandsignError {
    TrainingError::Backend("no training run in progress".to_string()).into()
}

/// Owns every pipeline component for one user session.
///
/// Models produced by training and loading both go through the versioned
/// [`ModelSlot`]; the inference loop only ever reads the adopted model.
pub struct GestureSession {
    config: AppConfig,
    dataset: Option<Dataset>,
    frames: LatestFrame,
    models: ModelSlot,
    feed: LandmarkFeed,
    inference: InferenceLoop,
    training: Option<TrainingJob>,
    training_tx: Sender<TrainingMessage>,
    training_rx: Receiver<TrainingMessage>,
    last_training: Option<TrainingSession>,
}

impl GestureSession {
    pub fn new(config: AppConfig, events: EventSender) -> Self {
        let frames = LatestFrame::new();
        let models = ModelSlot::new();
        let feed = LandmarkFeed::new(frames.clone(), events.clone());
        let inference = InferenceLoop::new(frames.clone(), models.clone(), events)
            .with_interval(config.tick_interval());
        let (training_tx, training_rx) = mpsc::channel();
        Self {
            config,
            dataset: None,
            frames,
            models,
            feed,
            inference,
            training: None,
            training_tx,
            training_rx,
            last_training: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn frames(&self) -> LatestFrame {
        self.frames.clone()
    }

    pub fn models(&self) -> ModelSlot {
        self.models.clone()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn current_model(&self) -> Option<Arc<ModelArtifact>> {
        self.models.current()
    }

    /// Session of the last finished training run.
    pub fn last_training(&self) -> Option<&TrainingSession> {
        self.last_training.as_ref()
    }

    /// Replace the training data with an upload document.
    ///
    /// The previous dataset is kept when the document is rejected.
    pub fn load_training_data_json(&mut self, text: &str) -> Result<DatasetSummary, HandsignError> {
        let dataset = Dataset::from_json(text)?;
        Ok(self.set_dataset(dataset))
    }

    pub fn load_training_data(&mut self, path: &Path) -> Result<DatasetSummary, HandsignError> {
        let dataset = Dataset::load(path)?;
        Ok(self.set_dataset(dataset))
    }

    pub fn set_dataset(&mut self, dataset: Dataset) -> DatasetSummary {
        let summary = dataset.summary();
        tracing::info!("Data loaded: {summary}");
        self.dataset = Some(dataset);
        summary
    }

    /// Record the current hand pose under `label`.
    pub fn capture_sample(&mut self, label: &str) -> Result<usize, HandsignError> {
        let recorder = DatasetRecorder::new(self.frames.clone());
        let dataset = self.dataset.get_or_insert_with(Dataset::new);
        Ok(recorder.capture(dataset, label)?)
    }

    /// Start the landmark detector feeding this session.
    pub fn enable_camera<D>(&mut self, detector: D) -> Result<(), HandsignError>
    where
        D: LandmarkDetector + 'static,
    {
        self.feed.enable(detector)?;
        Ok(())
    }

    pub fn disable_camera(&mut self) {
        self.feed.disable();
    }

    pub fn is_camera_enabled(&self) -> bool {
        self.feed.is_running()
    }

    /// Train on the current dataset in this thread and adopt the result.
    pub fn train(
        &mut self,
        on_epoch: impl FnMut(usize, f32),
    ) -> Result<Adoption, HandsignError> {
        let dataset = self.dataset.as_ref().ok_or(ValidationError::NoDataset)?;
        let version = self.models.reserve_version();
        let mut trainer = Trainer::new(self.config.train_options());
        let result = trainer.train(dataset, on_epoch);
        self.last_training = Some(trainer.session().clone());
        let classifier = result?;
        Ok(self
            .models
            .adopt(ModelArtifact::new(classifier, version, ArtifactOrigin::Trained)))
    }

    /// Train on a background thread; progress arrives through
    /// [`GestureSession::poll_training`].
    pub fn start_training(&mut self) -> Result<u64, HandsignError> {
        if self
            .training
            .as_ref()
            .is_some_and(|job| !job.is_finished())
        {
            return Err(TrainingError::AlreadyRunning.into());
        }
        let dataset = self.dataset.clone().ok_or(ValidationError::NoDataset)?;
        let version = self.models.reserve_version();
        let job = spawn_training(
            dataset,
            self.config.train_options(),
            version,
            self.training_tx.clone(),
        );
        self.training = Some(job);
        Ok(version)
    }

    pub fn is_training(&self) -> bool {
        self.training.is_some()
    }

    pub fn cancel_training(&self) {
        if let Some(job) = &self.training {
            job.cancel();
        }
    }

    /// Drain pending progress without blocking.
    ///
    /// Returns the adoption result once the active run has finished.
    pub fn poll_training(
        &mut self,
        mut on_epoch: impl FnMut(usize, f32),
    ) -> Result<Option<Adoption>, HandsignError> {
        loop {
            match self.training_rx.try_recv() {
                Ok(message) => {
                    if let Some(adoption) = self.handle_training_message(message, &mut on_epoch)? {
                        return Ok(Some(adoption));
                    }
                }
                Err(_) => return Ok(None),
            }
        }
    }

    /// Block until the active run finishes.
    pub fn wait_for_training(
        &mut self,
        mut on_epoch: impl FnMut(usize, f32),
    ) -> Result<Adoption, HandsignError> {
        loop {
            let Some(job) = &self.training else {
                return Err(no_active_run());
            };
            match self.training_rx.recv_timeout(WAIT_POLL) {
                Ok(message) => {
                    if let Some(adoption) = self.handle_training_message(message, &mut on_epoch)? {
                        return Ok(adoption);
                    }
                }
                Err(RecvTimeoutError::Timeout) if !job.is_finished() => {}
                Err(_) => {
                    // The worker exited without reporting; drain what it left.
                    if let Some(adoption) = self.poll_training(&mut on_epoch)? {
                        return Ok(adoption);
                    }
                    self.training = None;
                    return Err(no_active_run());
                }
            }
        }
    }

    fn handle_training_message(
        &mut self,
        message: TrainingMessage,
        on_epoch: &mut dyn FnMut(usize, f32),
    ) -> Result<Option<Adoption>, HandsignError> {
        let active = self.training.as_ref().map(TrainingJob::version);
        match message {
            TrainingMessage::Epoch {
                version,
                epoch,
                loss,
            } => {
                if active == Some(version) {
                    on_epoch(epoch, loss);
                }
                Ok(None)
            }
            TrainingMessage::Finished {
                version,
                session,
                result,
            } => {
                if active != Some(version) {
                    tracing::debug!("Ignoring finished training run v{version}");
                    return Ok(None);
                }
                if let Some(job) = self.training.take() {
                    job.cancel_and_join();
                }
                self.last_training = Some(session);
                let classifier = result?;
                Ok(Some(self.models.adopt(ModelArtifact::new(
                    classifier,
                    version,
                    ArtifactOrigin::Trained,
                ))))
            }
        }
    }

    /// Serialize the adopted model into its three payloads.
    pub fn save_model_payloads(&self, name: &str) -> Result<ArtifactPayloads, HandsignError> {
        let model = self.models.current().ok_or(ArtifactError::NoModel)?;
        Ok(artifact::save(&model, name)?)
    }

    pub fn save_model(&self, dir: &Path, name: &str) -> Result<Vec<PathBuf>, HandsignError> {
        let model = self.models.current().ok_or(ArtifactError::NoModel)?;
        Ok(artifact::save_to_dir(&model, dir, name)?)
    }

    /// Load a model from payloads; the current model is kept on failure.
    pub fn load_model_payloads(
        &mut self,
        payloads: &[ArtifactPayload],
    ) -> Result<Adoption, HandsignError> {
        let version = self.models.reserve_version();
        let loaded = artifact::load(payloads, version)?;
        Ok(self.models.adopt(loaded))
    }

    pub fn load_model_from_paths<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> Result<Adoption, HandsignError> {
        let version = self.models.reserve_version();
        let loaded = artifact::load_from_paths(paths, version)?;
        Ok(self.models.adopt(loaded))
    }

    pub fn load_model_from_dir(&mut self, dir: &Path, name: &str) -> Result<Adoption, HandsignError> {
        let version = self.models.reserve_version();
        let loaded = artifact::load_from_dir(dir, name, version)?;
        Ok(self.models.adopt(loaded))
    }

    /// Begin classifying live frames.
    pub fn start_testing(&mut self) -> Result<(), HandsignError> {
        self.inference.start()?;
        Ok(())
    }

    pub fn stop_testing(&mut self) {
        self.inference.stop();
    }

    pub fn is_testing(&self) -> bool {
        self.inference.is_running()
    }
}

impl Drop for GestureSession {
    fn drop(&mut self) {
        self.inference.stop();
        if let Some(job) = self.training.take() {
            job.cancel_and_join();
        }
        self.feed.disable();
    }
}
