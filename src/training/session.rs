#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainingStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Progress of one training run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainingSession {
    epoch: usize,
    loss_history: Vec<f32>,
    status: TrainingStatus,
}

impl TrainingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(&mut self) {
        *self = Self {
            status: TrainingStatus::Running,
            ..Self::default()
        };
    }

    pub(crate) fn record_epoch(&mut self, epoch: usize, loss: f32) {
        self.epoch = epoch;
        self.loss_history.push(loss);
    }

    pub(crate) fn complete(&mut self) {
        self.status = TrainingStatus::Completed;
    }

    pub(crate) fn fail(&mut self) {
        self.status = TrainingStatus::Failed;
    }

    /// Last completed epoch, 0 before the first one.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn loss_history(&self) -> &[f32] {
        &self.loss_history
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.loss_history.last().copied()
    }

    pub fn status(&self) -> TrainingStatus {
        self.status
    }

    /// `(epoch, ln(loss))` points for a log-scale loss chart.
    ///
    /// Losses that are not strictly positive and finite have no logarithm and
    /// are left out.
    pub fn chart_points(&self) -> Vec<(usize, f32)> {
        self.loss_history
            .iter()
            .enumerate()
            .filter(|(_, loss)| loss.is_finite() && **loss > 0.0)
            .map(|(idx, loss)| (idx + 1, loss.ln()))
            .collect()
    }
}
