use crate::artifact::ModelArtifact;
use crate::events::GestureEvent;
use crate::landmarks::{HandFrame, flatten};

/// Label bookkeeping of the inference loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceState {
    pub enabled: bool,
    pub last_observed: Option<String>,
    pub last_emitted: Option<String>,
}

impl InferenceState {
    /// Fresh state for a newly started loop.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Classify the first hand of `frame` and return the events of this tick.
    ///
    /// Nothing happens while disabled, without a model, or without a
    /// well-formed hand. At most one `LabelChanged` is produced per tick.
    pub fn tick(
        &mut self,
        frame: Option<&HandFrame>,
        model: Option<&ModelArtifact>,
    ) -> Vec<GestureEvent> {
        if !self.enabled {
            return Vec::new();
        }
        let (Some(frame), Some(model)) = (frame, model) else {
            return Vec::new();
        };
        let Some(hand) = frame.first_hand() else {
            return Vec::new();
        };
        let Some(features) = flatten(hand) else {
            tracing::debug!("Skipping hand with {} landmarks", hand.len());
            return Vec::new();
        };
        let Some(best) = model.top(&features) else {
            return Vec::new();
        };

        let mut events = Vec::with_capacity(2);
        self.last_observed = Some(best.label.clone());
        events.push(GestureEvent::LabelObserved {
            label: best.label.clone(),
            confidence: best.confidence,
        });
        if self.last_emitted.as_deref() != Some(best.label.as_str()) {
            tracing::debug!(
                "Gesture changed: {:?} -> {} ({:.2})",
                self.last_emitted,
                best.label,
                best.confidence
            );
            let previous = self.last_emitted.replace(best.label.clone());
            events.push(GestureEvent::LabelChanged {
                previous,
                current: best.label,
            });
        }
        events
    }
}
