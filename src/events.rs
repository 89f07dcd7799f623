//! Events delivered to the owner of the pipeline.
//!
//! Producers never touch shared consumer state; every handoff is a message on
//! an owner-supplied channel.

use std::sync::Arc;
use std::sync::mpsc::Sender;

use uuid::Uuid;

use crate::landmarks::HandFrame;

/// Channel end that pipeline components emit into.
pub type EventSender = Sender<GestureEvent>;

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    /// A new detector frame was published.
    Prediction {
        frame: Arc<HandFrame>,
        timestamp_ms: f64,
        instance_id: Uuid,
    },
    /// The landmark feed started producing frames.
    WebcamEnabled { instance_id: Uuid },
    /// The landmark feed failed.
    Error { instance_id: Uuid, message: String },
    /// Top label of one inference tick, emitted on every tick with a hand.
    LabelObserved { label: String, confidence: f32 },
    /// The top label differs from the last emitted one.
    LabelChanged {
        previous: Option<String>,
        current: String,
    },
}
