use std::sync::{Arc, RwLock};

use super::HandFrame;

/// Single-writer, multi-reader slot holding the most recent detector frame.
///
/// Writes replace the whole frame, so readers see either the previous or the
/// new frame, never a mix of both.
#[derive(Debug, Clone, Default)]
pub struct LatestFrame {
    inner: Arc<RwLock<Option<Arc<HandFrame>>>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored frame and return the shared handle to it.
    pub fn publish(&self, frame: HandFrame) -> Arc<HandFrame> {
        let frame = Arc::new(frame);
        if let Ok(mut slot) = self.inner.write() {
            *slot = Some(Arc::clone(&frame));
        }
        frame
    }

    /// The most recent frame, if any has been published since the last clear.
    pub fn latest(&self) -> Option<Arc<HandFrame>> {
        self.inner.read().ok().and_then(|slot| slot.clone())
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = None;
        }
    }
}
