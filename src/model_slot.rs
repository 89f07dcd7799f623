//! The current model, replaced only by newer train or load completions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::artifact::ModelArtifact;

/// Outcome of offering a finished model to the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adoption {
    Adopted { version: u64 },
    /// A newer operation already supplied the current model.
    Stale { version: u64, current: u64 },
}

/// Shared holder of the adopted [`ModelArtifact`].
///
/// Every train or load reserves a version when it starts. A finished model is
/// adopted only if its version is higher than the adopted one, so a slow
/// operation can never overwrite the result of one started after it.
#[derive(Debug, Clone, Default)]
pub struct ModelSlot {
    next_version: Arc<AtomicU64>,
    current: Arc<RwLock<Option<Arc<ModelArtifact>>>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the version for an operation that is about to start.
    pub fn reserve_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn adopt(&self, artifact: ModelArtifact) -> Adoption {
        let version = artifact.version();
        let Ok(mut current) = self.current.write() else {
            return Adoption::Stale {
                version,
                current: 0,
            };
        };
        if let Some(existing) = current.as_ref() {
            if existing.version() >= version {
                let current = existing.version();
                tracing::warn!(
                    "Discarding stale {} model v{version} (current v{current})",
                    artifact.origin()
                );
                return Adoption::Stale { version, current };
            }
        }
        tracing::info!(
            "Adopted {} model v{version} with {} labels",
            artifact.origin(),
            artifact.labels().len()
        );
        *current = Some(Arc::new(artifact));
        Adoption::Adopted { version }
    }

    /// The adopted model, if any.
    pub fn current(&self) -> Option<Arc<ModelArtifact>> {
        self.current.read().ok().and_then(|slot| slot.clone())
    }

    pub fn current_version(&self) -> Option<u64> {
        self.current().map(|artifact| artifact.version())
    }
}
