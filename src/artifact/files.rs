use std::path::{Path, PathBuf};

use super::{ArtifactError, ArtifactPayload, METADATA_MARKER, ModelArtifact, load, save};
use crate::fs_atomic::write_atomic;

/// Write the three payloads of `artifact` into `dir`, returning their paths.
///
/// Each file is replaced atomically, but the set is not: a failure part way
/// through can leave a mix of old and new files, and the save counts as failed.
pub fn save_to_dir(
    artifact: &ModelArtifact,
    dir: &Path,
    name: &str,
) -> Result<Vec<PathBuf>, ArtifactError> {
    let payloads = save(artifact, name)?;
    std::fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::with_capacity(3);
    for payload in payloads.iter() {
        let path = dir.join(&payload.name);
        write_atomic(&path, &payload.bytes).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    tracing::info!(
        "Saved model v{} ({} labels) to {}",
        artifact.version(),
        artifact.labels().len(),
        dir.display()
    );
    Ok(written)
}

/// Load a model from user-selected files; payload names are the file names.
pub fn load_from_paths<P: AsRef<Path>>(
    paths: &[P],
    version: u64,
) -> Result<ModelArtifact, ArtifactError> {
    let mut payloads = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        payloads.push(ArtifactPayload::new(name, bytes));
    }
    let artifact = load(&payloads, version)?;
    tracing::info!(
        "Loaded model v{} with labels {:?}",
        artifact.version(),
        artifact.labels()
    );
    Ok(artifact)
}

/// Load the files [`save_to_dir`] wrote for `name`.
pub fn load_from_dir(dir: &Path, name: &str, version: u64) -> Result<ModelArtifact, ArtifactError> {
    let paths = [
        dir.join(format!("{name}.json")),
        dir.join(format!("{name}.weights.bin")),
        dir.join(format!("{name}{METADATA_MARKER}.json")),
    ];
    load_from_paths(&paths, version)
}
