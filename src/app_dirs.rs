//! Where handsign keeps its files: `<base>/.handsign` holds `config.toml`,
//! `logs/` and `models/`. The base is the OS config directory unless
//! `HANDSIGN_CONFIG_HOME` names another one.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

pub const APP_DIR_NAME: &str = ".handsign";
/// Environment variable that replaces the OS config root.
pub const CONFIG_HOME_ENV: &str = "HANDSIGN_CONFIG_HOME";

const LOGS_DIR: &str = "logs";
const MODELS_DIR: &str = "models";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No config directory available for handsign files")]
    NoBaseDir,
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The `.handsign` root, created on demand.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    root_in(&base_dir().ok_or(AppDirError::NoBaseDir)?)
}

pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    subdir_in(&app_root_dir()?, LOGS_DIR)
}

/// Default location of saved gesture models.
pub fn models_dir() -> Result<PathBuf, AppDirError> {
    subdir_in(&app_root_dir()?, MODELS_DIR)
}

fn base_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_HOME_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()),
    }
}

fn root_in(base: &Path) -> Result<PathBuf, AppDirError> {
    subdir_in(base, APP_DIR_NAME)
}

fn subdir_in(parent: &Path, name: &str) -> Result<PathBuf, AppDirError> {
    let path = parent.join(name);
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
