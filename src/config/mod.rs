//! TOML-backed settings for training and inference.

mod io;
mod types;

pub use io::{CONFIG_FILE_NAME, config_path, load_from_path, load_or_default, save, save_to_path};
pub use types::{AppConfig, ConfigError, InferenceSettings, ModelSettings, TrainingSettings};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = load_from_path(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, AppConfig::default());
        let options = config.train_options();
        assert_eq!(options.epochs, 50);
        assert_eq!(options.batch_size, 32);
        assert!((options.learning_rate - 0.2).abs() < f32::EPSILON);
        assert_eq!(options.input_size, 63);
        assert_eq!(options.output_size, None);
        assert_eq!(config.tick_interval(), Duration::from_millis(125));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[training]\nepochs = 5\n\n[model]\ndebug = true\noutput_size = 3\n",
        )
        .unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.training.epochs, 5);
        assert_eq!(config.training.batch_size, 32);
        assert!(config.model.debug);
        assert_eq!(config.model.output_size, Some(3));
        assert_eq!(config.model.hidden_units, 16);
        assert_eq!(config.inference.tick_interval_ms, 125);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut config = AppConfig::default();
        config.training.learning_rate = 0.05;
        config.inference.tick_interval_ms = 200;

        save_to_path(&config, &path).unwrap();
        assert_eq!(load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[training\nepochs = ").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
