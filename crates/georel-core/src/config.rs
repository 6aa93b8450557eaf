//! georel Configuration Management
//!
//! Handles configuration from environment variables and TOML config files,
//! with defaults that run the bundled demo model out of the box.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Annotation pipeline configuration
    pub pipeline: PipelineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, applied over defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Pipeline
        if let Some(model) = lookup("GEOREL_MODEL") {
            if model.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "GEOREL_MODEL".to_string(),
                    value: model,
                });
            }
            config.pipeline.model = model;
        }
        if let Some(dir) = lookup("GEOREL_MODEL_DIR") {
            config.pipeline.model_dir = PathBuf::from(dir);
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.logging.json_format = format.parse::<LogFormat>()? == LogFormat::Json;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        Ok(self.with_override(Self::from_env()?))
    }

    /// Merge another configuration over this one, taking only the values
    /// that differ from the defaults
    pub fn with_override(mut self, other: AppConfig) -> Self {
        let pipeline_defaults = PipelineConfig::default();
        if other.pipeline.model != pipeline_defaults.model {
            self.pipeline.model = other.pipeline.model;
        }
        if other.pipeline.model_dir != pipeline_defaults.model_dir {
            self.pipeline.model_dir = other.pipeline.model_dir;
        }

        let logging_defaults = LoggingConfig::default();
        if other.logging.level != logging_defaults.level {
            self.logging.level = other.logging.level;
        }
        if other.logging.json_format != logging_defaults.json_format {
            self.logging.json_format = other.logging.json_format;
        }

        self
    }

    /// Use the given model name instead of the configured one
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.pipeline.model = model.into();
        self
    }
}

/// Annotation pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the model to load (needs parser and NER annotations)
    pub model: String,

    /// Directory holding `<model>.json` files
    pub model_dir: PathBuf,
}

impl PipelineConfig {
    /// Path of the model file this configuration points at
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(format!("{}.json", self.model))
    }

    /// Look a relative `model_dir` up under `base` when it does not exist
    /// under the working directory. Absolute or existing directories are kept.
    pub fn resolve_model_dir(mut self, base: &Path) -> Self {
        if self.model_dir.is_relative() && !self.model_dir.is_dir() {
            let candidate = base.join(&self.model_dir);
            if candidate.is_dir() {
                self.model_dir = candidate;
            }
        }
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "en_core_web_sm".to_string(),
            model_dir: PathBuf::from("models"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            // stdout carries the report, keep stderr quiet unless asked
            level: "warn".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.model, "en_core_web_sm");
        assert_eq!(
            config.pipeline.model_path(),
            PathBuf::from("models/en_core_web_sm.json")
        );
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_from_lookup() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEOREL_MODEL", "en_core_web_md"),
            ("GEOREL_MODEL_DIR", "/opt/models"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.pipeline.model, "en_core_web_md");
        assert_eq!(
            config.pipeline.model_path(),
            PathBuf::from("/opt/models/en_core_web_md.json")
        );
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = AppConfig::from_lookup(lookup_from(&[("LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "LOG_FORMAT"));

        let err = AppConfig::from_lookup(lookup_from(&[("GEOREL_MODEL", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "GEOREL_MODEL"));
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[pipeline]\nmodel = \"demo\"\nmodel_dir = \"/srv/models\"\n\n[logging]\nlevel = \"info\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.pipeline.model, "demo");
        assert_eq!(config.pipeline.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.logging.level, "info");
        // Unset sections fall back to defaults
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_from_file_errors() {
        let err = AppConfig::from_file("/nonexistent/georel.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline\nmodel = ").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_resolve_model_dir_falls_back_to_base() {
        let base = tempfile::tempdir().unwrap();
        let dir_name = "georel-models-resolve-test";
        std::fs::create_dir(base.path().join(dir_name)).unwrap();

        let config = PipelineConfig {
            model: "en_core_web_sm".to_string(),
            model_dir: PathBuf::from(dir_name),
        }
        .resolve_model_dir(base.path());

        assert_eq!(config.model_dir, base.path().join(dir_name));
        assert_eq!(
            config.model_path(),
            base.path().join(dir_name).join("en_core_web_sm.json")
        );
    }

    #[test]
    fn test_resolve_model_dir_keeps_absolute_and_missing() {
        let base = tempfile::tempdir().unwrap();

        let absolute = PipelineConfig {
            model_dir: PathBuf::from("/opt/georel/models"),
            ..PipelineConfig::default()
        }
        .resolve_model_dir(base.path());
        assert_eq!(absolute.model_dir, PathBuf::from("/opt/georel/models"));

        let missing = PipelineConfig {
            model_dir: PathBuf::from("georel-no-such-dir"),
            ..PipelineConfig::default()
        }
        .resolve_model_dir(base.path());
        assert_eq!(missing.model_dir, PathBuf::from("georel-no-such-dir"));
    }

    #[test]
    fn test_override_keeps_non_default_base() {
        let base = AppConfig::default().with_model("from_file");
        let env = AppConfig::from_lookup(lookup_from(&[("LOG_LEVEL", "trace")])).unwrap();

        let merged = base.with_override(env);
        assert_eq!(merged.pipeline.model, "from_file");
        assert_eq!(merged.logging.level, "trace");
    }
}
