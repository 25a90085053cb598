use crate::validate::Severity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in a scanned directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "caskcheck.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config: extension must not be empty")]
    EmptyExtension,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// File extension (without the dot) of manifests picked up by a directory scan.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Severity of `DuplicateToken` findings across a batch.
    #[serde(default = "default_duplicate_tokens")]
    pub duplicate_tokens: Severity,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            duplicate_tokens: default_duplicate_tokens(),
        }
    }
}

fn default_extension() -> String {
    "rb".to_owned()
}

fn default_duplicate_tokens() -> Severity {
    Severity::Warning
}

impl ValidatorConfig {
    pub fn from_toml_str(input: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        let extension = config.extension.trim().trim_start_matches('.').to_owned();
        if extension.is_empty() {
            return Err(ConfigError::EmptyExtension);
        }
        Ok(Self { extension, ..config })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Load `explicit` if given, else `caskcheck.toml` in `dir` when present,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>, dir: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(candidate) = dir.map(|d| d.join(CONFIG_FILE_NAME)) {
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }
        Ok(Self::default())
    }
}
