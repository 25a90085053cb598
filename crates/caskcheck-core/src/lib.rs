//! Consistency checks for parsed cask manifests.
//!
//! This crate runs the validation pipeline on top of `caskcheck-schema`:
//! `validate` turns a `CaskRecord` into an ordered list of `Violation`s, the
//! `batch` module applies it to files and directories (with cross-file
//! duplicate-token detection), and `ValidatorConfig` carries the TOML
//! settings for a scan.

pub mod batch;
pub mod config;
pub mod validate;

#[cfg(test)]
mod proptest_validate;

pub use batch::{list_manifests, validate_dir, validate_path, BatchReport, FileOutcome, FileReport};
pub use config::{ConfigError, ValidatorConfig, CONFIG_FILE_NAME};
pub use validate::{validate, Severity, Violation, ViolationKind, HOME_TOKEN};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
