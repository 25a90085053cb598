//! Validation of one manifest file or a whole directory of them.

use crate::config::ValidatorConfig;
use crate::validate::{validate, Violation, ViolationKind};
use crate::CoreError;
use caskcheck_schema::{parse_cask_file, CaskRecord, CaskToken, ParseError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Checked {
        token: CaskToken,
        violations: Vec<Violation>,
    },
    ParseFailed {
        reason: String,
    },
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileReport {
    fn from_result(path: PathBuf, result: Result<CaskRecord, ParseError>) -> Self {
        let outcome = match result {
            Ok(cask) => {
                let violations = validate(&cask);
                debug!(
                    "{}: token '{}', {} violation(s)",
                    path.display(),
                    cask.token,
                    violations.len()
                );
                FileOutcome::Checked {
                    token: cask.token,
                    violations,
                }
            }
            Err(e) => {
                warn!("{}: {e}", path.display());
                FileOutcome::ParseFailed {
                    reason: e.to_string(),
                }
            }
        };
        Self { path, outcome }
    }

    pub fn violations(&self) -> &[Violation] {
        match &self.outcome {
            FileOutcome::Checked { violations, .. } => violations,
            FileOutcome::ParseFailed { .. } => &[],
        }
    }

    pub fn parse_failed(&self) -> bool {
        matches!(self.outcome, FileOutcome::ParseFailed { .. })
    }

    /// A parse error or any error-severity violation.
    pub fn is_failure(&self) -> bool {
        self.parse_failed() || self.violations().iter().any(Violation::is_error)
    }
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        !self.files.iter().any(FileReport::is_failure)
    }

    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_failure()).count()
    }

    pub fn has_parse_errors(&self) -> bool {
        self.files.iter().any(FileReport::parse_failed)
    }
}

pub fn validate_path(path: &Path) -> FileReport {
    FileReport::from_result(path.to_path_buf(), parse_cask_file(path))
}

/// Validate every manifest in `dir` (non-recursive, sorted by file name).
///
/// Parse failures are recorded per file and never stop the scan. After all
/// files are checked, tokens declared by more than one file are reported on
/// each later file as `DuplicateToken`.
pub fn validate_dir(dir: &Path, config: &ValidatorConfig) -> Result<BatchReport, CoreError> {
    let paths = list_manifests(dir, &config.extension)?;
    debug!("scanning {} manifest(s) in {}", paths.len(), dir.display());

    let mut files: Vec<FileReport> = paths.iter().map(|p| validate_path(p)).collect();
    flag_duplicates(&mut files, config);
    Ok(BatchReport { files })
}

pub fn list_manifests(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, CoreError> {
    let entries = fs::read_dir(dir).map_err(|source| CoreError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == extension) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn flag_duplicates(files: &mut [FileReport], config: &ValidatorConfig) {
    let mut first_seen: BTreeMap<CaskToken, PathBuf> = BTreeMap::new();
    for file in files.iter_mut() {
        let FileOutcome::Checked { token, violations } = &mut file.outcome else {
            continue;
        };
        match first_seen.get(&*token) {
            Some(first) => {
                debug!("duplicate token '{token}' in {}", file.path.display());
                violations.push(Violation {
                    kind: ViolationKind::DuplicateToken,
                    severity: config.duplicate_tokens,
                    message: format!("token '{token}' is already declared in {}", first.display()),
                });
            }
            None => {
                first_seen.insert(token.clone(), file.path.clone());
            }
        }
    }
}
