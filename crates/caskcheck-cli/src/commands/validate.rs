use super::{format_violation, json_pretty, EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_SUCCESS};
use caskcheck_core::{
    validate_dir, validate_path, BatchReport, FileOutcome, FileReport, ValidatorConfig,
};
use std::path::Path;
use tracing::debug;

/// `config` is only accepted together with `all`; the CLI enforces this.
pub fn run(path: &Path, all: bool, config: Option<&Path>, json: bool) -> Result<u8, String> {
    if all {
        return run_all(path, config, json);
    }
    if path.is_dir() {
        return Err(format!(
            "{} is a directory; pass --all to validate every cask in it",
            path.display()
        ));
    }

    let report = validate_path(path);
    if let FileOutcome::ParseFailed { reason } = &report.outcome {
        if json {
            println!("{}", json_pretty(&report)?);
        }
        return Err(format!("failed to parse manifest {}: {reason}", path.display()));
    }

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        for v in report.violations() {
            println!("{}", format_violation(v));
        }
    }
    Ok(if report.is_failure() {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    })
}

fn run_all(dir: &Path, config: Option<&Path>, json: bool) -> Result<u8, String> {
    let config =
        ValidatorConfig::discover(config, Some(dir)).map_err(|e| format!("config error: {e}"))?;
    debug!("scan config: {config:?}");

    let report = validate_dir(dir, &config).map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(exit_code(&report))
}

fn exit_code(report: &BatchReport) -> u8 {
    if report.has_parse_errors() {
        EXIT_MANIFEST_ERROR
    } else if report.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

fn print_summary(report: &BatchReport) {
    for file in &report.files {
        println!("{}", summary_line(file));
        for v in file.violations() {
            println!("    {}", format_violation(v));
        }
    }
    println!();
    println!(
        "{} file(s) checked, {} failed.",
        report.files.len(),
        report.failed_count()
    );
}

fn summary_line(file: &FileReport) -> String {
    let path = file.path.display();
    match &file.outcome {
        FileOutcome::ParseFailed { reason } => format!("✗ {path}: {reason}"),
        FileOutcome::Checked { violations, .. } if violations.is_empty() => format!("✓ {path}"),
        FileOutcome::Checked { violations, .. } => {
            let icon = if file.is_failure() { "✗" } else { "⚠" };
            format!("{icon} {path} ({} finding(s))", violations.len())
        }
    }
}
