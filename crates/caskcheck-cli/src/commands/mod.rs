pub mod completions;
pub mod inspect;
pub mod man_pages;
pub mod validate;

use caskcheck_core::{Severity, Violation};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_CONFIG_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// `<kind>: <message>`, with the kind styled by severity on a terminal.
pub fn format_violation(v: &Violation) -> String {
    use console::Style;
    let style = match v.severity {
        Severity::Error => Style::new().red().bold(),
        Severity::Warning => Style::new().yellow(),
    };
    format!("{}: {}", style.apply_to(v.kind), v.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use caskcheck_core::ViolationKind;

    #[test]
    fn json_pretty_serializes_string() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn format_violation_keeps_kind_and_message() {
        let v = Violation::error(ViolationKind::InvalidChecksum, "sha256 arm is bad");
        let line = console::strip_ansi_codes(&format_violation(&v)).into_owned();
        assert_eq!(line, "InvalidChecksum: sha256 arm is bad");
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_MANIFEST_ERROR);
        assert_ne!(EXIT_MANIFEST_ERROR, EXIT_CONFIG_ERROR);
    }
}
