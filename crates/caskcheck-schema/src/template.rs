//! `#{...}` interpolation templates used in `url`, `app` and `pkg` stanzas.

use thiserror::Error;

pub const VERSION_PLACEHOLDER: &str = "version";
pub const ARCH_PLACEHOLDER: &str = "arch";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated interpolation at byte {0}")]
    Unterminated(usize),
    #[error("empty interpolation at byte {0}")]
    Empty(usize),
}

/// One `#{...}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Full expression between the braces, trimmed.
    pub expr: &'a str,
    /// Leading identifier of the expression: `version` for `version.csv.first`.
    pub root: &'a str,
}

pub fn placeholders(template: &str) -> Result<Vec<Placeholder<'_>>, TemplateError> {
    let mut out = Vec::new();
    let mut rest = template;
    let mut offset = 0;
    while let Some(start) = rest.find("#{") {
        let after = &rest[start + 2..];
        let Some(len) = after.find('}') else {
            return Err(TemplateError::Unterminated(offset + start));
        };
        let expr = after[..len].trim();
        if expr.is_empty() {
            return Err(TemplateError::Empty(offset + start));
        }
        let root_len = expr
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(expr.len());
        out.push(Placeholder {
            expr,
            root: &expr[..root_len],
        });
        let consumed = start + 2 + len + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }
    Ok(out)
}

/// Substitute bare `#{version}` and `#{arch}` placeholders.
///
/// Expressions other than the bare names (method calls on `version`, or
/// `#{arch}` when no architecture value is given) are left in place.
pub fn expand(template: &str, version: &str, arch: Option<&str>) -> Result<String, TemplateError> {
    // validates termination before substituting
    placeholders(template)?;
    let mut out = template.replace("#{version}", version);
    if let Some(arch) = arch {
        out = out.replace("#{arch}", arch);
    }
    Ok(out)
}
