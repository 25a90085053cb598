use caskcheck_schema::template::{ARCH_PLACEHOLDER, VERSION_PLACEHOLDER};
use caskcheck_schema::{placeholders, ArtifactVariant, CaskRecord, InstallDirective, LivecheckUrl};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix every zap path must start with.
pub const HOME_TOKEN: &str = "~/";

const SECURE_SCHEME: &str = "https://";
const PLACEHOLDER_CHECKSUM: &str = "0000000000000000000000000000000000000000000000000000000000000000";
const LIVECHECK_URL_SYMBOLS: &[&str] = &["url", "homepage"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    InvalidToken,
    InvalidVersion,
    InvalidChecksum,
    ChecksumArchMismatch,
    BadUrlTemplate,
    MissingMetadata,
    InsecureUrl,
    UnrootedCleanupPath,
    InvalidArtifact,
    UnverifiedUrl,
    InvalidLivecheck,
    DuplicateToken,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::InvalidToken => "InvalidToken",
            ViolationKind::InvalidVersion => "InvalidVersion",
            ViolationKind::InvalidChecksum => "InvalidChecksum",
            ViolationKind::ChecksumArchMismatch => "ChecksumArchMismatch",
            ViolationKind::BadUrlTemplate => "BadUrlTemplate",
            ViolationKind::MissingMetadata => "MissingMetadata",
            ViolationKind::InsecureUrl => "InsecureUrl",
            ViolationKind::UnrootedCleanupPath => "UnrootedCleanupPath",
            ViolationKind::InvalidArtifact => "InvalidArtifact",
            ViolationKind::UnverifiedUrl => "UnverifiedUrl",
            ViolationKind::InvalidLivecheck => "InvalidLivecheck",
            ViolationKind::DuplicateToken => "DuplicateToken",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    #[default]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub message: String,
}

impl Violation {
    pub fn error(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Run every consistency check against `cask`, in a fixed order.
///
/// Checks never short-circuit: the result lists every problem found. An empty
/// result means the record is valid. The function is pure.
pub fn validate(cask: &CaskRecord) -> Vec<Violation> {
    let mut out = Vec::new();
    check_token(cask, &mut out);
    check_version(cask, &mut out);
    for_variants(cask, &mut out, check_variant_version);
    for_variants(cask, &mut out, check_checksums);
    for_variants(cask, &mut out, check_checksum_arch);
    for_variants(cask, &mut out, check_templates);
    check_metadata(cask, &mut out);
    check_cleanup_paths(cask, &mut out);
    for_variants(cask, &mut out, check_artifact);
    for_variants(cask, &mut out, check_verified);
    check_livecheck(cask, &mut out);
    out
}

fn for_variants(
    cask: &CaskRecord,
    out: &mut Vec<Violation>,
    check: fn(&CaskRecord, &ArtifactVariant, &str, &mut Vec<Violation>),
) {
    for v in &cask.variants {
        let scope = match &v.gate {
            Some(gate) => format!(" ({gate})"),
            None => String::new(),
        };
        check(cask, v, &scope, out);
    }
}

fn check_token(cask: &CaskRecord, out: &mut Vec<Violation>) {
    let token = cask.token.as_str();
    let valid = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        out.push(Violation::error(
            ViolationKind::InvalidToken,
            format!("token '{token}' must be non-empty and use only [a-z0-9-]"),
        ));
    }
}

/// `\d+(\.\d+)*`
pub fn is_dotted_numeric(version: &str) -> bool {
    !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

fn check_version(cask: &CaskRecord, out: &mut Vec<Violation>) {
    if let Some(version) = &cask.version {
        push_bad_version(version, "", out);
    } else if cask.variants.is_empty() || cask.variants.iter().any(|v| v.version.is_none()) {
        out.push(Violation::error(
            ViolationKind::InvalidVersion,
            "version must not be empty",
        ));
    }
}

/// A gate's own `version`, when it declares one.
fn check_variant_version(
    _: &CaskRecord,
    v: &ArtifactVariant,
    scope: &str,
    out: &mut Vec<Violation>,
) {
    if let Some(version) = &v.version {
        push_bad_version(version, scope, out);
    }
}

fn push_bad_version(version: &str, scope: &str, out: &mut Vec<Violation>) {
    if !is_dotted_numeric(version) {
        out.push(Violation::error(
            ViolationKind::InvalidVersion,
            format!("version{scope} '{version}' is not dotted-numeric"),
        ));
    }
}

/// 64 lowercase hex characters.
pub fn is_sha256_hex(digest: &str) -> bool {
    digest.len() == 64 && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn check_checksums(_: &CaskRecord, v: &ArtifactVariant, scope: &str, out: &mut Vec<Violation>) {
    for (arch, digest) in v.checksums.entries() {
        let label = arch.map_or_else(|| "sha256".to_owned(), |a| format!("sha256 {a}"));
        if !is_sha256_hex(digest) {
            out.push(Violation::error(
                ViolationKind::InvalidChecksum,
                format!("{label}{scope} '{digest}' is not 64 lowercase hex characters"),
            ));
        } else if *digest == PLACEHOLDER_CHECKSUM {
            out.push(Violation::error(
                ViolationKind::InvalidChecksum,
                format!("{label}{scope} is the all-zero placeholder"),
            ));
        }
    }
}

fn check_checksum_arch(cask: &CaskRecord, v: &ArtifactVariant, scope: &str, out: &mut Vec<Violation>) {
    for (arch, _) in v.checksums.entries() {
        if let Some(arch) = arch {
            if !cask.arch.contains_key(arch) {
                out.push(Violation::error(
                    ViolationKind::ChecksumArchMismatch,
                    format!("sha256{scope} has key '{arch}' not declared in arch"),
                ));
            }
        }
    }
}

fn check_templates(cask: &CaskRecord, v: &ArtifactVariant, scope: &str, out: &mut Vec<Violation>) {
    let url = &v.url.template;
    match placeholders(url) {
        Err(e) => out.push(Violation::error(
            ViolationKind::BadUrlTemplate,
            format!("url{scope} '{url}': {e}"),
        )),
        Ok(found) => {
            for p in found.iter().filter(|p| !is_known_placeholder(p.root)) {
                out.push(Violation::error(
                    ViolationKind::BadUrlTemplate,
                    format!("url{scope} references unknown placeholder '#{{{}}}'", p.expr),
                ));
            }
            if !cask.arch.is_empty() && !found.iter().any(|p| p.root == ARCH_PLACEHOLDER) {
                out.push(Violation::error(
                    ViolationKind::BadUrlTemplate,
                    format!("url{scope} does not reference '#{{arch}}' although arch is declared"),
                ));
            }
        }
    }

    let stanza = v.install.stanza();
    let path = v.install.path();
    match placeholders(path) {
        Err(e) => out.push(Violation::error(
            ViolationKind::BadUrlTemplate,
            format!("{stanza}{scope} '{path}': {e}"),
        )),
        Ok(found) => {
            for p in found.iter().filter(|p| !is_known_placeholder(p.root)) {
                out.push(Violation::error(
                    ViolationKind::BadUrlTemplate,
                    format!("{stanza}{scope} references unknown placeholder '#{{{}}}'", p.expr),
                ));
            }
        }
    }
}

fn is_known_placeholder(root: &str) -> bool {
    root == VERSION_PLACEHOLDER || root == ARCH_PLACEHOLDER
}

fn check_metadata(cask: &CaskRecord, out: &mut Vec<Violation>) {
    for (field, value) in [
        ("name", &cask.name),
        ("desc", &cask.desc),
        ("homepage", &cask.homepage),
    ] {
        if value.trim().is_empty() {
            out.push(Violation::error(
                ViolationKind::MissingMetadata,
                format!("{field} must not be empty"),
            ));
        }
    }

    if !cask.homepage.trim().is_empty() && !cask.homepage.starts_with(SECURE_SCHEME) {
        out.push(Violation::error(
            ViolationKind::InsecureUrl,
            format!("homepage '{}' does not use https", cask.homepage),
        ));
    }
    for v in &cask.variants {
        if !v.url.template.starts_with(SECURE_SCHEME) {
            out.push(Violation::error(
                ViolationKind::InsecureUrl,
                format!("url '{}' does not use https", v.url.template),
            ));
        }
    }
    if let Some(LivecheckUrl::Literal(url)) = cask.livecheck.as_ref().and_then(|l| l.url.as_ref()) {
        if !url.starts_with(SECURE_SCHEME) {
            out.push(Violation::error(
                ViolationKind::InsecureUrl,
                format!("livecheck url '{url}' does not use https"),
            ));
        }
    }
}

fn check_cleanup_paths(cask: &CaskRecord, out: &mut Vec<Violation>) {
    for path in cask.zap.iter().filter(|p| !p.starts_with(HOME_TOKEN)) {
        out.push(Violation::error(
            ViolationKind::UnrootedCleanupPath,
            format!("zap path '{path}' is not rooted at '{HOME_TOKEN}'"),
        ));
    }
}

fn check_artifact(_: &CaskRecord, v: &ArtifactVariant, scope: &str, out: &mut Vec<Violation>) {
    let (ok, expected) = match &v.install {
        InstallDirective::App(p) => (p.ends_with(".app"), ".app"),
        InstallDirective::Pkg(p) => (p.ends_with(".pkg"), ".pkg"),
    };
    if !ok {
        out.push(Violation::error(
            ViolationKind::InvalidArtifact,
            format!(
                "{}{scope} '{}' must end in {expected}",
                v.install.stanza(),
                v.install.path()
            ),
        ));
    }
}

fn check_verified(_: &CaskRecord, v: &ArtifactVariant, scope: &str, out: &mut Vec<Violation>) {
    let Some(verified) = &v.url.verified else {
        return;
    };
    let bare = v
        .url
        .template
        .split_once("://")
        .map_or(v.url.template.as_str(), |(_, rest)| rest);
    if !bare.starts_with(verified.as_str()) {
        out.push(Violation::error(
            ViolationKind::UnverifiedUrl,
            format!("url{scope} is not under its verified prefix '{verified}'"),
        ));
    }
}

fn check_livecheck(cask: &CaskRecord, out: &mut Vec<Violation>) {
    let Some(live) = &cask.livecheck else {
        return;
    };
    if let Some(LivecheckUrl::Symbol(sym)) = &live.url {
        if !LIVECHECK_URL_SYMBOLS.contains(&sym.as_str()) {
            out.push(Violation::error(
                ViolationKind::InvalidLivecheck,
                format!("livecheck url ':{sym}' must be ':url', ':homepage', or a literal url"),
            ));
        }
    }
    if live.strategy.as_deref().is_some_and(|s| s.trim().is_empty()) {
        out.push(Violation::error(
            ViolationKind::InvalidLivecheck,
            "livecheck strategy must not be empty",
        ));
    }
}
