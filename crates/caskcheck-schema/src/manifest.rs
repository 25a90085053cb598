use crate::lexer::tokenize;
use crate::syntax::{parse_document, Stanza, Value};
use crate::types::{ArchKey, CaskToken, Digest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read cask file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed cask block (line {line}): {reason}")]
    MalformedBlock { line: usize, reason: String },
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("unsupported value for `{field}` on line {line}: only literals and templates are accepted")]
    UnsupportedValue { field: String, line: usize },
}

/// Fully parsed cask manifest. Built once per parse call and never mutated.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CaskRecord {
    pub token: CaskToken,
    /// Top-level `version`. May be absent when every gate declares its own.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub arch: BTreeMap<ArchKey, String>,
    pub variants: Vec<ArtifactVariant>,
    pub name: String,
    pub desc: String,
    pub homepage: String,
    #[serde(default)]
    pub livecheck: Option<Livecheck>,
    #[serde(default)]
    pub zap: Vec<String>,
    #[serde(default)]
    pub uninstall: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub auto_updates: bool,
    #[serde(default)]
    pub depends_on_macos: Option<String>,
    #[serde(default)]
    pub hooks: Vec<String>,
}

/// Downloadable artifact, optionally gated on an `on_<selector>` block.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ArtifactVariant {
    #[serde(default)]
    pub gate: Option<Gate>,
    /// `version` declared inside the gate, overriding the top-level one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub checksums: Checksums,
    pub url: DownloadUrl,
    pub install: InstallDirective,
}

impl CaskRecord {
    /// Version in effect for `variant`.
    pub fn version_of<'a>(&'a self, variant: &'a ArtifactVariant) -> Option<&'a str> {
        variant.version.as_deref().or(self.version.as_deref())
    }
}

/// `on_catalina :or_older` is `Gate { selector: "catalina", qualifier: Some("or_older") }`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Gate {
    pub selector: String,
    #[serde(default)]
    pub qualifier: Option<String>,
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "on_{} :{q}", self.selector),
            None => write!(f, "on_{}", self.selector),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Checksums {
    Single(Digest),
    PerArch(BTreeMap<ArchKey, Digest>),
}

impl Checksums {
    /// `(arch key, digest)` pairs; the key is `None` for a single checksum.
    pub fn entries(&self) -> Vec<(Option<&ArchKey>, &Digest)> {
        match self {
            Checksums::Single(d) => vec![(None, d)],
            Checksums::PerArch(map) => map.iter().map(|(k, d)| (Some(k), d)).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DownloadUrl {
    pub template: String,
    #[serde(default)]
    pub verified: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InstallDirective {
    App(String),
    Pkg(String),
}

impl InstallDirective {
    pub fn stanza(&self) -> &'static str {
        match self {
            InstallDirective::App(_) => "app",
            InstallDirective::Pkg(_) => "pkg",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            InstallDirective::App(p) | InstallDirective::Pkg(p) => p,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Livecheck {
    #[serde(default)]
    pub url: Option<LivecheckUrl>,
    #[serde(default)]
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LivecheckUrl {
    /// `url :url`, `url :homepage`
    Symbol(String),
    Literal(String),
}

/// Stanzas whose `do ... end` body is opaque code run by the package manager.
const HOOK_STANZAS: &[&str] = &[
    "preflight",
    "postflight",
    "uninstall_preflight",
    "uninstall_postflight",
];

/// Required metadata that cannot vary per `on_*` block.
const TOP_LEVEL_ONLY: &[&str] = &["name", "desc", "homepage"];

pub fn parse_cask_str(input: &str) -> Result<CaskRecord, ParseError> {
    let tokens = tokenize(input).map_err(|e| ParseError::MalformedBlock {
        line: e.line,
        reason: e.reason,
    })?;
    let doc = parse_document(&tokens).map_err(|e| ParseError::MalformedBlock {
        line: e.line,
        reason: e.reason,
    })?;
    Draft::collect(&doc.stanzas)?.finish(CaskToken::new(doc.token))
}

pub fn parse_cask_file(path: impl AsRef<Path>) -> Result<CaskRecord, ParseError> {
    let content = fs::read_to_string(path)?;
    parse_cask_str(&content)
}

#[derive(Debug, Default, Clone)]
struct ArtifactDraft {
    version: Option<String>,
    checksums: Option<Checksums>,
    url: Option<DownloadUrl>,
    install: Option<InstallDirective>,
}

impl ArtifactDraft {
    fn absorb(&mut self, stanza: &Stanza) -> Result<bool, ParseError> {
        match stanza.name.as_str() {
            "version" => self.version = Some(required_scalar(stanza)?),
            "sha256" => self.checksums = Some(checksums(stanza)?),
            "url" => {
                self.url = Some(DownloadUrl {
                    template: required_str(stanza)?,
                    verified: optional_keyed_str(stanza, "verified")?,
                });
            }
            "app" => self.install = Some(InstallDirective::App(required_str(stanza)?)),
            "pkg" => self.install = Some(InstallDirective::Pkg(required_str(stanza)?)),
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn or(&self, fallback: &ArtifactDraft) -> ArtifactDraft {
        ArtifactDraft {
            version: self.version.clone().or_else(|| fallback.version.clone()),
            checksums: self.checksums.clone().or_else(|| fallback.checksums.clone()),
            url: self.url.clone().or_else(|| fallback.url.clone()),
            install: self.install.clone().or_else(|| fallback.install.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct Draft {
    arch: BTreeMap<ArchKey, String>,
    top: ArtifactDraft,
    gated: Vec<(Gate, ArtifactDraft)>,
    name: Option<String>,
    desc: Option<String>,
    homepage: Option<String>,
    livecheck: Option<Livecheck>,
    zap: Vec<String>,
    uninstall: BTreeMap<String, Vec<String>>,
    auto_updates: bool,
    depends_on_macos: Option<String>,
    hooks: Vec<String>,
}

impl Draft {
    fn collect(stanzas: &[Stanza]) -> Result<Self, ParseError> {
        let mut d = Draft::default();
        for s in stanzas {
            if d.top.absorb(s)? {
                continue;
            }
            match (s.name.as_str(), &s.body) {
                ("arch", _) => {
                    for (k, v) in s.keyed() {
                        let value = v.as_str().ok_or_else(|| unsupported(&s.name, s.line))?;
                        d.arch.insert(ArchKey::from(k), value.to_owned());
                    }
                }
                // later `name` stanzas are alternate names
                ("name", _) if d.name.is_none() => d.name = Some(required_str(s)?),
                ("desc", _) => d.desc = Some(required_str(s)?),
                ("homepage", _) => d.homepage = Some(required_str(s)?),
                ("livecheck", Some(body)) => d.livecheck = Some(livecheck(body)?),
                ("zap", _) => {
                    if let Some(trash) = s.get("trash") {
                        d.zap.extend(trash.strings());
                    }
                }
                ("uninstall", _) => {
                    for (k, v) in s.keyed() {
                        d.uninstall
                            .entry(k.to_owned())
                            .or_default()
                            .extend(v.strings());
                    }
                }
                ("auto_updates", _) => {
                    d.auto_updates = matches!(s.first_positional(), Some(Value::Ident(b)) if b == "true");
                }
                ("depends_on", _) => {
                    if let Some(v) = s.get("macos") {
                        let value = scalar(v).ok_or_else(|| unsupported("depends_on", s.line))?;
                        d.depends_on_macos = Some(value);
                    }
                }
                (name, Some(body)) if name.starts_with("on_") => {
                    let gate = Gate {
                        selector: name["on_".len()..].to_owned(),
                        qualifier: match s.first_positional() {
                            Some(Value::Symbol(q)) => Some(q.clone()),
                            _ => None,
                        },
                    };
                    let mut artifact = ArtifactDraft::default();
                    for inner in body {
                        let absorbed = artifact.absorb(inner)?;
                        if !absorbed && TOP_LEVEL_ONLY.contains(&inner.name.as_str()) {
                            let reason = format!(
                                "`{}` must be declared at top level, not inside `{gate}`",
                                inner.name
                            );
                            return Err(ParseError::MalformedBlock {
                                line: inner.line,
                                reason,
                            });
                        }
                    }
                    d.gated.push((gate, artifact));
                }
                (name, Some(_)) if HOOK_STANZAS.contains(&name) => d.hooks.push(name.to_owned()),
                _ => {}
            }
        }
        Ok(d)
    }

    /// One merged draft per variant, paired with the gate's own `version`.
    fn artifact_drafts(&self) -> Vec<(Option<Gate>, Option<String>, ArtifactDraft)> {
        if self.gated.is_empty() {
            return vec![(None, None, self.top.clone())];
        }
        self.gated
            .iter()
            .map(|(gate, a)| (Some(gate.clone()), a.version.clone(), a.or(&self.top)))
            .collect()
    }

    fn finish(self, token: CaskToken) -> Result<CaskRecord, ParseError> {
        let drafts = self.artifact_drafts();
        let all = |f: fn(&ArtifactDraft) -> bool| drafts.iter().all(|(_, _, a)| f(a));

        if !all(|a| a.version.is_some()) {
            return Err(ParseError::MissingField("version"));
        }
        if !all(|a| a.checksums.is_some()) {
            return Err(ParseError::MissingField("sha256"));
        }
        if !all(|a| a.url.is_some()) {
            return Err(ParseError::MissingField("url"));
        }
        let name = self.name.ok_or(ParseError::MissingField("name"))?;
        let desc = self.desc.ok_or(ParseError::MissingField("desc"))?;
        let homepage = self.homepage.ok_or(ParseError::MissingField("homepage"))?;

        let mut variants = Vec::with_capacity(drafts.len());
        for (gate, version, a) in drafts {
            let (Some(checksums), Some(url), Some(install)) = (a.checksums, a.url, a.install) else {
                return Err(ParseError::MissingField("app"));
            };
            variants.push(ArtifactVariant {
                gate,
                version,
                checksums,
                url,
                install,
            });
        }

        Ok(CaskRecord {
            token,
            version: self.top.version,
            arch: self.arch,
            variants,
            name,
            desc,
            homepage,
            livecheck: self.livecheck,
            zap: self.zap,
            uninstall: self.uninstall,
            auto_updates: self.auto_updates,
            depends_on_macos: self.depends_on_macos,
            hooks: self.hooks,
        })
    }
}

fn unsupported(field: &str, line: usize) -> ParseError {
    ParseError::UnsupportedValue {
        field: field.to_owned(),
        line,
    }
}

fn required_str(s: &Stanza) -> Result<String, ParseError> {
    match s.first_positional() {
        Some(Value::Str(v)) => Ok(v.clone()),
        _ => Err(unsupported(&s.name, s.line)),
    }
}

/// Strings, numbers, and symbols (`version :latest`, `macos: :big_sur`).
fn scalar(v: &Value) -> Option<String> {
    match v {
        Value::Str(v) | Value::Number(v) => Some(v.clone()),
        Value::Symbol(v) => Some(format!(":{v}")),
        _ => None,
    }
}

fn required_scalar(s: &Stanza) -> Result<String, ParseError> {
    s.first_positional()
        .and_then(scalar)
        .ok_or_else(|| unsupported(&s.name, s.line))
}

fn optional_keyed_str(s: &Stanza, key: &str) -> Result<Option<String>, ParseError> {
    match s.get(key) {
        None => Ok(None),
        Some(Value::Str(v)) => Ok(Some(v.clone())),
        Some(_) => Err(unsupported(&format!("{} {key}:", s.name), s.line)),
    }
}

fn checksums(s: &Stanza) -> Result<Checksums, ParseError> {
    if let Some(v) = s.first_positional() {
        return match v {
            Value::Str(d) => Ok(Checksums::Single(Digest::new(d.clone()))),
            Value::Symbol(sym) => Ok(Checksums::Single(Digest::new(format!(":{sym}")))),
            _ => Err(unsupported("sha256", s.line)),
        };
    }
    let mut map = BTreeMap::new();
    for (k, v) in s.keyed() {
        let d = v.as_str().ok_or_else(|| unsupported("sha256", s.line))?;
        map.insert(ArchKey::from(k), Digest::from(d));
    }
    if map.is_empty() {
        return Err(unsupported("sha256", s.line));
    }
    Ok(Checksums::PerArch(map))
}

fn livecheck(body: &[Stanza]) -> Result<Livecheck, ParseError> {
    let mut out = Livecheck {
        url: None,
        strategy: None,
    };
    for s in body {
        match s.name.as_str() {
            "url" => {
                out.url = match s.first_positional() {
                    Some(Value::Symbol(sym)) => Some(LivecheckUrl::Symbol(sym.clone())),
                    Some(Value::Str(u)) => Some(LivecheckUrl::Literal(u.clone())),
                    _ => return Err(unsupported("livecheck url", s.line)),
                };
            }
            "strategy" => {
                out.strategy = match s.first_positional() {
                    Some(Value::Symbol(sym)) => Some(sym.clone()),
                    _ => return Err(unsupported("livecheck strategy", s.line)),
                };
            }
            _ => {}
        }
    }
    Ok(out)
}
