//! Cask manifest parsing, record types, and canonical rendering for caskcheck.
//!
//! This crate defines the schema layer: a tokenizer and structural parser for
//! the cask block syntax (`parse_cask_str`), the immutable `CaskRecord` it
//! produces, `#{...}` template helpers, and `render`, which writes a record
//! back out in canonical form. Manifests are never evaluated as code.

pub mod lexer;
pub mod manifest;
pub mod render;
pub mod syntax;
pub mod template;
pub mod types;

#[cfg(test)]
mod proptest_roundtrip;

pub use manifest::{
    parse_cask_file, parse_cask_str, ArtifactVariant, CaskRecord, Checksums, DownloadUrl, Gate,
    InstallDirective, Livecheck, LivecheckUrl, ParseError,
};
pub use render::render;
pub use template::{expand, placeholders, Placeholder, TemplateError};
pub use types::{ArchKey, CaskToken, Digest};
