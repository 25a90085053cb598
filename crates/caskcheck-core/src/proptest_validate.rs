//! Property-based tests for the checksum and cleanup-path checks.

use proptest::prelude::*;

use crate::validate::{is_sha256_hex, validate, ViolationKind, HOME_TOKEN};
use caskcheck_schema::{parse_cask_str, CaskRecord, Checksums, Digest};

const HIDDIFY: &str = include_str!("../../../Casks/hiddify.rb");

fn hiddify() -> CaskRecord {
    parse_cask_str(HIDDIFY).unwrap()
}

fn count(cask: &CaskRecord, kind: ViolationKind) -> usize {
    validate(cask).iter().filter(|v| v.kind == kind).count()
}

/// Strings that are not 64 lowercase hex characters.
fn malformed_digest() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9a-f]{0,63}",
        "[0-9a-f]{65,80}",
        "[0-9a-f]{0,20}[g-zA-F ]{1,3}[0-9a-f]{0,60}",
        ".{0,70}",
    ]
    .prop_filter("must not be a valid digest", |s| !is_sha256_hex(s))
}

fn valid_digest() -> impl Strategy<Value = String> {
    "[0-9a-f]{64}".prop_filter("all-zero placeholder", |s| s.chars().any(|c| c != '0'))
}

fn rooted_path() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ./_-]{0,30}".prop_map(|rest| format!("{HOME_TOKEN}{rest}"))
}

fn unrooted_path() -> impl Strategy<Value = String> {
    prop_oneof!["/[A-Za-z0-9 ./_-]{0,30}", "~[A-Za-z0-9._-]{0,10}(/.*)?", ".{0,30}"]
        .prop_filter("rooted", |p| !p.starts_with(HOME_TOKEN))
}

proptest! {
    /// Property: any digest that is not 64 lowercase hex characters is rejected.
    #[test]
    fn prop_malformed_checksum_is_invalid(digest in malformed_digest()) {
        let mut cask = hiddify();
        cask.variants[0].checksums = Checksums::Single(Digest::new(digest));
        prop_assert_eq!(count(&cask, ViolationKind::InvalidChecksum), 1);
    }

    /// Property: any non-placeholder 64-char lowercase hex digest passes.
    #[test]
    fn prop_hex_checksum_is_accepted(digest in valid_digest()) {
        let mut cask = hiddify();
        cask.variants[0].checksums = Checksums::Single(Digest::new(digest));
        prop_assert!(validate(&cask).is_empty());
    }

    /// Property: exactly the zap paths outside the home directory are reported.
    #[test]
    fn prop_unrooted_zap_paths_are_reported(
        rooted in prop::collection::vec(rooted_path(), 0..5),
        unrooted in prop::collection::vec(unrooted_path(), 0..5),
    ) {
        let mut cask = hiddify();
        cask.zap = rooted.iter().chain(&unrooted).cloned().collect();
        prop_assert_eq!(count(&cask, ViolationKind::UnrootedCleanupPath), unrooted.len());
    }

    /// Property: validation is deterministic.
    #[test]
    fn prop_validate_is_idempotent(
        digest in malformed_digest(),
        path in unrooted_path(),
    ) {
        let mut cask = hiddify();
        cask.variants[0].checksums = Checksums::Single(Digest::new(digest));
        cask.zap.push(path);
        prop_assert_eq!(validate(&cask), validate(&cask));
    }
}
