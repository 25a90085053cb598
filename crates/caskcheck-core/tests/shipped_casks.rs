//! Every manifest under `Casks/` must parse, validate clean, and survive a
//! render/parse round trip.

use caskcheck_core::{validate, validate_dir, ValidatorConfig};
use caskcheck_schema::{parse_cask_file, parse_cask_str, render, Checksums, InstallDirective};
use std::path::PathBuf;

fn casks_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../Casks")
}

#[test]
fn shipped_casks_validate_clean() {
    let report = validate_dir(&casks_dir(), &ValidatorConfig::default()).unwrap();
    assert_eq!(report.files.len(), 5);
    for file in &report.files {
        assert!(
            !file.is_failure() && file.violations().is_empty(),
            "{}: {:?}",
            file.path.display(),
            file.outcome
        );
    }
    assert!(report.is_success());
}

#[test]
fn shipped_casks_round_trip_through_render() {
    for entry in std::fs::read_dir(casks_dir()).unwrap() {
        let path = entry.unwrap().path();
        let cask = parse_cask_file(&path).unwrap();
        let again = parse_cask_str(&render(&cask)).unwrap();
        assert_eq!(again, cask, "{}", path.display());
        assert!(validate(&again).is_empty());
    }
}

#[test]
fn flclash_fields() {
    let cask = parse_cask_file(casks_dir().join("flclash.rb")).unwrap();
    assert_eq!(cask.token, "flclash");
    assert_eq!(cask.version.as_deref(), Some("0.8.86"));
    let Checksums::PerArch(sums) = &cask.variants[0].checksums else {
        panic!("flclash has per-arch checksums");
    };
    assert_eq!(sums.len(), 2);
    assert_eq!(cask.zap.len(), 3);
}

#[test]
fn mihomo_party_installs_a_pkg_per_macos_gate() {
    let cask = parse_cask_file(casks_dir().join("mihomo-party.rb")).unwrap();
    let gates: Vec<String> = cask
        .variants
        .iter()
        .map(|v| v.gate.as_ref().unwrap().to_string())
        .collect();
    assert_eq!(gates, vec!["on_catalina :or_older", "on_big_sur :or_newer"]);
    assert!(cask
        .variants
        .iter()
        .all(|v| matches!(v.install, InstallDirective::Pkg(_))));
}

#[test]
fn v2rayn_preflight_is_recorded_as_a_hook() {
    let cask = parse_cask_file(casks_dir().join("v2rayn.rb")).unwrap();
    assert_eq!(cask.hooks, vec!["preflight"]);
    assert_eq!(cask.zap.len(), 4);
}
