//! Property-based tests for the parse/render round trip.
//!
//! Records are generated in the shapes `parse_cask_str` can produce: either a
//! single ungated artifact, or one or more `on_*` gates carrying their own
//! artifact fields.

use proptest::prelude::*;

use crate::manifest::{
    ArtifactVariant, CaskRecord, Checksums, DownloadUrl, Gate, InstallDirective, Livecheck,
    LivecheckUrl,
};
use crate::types::{ArchKey, CaskToken, Digest};
use crate::{parse_cask_str, render};

fn token() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,12}"
}

fn version() -> impl Strategy<Value = String> {
    "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}"
}

fn word() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ._-]{0,15}"
}

/// Free text including quotes and backslashes.
fn text() -> impl Strategy<Value = String> {
    r#"[A-Za-z0-9 ."\\-]{0,24}"#
}

fn digest() -> impl Strategy<Value = Digest> {
    "[0-9a-f]{64}".prop_map(Digest::new)
}

fn key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{1,6}"
}

fn checksums() -> impl Strategy<Value = Checksums> {
    prop_oneof![
        digest().prop_map(Checksums::Single),
        prop::collection::btree_map(key().prop_map(ArchKey::new), digest(), 1..3)
            .prop_map(Checksums::PerArch),
    ]
}

fn download_url() -> impl Strategy<Value = DownloadUrl> {
    ("[a-z]{1,10}", "[a-z0-9]{1,8}", any::<bool>()).prop_map(|(host, file, verified)| {
        DownloadUrl {
            template: format!("https://{host}.com/{file}-#{{version}}.dmg"),
            verified: verified.then(|| format!("{host}.com/")),
        }
    })
}

fn install() -> impl Strategy<Value = InstallDirective> {
    prop_oneof![
        word().prop_map(|w| InstallDirective::App(format!("{w}.app"))),
        word().prop_map(|w| InstallDirective::Pkg(format!("{w}.pkg"))),
    ]
}

fn artifact(
    gate: Option<Gate>,
    own_version: Option<String>,
) -> impl Strategy<Value = ArtifactVariant> {
    (checksums(), download_url(), install()).prop_map(move |(checksums, url, install)| {
        ArtifactVariant {
            gate: gate.clone(),
            version: own_version.clone(),
            checksums,
            url,
            install,
        }
    })
}

fn gate() -> impl Strategy<Value = Gate> {
    (
        prop::sample::select(vec!["arm", "intel", "catalina", "big_sur", "sonoma"]),
        prop::option::of(prop::sample::select(vec!["or_older", "or_newer"])),
    )
        .prop_map(|(selector, qualifier)| Gate {
            selector: selector.to_owned(),
            qualifier: qualifier.map(str::to_owned),
        })
}

/// Top-level version and the artifact variants it applies to.
fn variants() -> impl Strategy<Value = (Option<String>, Vec<ArtifactVariant>)> {
    let ungated = version().prop_flat_map(|v| {
        artifact(None, None).prop_map(move |a| (Some(v.clone()), vec![a]))
    });
    let gated = prop::option::of(version()).prop_flat_map(|top| {
        let own_version = if top.is_some() {
            prop::option::of(version()).boxed()
        } else {
            version().prop_map(Some).boxed()
        };
        prop::collection::vec(
            (gate(), own_version).prop_flat_map(|(g, v)| artifact(Some(g), v)),
            1..4,
        )
        .prop_map(move |vs| (top.clone(), vs))
    });
    prop_oneof![ungated, gated]
}

fn livecheck() -> impl Strategy<Value = Livecheck> {
    let url = prop_oneof![
        "[a-z_]{1,10}".prop_map(LivecheckUrl::Symbol),
        "[a-z]{1,10}".prop_map(|h| LivecheckUrl::Literal(format!("https://{h}.com/releases"))),
    ];
    (prop::option::of(url), prop::option::of("[a-z_]{1,12}"))
        .prop_map(|(url, strategy)| Livecheck { url, strategy })
}

fn record() -> impl Strategy<Value = CaskRecord> {
    let identity = (
        token(),
        variants(),
        prop::collection::btree_map(key().prop_map(ArchKey::new), "[a-z0-9_]{1,8}", 0..3),
        word(),
        text(),
        "[a-z]{1,10}".prop_map(|h| format!("https://{h}.com/")),
    );
    let extras = (
        prop::option::of(livecheck()),
        prop::collection::vec("~/[A-Za-z0-9 ._-]{1,20}", 0..4),
        prop::collection::btree_map(key(), prop::collection::vec(word(), 1..3), 0..3),
        any::<bool>(),
        prop::option::of(prop::sample::select(vec![">= :catalina", ":big_sur", ":sonoma"])),
        prop::sample::subsequence(
            vec!["preflight", "postflight", "uninstall_preflight", "uninstall_postflight"],
            0..=4,
        ),
    );
    (identity, extras).prop_map(
        |(
            (token, (version, variants), arch, name, desc, homepage),
            (livecheck, zap, uninstall, auto_updates, depends_on_macos, hooks),
        )| CaskRecord {
            token: CaskToken::new(token),
            version,
            arch,
            variants,
            name,
            desc,
            homepage,
            livecheck,
            zap,
            uninstall,
            auto_updates,
            depends_on_macos: depends_on_macos.map(str::to_owned),
            hooks: hooks.into_iter().map(str::to_owned).collect(),
        },
    )
}

proptest! {
    /// Property: parsing the rendered text gives back the same record.
    #[test]
    fn prop_render_round_trips(cask in record()) {
        let rendered = render(&cask);
        let reparsed = parse_cask_str(&rendered);
        prop_assert!(reparsed.is_ok(), "render produced unparsable text:\n{rendered}");
        prop_assert_eq!(reparsed.unwrap(), cask);
    }

    /// Property: every variant resolves to the same version after a round trip.
    #[test]
    fn prop_variant_versions_survive_round_trip(cask in record()) {
        let reparsed = parse_cask_str(&render(&cask)).unwrap();
        for (before, after) in cask.variants.iter().zip(&reparsed.variants) {
            prop_assert!(cask.version_of(before).is_some());
            prop_assert_eq!(cask.version_of(before), reparsed.version_of(after));
        }
    }
}
