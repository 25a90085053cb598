use super::{json_pretty, EXIT_SUCCESS};
use caskcheck_schema::{expand, parse_cask_file, CaskRecord, Checksums, LivecheckUrl};
use std::path::Path;

pub fn run(path: &Path, json: bool) -> Result<u8, String> {
    let cask = parse_cask_file(path)
        .map_err(|e| format!("failed to parse manifest {}: {e}", path.display()))?;
    if json {
        println!("{}", json_pretty(&cask)?);
    } else {
        for line in describe(&cask) {
            println!("{line}");
        }
    }
    Ok(EXIT_SUCCESS)
}

fn describe(cask: &CaskRecord) -> Vec<String> {
    let mut out = vec![
        format!("token:       {}", cask.token),
        format!("version:     {}", cask.version.as_deref().unwrap_or("(per variant)")),
        format!("name:        {}", cask.name),
        format!("desc:        {}", cask.desc),
        format!("homepage:    {}", cask.homepage),
    ];
    if !cask.arch.is_empty() {
        let pairs: Vec<String> = cask.arch.iter().map(|(k, v)| format!("{k}={v}")).collect();
        out.push(format!("arch:        {}", pairs.join(", ")));
    }

    for variant in &cask.variants {
        let gate = variant
            .gate
            .as_ref()
            .map_or_else(|| "(all)".to_owned(), ToString::to_string);
        out.push(format!(
            "artifact:    {gate} {} {}",
            variant.install.stanza(),
            variant.install.path()
        ));
        if let Some(version) = &variant.version {
            out.push(format!("  version:   {version}"));
        }
        let version = cask.version_of(variant).unwrap_or_default();
        match &variant.checksums {
            Checksums::Single(d) => {
                out.push(format!("  sha256:    {d}"));
                out.push(format!("  download:  {}", resolve(&variant.url.template, version, None)));
            }
            Checksums::PerArch(sums) => {
                for (key, d) in sums {
                    let arch = cask.arch.get(key).map(String::as_str);
                    out.push(format!("  sha256:    {key} {d}"));
                    out.push(format!(
                        "  download:  {key} {}",
                        resolve(&variant.url.template, version, arch)
                    ));
                }
            }
        }
    }

    if let Some(live) = &cask.livecheck {
        let url = match &live.url {
            Some(LivecheckUrl::Symbol(s)) => format!(":{s}"),
            Some(LivecheckUrl::Literal(u)) => u.clone(),
            None => "(default)".to_owned(),
        };
        let strategy = live.strategy.as_deref().unwrap_or("(default)");
        out.push(format!("livecheck:   {url} via {strategy}"));
    }
    if !cask.hooks.is_empty() {
        out.push(format!("hooks:       {}", cask.hooks.join(", ")));
    }
    out.push(format!("zap:         {} path(s)", cask.zap.len()));
    for path in &cask.zap {
        out.push(format!("  {path}"));
    }
    out
}

fn resolve(template: &str, version: &str, arch: Option<&str>) -> String {
    expand(template, version, arch).unwrap_or_else(|e| format!("{template} ({e})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use caskcheck_schema::parse_cask_str;

    #[test]
    fn describes_resolved_downloads_per_arch() {
        let cask = parse_cask_str(
            r#"cask "v2rayn" do
  arch arm: "arm64", intel: "64"

  version "7.12.7"
  sha256 arm:   "dee33c76ce98fee472246bf14cc034c69643244acf0ea5bd1b0d746cab51340c",
         intel: "41e9ef4c6986ba1fdabef99c2baea6fdeb9863a723290eece9d3da3dfd07c5a6"

  url "https://github.com/2dust/v2rayN/releases/download/#{version}/v2rayN-macos-#{arch}.dmg"
  name "v2rayN"
  desc "GUI client for Windows, Linux and macOS, support Xray and sing-box and others"
  homepage "https://github.com/2dust/v2rayN"

  app "v2rayN.app"
end
"#,
        )
        .unwrap();
        let lines = describe(&cask);
        assert!(lines.contains(&"arch:        arm=arm64, intel=64".to_owned()));
        assert!(lines.contains(
            &"  download:  intel https://github.com/2dust/v2rayN/releases/download/7.12.7/v2rayN-macos-64.dmg"
                .to_owned()
        ));
        assert!(lines.contains(&"artifact:    (all) app v2rayN.app".to_owned()));
        assert!(lines.contains(&"zap:         0 path(s)".to_owned()));
    }

    #[test]
    fn resolves_downloads_with_gate_versions() {
        let cask = parse_cask_str(
            r#"cask "x" do
  on_catalina :or_older do
    version "1.0"
    sha256 "aa"
  end
  on_big_sur :or_newer do
    version "2.0"
    sha256 "bb"
  end
  url "https://e.com/x-#{version}.dmg"
  name "X"
  desc "d"
  homepage "https://e.com/"
  app "X.app"
end
"#,
        )
        .unwrap();
        let lines = describe(&cask);
        assert!(lines.contains(&"version:     (per variant)".to_owned()));
        assert!(lines.contains(&"  version:   1.0".to_owned()));
        assert!(lines.contains(&"  download:  https://e.com/x-1.0.dmg".to_owned()));
        assert!(lines.contains(&"  download:  https://e.com/x-2.0.dmg".to_owned()));
    }
}
