use crate::manifest::{ArtifactVariant, CaskRecord, Checksums, LivecheckUrl};
use std::fmt::Write as _;

const INDENT: &str = "  ";

/// Render a record as canonical cask text.
///
/// Parsing the output yields an equal record. Hook bodies are not retained
/// by the parser, so hooks render as empty blocks.
pub fn render(cask: &CaskRecord) -> String {
    let mut w = Writer::default();
    w.line(0, &format!("cask {} do", quote(cask.token.as_str())));

    if !cask.arch.is_empty() {
        let pairs: Vec<(&str, String)> = cask
            .arch
            .iter()
            .map(|(k, v)| (k.as_str(), quote(v)))
            .collect();
        w.keyword_args(1, "arch", &pairs, false);
        w.blank();
    }

    if let Some(version) = &cask.version {
        w.line(1, &format!("version {}", scalar(version)));
    }

    let ungated: Vec<&ArtifactVariant> =
        cask.variants.iter().filter(|v| v.gate.is_none()).collect();
    if let [only] = ungated.as_slice() {
        w.checksums(1, &only.checksums);
        w.blank();
        w.url(1, only);
    } else {
        w.blank();
    }
    w.line(1, &format!("name {}", quote(&cask.name)));
    w.line(1, &format!("desc {}", quote(&cask.desc)));
    w.line(1, &format!("homepage {}", quote(&cask.homepage)));

    if let Some(live) = &cask.livecheck {
        w.blank();
        w.line(1, "livecheck do");
        match &live.url {
            Some(LivecheckUrl::Symbol(s)) => w.line(2, &format!("url :{s}")),
            Some(LivecheckUrl::Literal(u)) => w.line(2, &format!("url {}", quote(u))),
            None => {}
        }
        if let Some(strategy) = &live.strategy {
            w.line(2, &format!("strategy :{strategy}"));
        }
        w.line(1, "end");
    }

    if cask.auto_updates || cask.depends_on_macos.is_some() {
        w.blank();
        if cask.auto_updates {
            w.line(1, "auto_updates true");
        }
        if let Some(macos) = &cask.depends_on_macos {
            w.line(1, &format!("depends_on macos: {}", scalar(macos)));
        }
    }

    if let [only] = ungated.as_slice() {
        w.blank();
        w.install(1, only);
    }

    for variant in cask.variants.iter().filter(|v| v.gate.is_some()) {
        if let Some(gate) = &variant.gate {
            w.blank();
            w.line(1, &format!("{gate} do"));
            if let Some(version) = &variant.version {
                w.line(2, &format!("version {}", scalar(version)));
            }
            w.checksums(2, &variant.checksums);
            w.blank();
            w.url(2, variant);
            w.blank();
            w.install(2, variant);
            w.line(1, "end");
        }
    }

    for hook in &cask.hooks {
        w.blank();
        w.line(1, &format!("{hook} do"));
        w.line(1, "end");
    }

    if !cask.uninstall.is_empty() {
        let pairs: Vec<(&str, String)> = cask
            .uninstall
            .iter()
            .map(|(k, v)| (k.as_str(), list(v)))
            .collect();
        w.blank();
        w.keyword_args(1, "uninstall", &pairs, true);
    }

    if !cask.zap.is_empty() {
        w.blank();
        if let [single] = cask.zap.as_slice() {
            w.line(1, &format!("zap trash: {}", quote(single)));
        } else {
            w.line(1, "zap trash: [");
            for path in &cask.zap {
                w.line(2, &format!("{},", quote(path)));
            }
            w.line(1, "]");
        }
    }

    w.line(0, "end");
    w.out
}

#[derive(Default)]
struct Writer {
    out: String,
}

impl Writer {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        if !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    /// `stanza k1: v1,` with continuation lines aligned under the first key.
    fn keyword_args(&mut self, depth: usize, stanza: &str, pairs: &[(&str, String)], multiline: bool) {
        if !multiline {
            let joined: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            self.line(depth, &format!("{stanza} {}", joined.join(", ")));
            return;
        }
        let width = pairs.iter().map(|(k, _)| k.len() + 1).max().unwrap_or(0);
        let hang = " ".repeat(stanza.len() + 1);
        for (i, (k, v)) in pairs.iter().enumerate() {
            let lead = if i == 0 { format!("{stanza} ") } else { hang.clone() };
            let sep = if i + 1 < pairs.len() { "," } else { "" };
            let key = format!("{k}:");
            self.line(depth, &format!("{lead}{key:<width$} {v}{sep}"));
        }
    }

    fn checksums(&mut self, depth: usize, sums: &Checksums) {
        match sums {
            Checksums::Single(d) => self.line(depth, &format!("sha256 {}", scalar(d))),
            Checksums::PerArch(map) => {
                let pairs: Vec<(&str, String)> =
                    map.iter().map(|(k, d)| (k.as_str(), quote(d))).collect();
                self.keyword_args(depth, "sha256", &pairs, pairs.len() > 1);
            }
        }
    }

    fn url(&mut self, depth: usize, variant: &ArtifactVariant) {
        let mut text = format!("url {}", quote(&variant.url.template));
        if let Some(verified) = &variant.url.verified {
            let _ = write!(text, ",\n{}    verified: {}", INDENT.repeat(depth), quote(verified));
        }
        self.line(depth, &text);
    }

    fn install(&mut self, depth: usize, variant: &ArtifactVariant) {
        self.line(
            depth,
            &format!("{} {}", variant.install.stanza(), quote(variant.install.path())),
        );
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// `:symbol` values are written bare, everything else as a string literal.
fn scalar(s: &str) -> String {
    match s.strip_prefix(':') {
        Some(sym)
            if sym.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
                && sym.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            s.to_owned()
        }
        _ => quote(s),
    }
}

fn list(values: &[String]) -> String {
    match values {
        [single] => quote(single),
        many => format!(
            "[{}]",
            many.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ")
        ),
    }
}
