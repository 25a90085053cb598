//! Structural parse of a cask file into a tree of stanzas.
//!
//! A stanza is `ident args [do ... end]`. Arguments are literal values or
//! `key: value` pairs. Nothing is evaluated; anything the grammar does not
//! recognize is kept as [`Value::Other`] so unknown stanzas can be skipped.

use crate::lexer::{Token, TokenKind};

/// Ruby keywords that open a block closed by `end` without a `do`.
const IMPLICIT_BLOCK_KEYWORDS: &[&str] = &["if", "unless", "case", "begin", "def", "while", "until"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Symbol(String),
    Ident(String),
    Number(String),
    Array(Vec<Value>),
    Other(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// All string literals in this value, flattening nested arrays.
    pub fn strings(&self) -> Vec<String> {
        match self {
            Value::Str(s) => vec![s.clone()],
            Value::Array(items) => items.iter().flat_map(Value::strings).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub key: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stanza {
    pub name: String,
    pub args: Vec<Arg>,
    pub body: Option<Vec<Stanza>>,
    pub line: usize,
}

impl Stanza {
    pub fn positional(&self) -> impl Iterator<Item = &Value> {
        self.args.iter().filter(|a| a.key.is_none()).map(|a| &a.value)
    }

    pub fn keyed(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.args
            .iter()
            .filter_map(|a| a.key.as_deref().map(|k| (k, &a.value)))
    }

    pub fn first_positional(&self) -> Option<&Value> {
        self.positional().next()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.keyed().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// The top-level `cask "<token>" do ... end` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub token: String,
    pub stanzas: Vec<Stanza>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub reason: String,
}

pub fn parse_document(tokens: &[Token]) -> Result<Document, SyntaxError> {
    let mut p = Parser { tokens, pos: 0 };
    p.document()
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn bump(&mut self) -> Option<&'t TokenKind> {
        let tok = self.tokens.get(self.pos).map(|t| &t.kind);
        self.pos += 1;
        tok
    }

    fn error(&self, reason: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line: self.line(),
            reason: reason.into(),
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Some(TokenKind::Newline)) {
            self.pos += 1;
        }
    }

    fn at_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Ident(w)) if w == word)
    }

    fn document(&mut self) -> Result<Document, SyntaxError> {
        self.skip_newlines();
        if !self.at_ident("cask") {
            return Err(self.error("expected a top-level `cask \"<token>\" do` declaration"));
        }
        let open_line = self.line();
        self.pos += 1;

        let had_paren = matches!(self.peek(), Some(TokenKind::LParen));
        if had_paren {
            self.pos += 1;
        }
        let token = match self.bump() {
            Some(TokenKind::Str(s)) => s.clone(),
            _ => {
                self.pos -= 1;
                return Err(self.error("`cask` declaration must name a token string"));
            }
        };
        if had_paren && !matches!(self.bump(), Some(TokenKind::RParen)) {
            self.pos -= 1;
            return Err(self.error("unclosed `(` in `cask` declaration"));
        }
        if !self.at_ident("do") {
            return Err(self.error("expected `do` after the cask token"));
        }
        self.pos += 1;

        let stanzas = self.body(open_line)?;
        self.skip_newlines();
        if self.pos < self.tokens.len() {
            return Err(self.error("unexpected content after the closing `end` of the cask block"));
        }
        Ok(Document { token, stanzas })
    }

    /// Parse stanzas up to and including the matching `end`.
    fn body(&mut self, open_line: usize) -> Result<Vec<Stanza>, SyntaxError> {
        let mut stanzas = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                None => {
                    return Err(SyntaxError {
                        line: open_line,
                        reason: format!("block opened on line {open_line} is missing its `end`"),
                    })
                }
                Some(TokenKind::Ident(w)) if w == "end" => {
                    self.pos += 1;
                    return Ok(stanzas);
                }
                Some(TokenKind::Ident(w)) => {
                    let line = self.line();
                    self.pos += 1;
                    stanzas.push(self.stanza(w.clone(), line)?);
                }
                Some(other) => {
                    return Err(self.error(format!("unexpected {other} at start of a stanza")));
                }
            }
        }
    }

    fn stanza(&mut self, name: String, line: usize) -> Result<Stanza, SyntaxError> {
        let implicit_block = IMPLICIT_BLOCK_KEYWORDS.contains(&name.as_str());
        let args = self.args()?;

        let body = if self.at_ident("do") {
            self.pos += 1;
            self.skip_block_params();
            Some(self.body(line)?)
        } else if implicit_block {
            Some(self.body(line)?)
        } else {
            None
        };
        Ok(Stanza {
            name,
            args,
            body,
            line,
        })
    }

    /// `do |a, b|`
    fn skip_block_params(&mut self) {
        if !matches!(self.peek(), Some(TokenKind::Punct('|'))) {
            return;
        }
        self.pos += 1;
        while let Some(kind) = self.bump() {
            if matches!(kind, TokenKind::Punct('|') | TokenKind::Newline) {
                break;
            }
        }
    }

    fn args(&mut self) -> Result<Vec<Arg>, SyntaxError> {
        let mut args = Vec::new();
        loop {
            match self.peek() {
                None | Some(TokenKind::Newline) => break,
                Some(TokenKind::Ident(w)) if w == "do" || w == "end" => break,
                Some(TokenKind::Comma) => {
                    self.pos += 1;
                    self.skip_newlines();
                }
                Some(TokenKind::LParen | TokenKind::RParen) => self.pos += 1,
                Some(TokenKind::Key(k)) => {
                    let key = k.clone();
                    self.pos += 1;
                    self.skip_newlines();
                    let value = self.value()?;
                    args.push(Arg {
                        key: Some(key),
                        value,
                    });
                }
                Some(_) => {
                    let value = self.value()?;
                    args.push(Arg { key: None, value });
                }
            }
        }
        Ok(args)
    }

    fn value(&mut self) -> Result<Value, SyntaxError> {
        let open_line = self.line();
        let Some(kind) = self.bump() else {
            return Err(self.error("expected a value"));
        };
        Ok(match kind {
            TokenKind::Str(s) => Value::Str(s.clone()),
            TokenKind::Symbol(s) => Value::Symbol(s.clone()),
            TokenKind::Ident(s) => Value::Ident(s.clone()),
            TokenKind::Number(s) => Value::Number(s.clone()),
            // hash entries inside arrays: keep the value, drop the key
            TokenKind::Key(_) => {
                self.skip_newlines();
                return self.value();
            }
            TokenKind::LBracket => return self.array(open_line),
            other => Value::Other(other.to_string()),
        })
    }

    fn array(&mut self, open_line: usize) -> Result<Value, SyntaxError> {
        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                None => {
                    return Err(SyntaxError {
                        line: open_line,
                        reason: format!("`[` opened on line {open_line} is never closed"),
                    })
                }
                Some(TokenKind::RBracket) => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                Some(TokenKind::Comma) => self.pos += 1,
                Some(_) => items.push(self.value()?),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn doc(input: &str) -> Result<Document, SyntaxError> {
        parse_document(&tokenize(input).unwrap())
    }

    #[test]
    fn parses_nested_blocks() {
        let d = doc(
            r#"cask "x" do
  livecheck do
    url :url
    strategy :github_latest
  end
end
"#,
        )
        .unwrap();
        assert_eq!(d.token, "x");
        let live = &d.stanzas[0];
        assert_eq!(live.name, "livecheck");
        let body = live.body.as_ref().unwrap();
        assert_eq!(body[0].first_positional(), Some(&Value::Symbol("url".into())));
        assert_eq!(body[1].name, "strategy");
    }

    #[test]
    fn continues_arguments_after_comma() {
        let d = doc(
            r#"cask "x" do
  sha256 arm:   "aa",
         intel: "bb"
  url "https://e/x.dmg",
      verified: "e/"
end
"#,
        )
        .unwrap();
        let sha = &d.stanzas[0];
        assert_eq!(sha.get("arm"), Some(&Value::Str("aa".into())));
        assert_eq!(sha.get("intel"), Some(&Value::Str("bb".into())));
        assert_eq!(d.stanzas[1].get("verified").and_then(Value::as_str), Some("e/"));
    }

    #[test]
    fn parses_multiline_arrays_with_trailing_comma() {
        let d = doc(
            r#"cask "x" do
  zap trash: [
    "~/a",
    "~/b",
  ]
end
"#,
        )
        .unwrap();
        let trash = d.stanzas[0].get("trash").unwrap();
        assert_eq!(trash.strings(), vec!["~/a", "~/b"]);
    }

    #[test]
    fn skips_unknown_blocks_structurally() {
        let d = doc(
            r##"cask "x" do
  preflight do
    system_command "xattr",
                   args: ["-cr", "#{staged_path}/X.app"]
  end
  if MacOS.version <= :mojave
    app "old.app"
  end
end
"##,
        )
        .unwrap();
        assert_eq!(d.stanzas.len(), 2);
        assert_eq!(d.stanzas[1].name, "if");
    }

    #[test]
    fn missing_end_reports_opening_line() {
        let err = doc("cask \"x\" do\n  livecheck do\n    url :url\nend\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.reason.contains("missing its `end`"));
    }

    #[test]
    fn rejects_trailing_content() {
        let err = doc("cask \"x\" do\nend\nversion \"1\"\n").unwrap_err();
        assert!(err.reason.contains("after the closing"));
    }

    #[test]
    fn rejects_missing_header() {
        assert!(doc("version \"1\"\n").is_err());
        assert!(doc("cask do\nend\n").is_err());
        assert!(doc("cask \"x\"\nend\n").is_err());
    }

    #[test]
    fn unclosed_bracket_is_an_error() {
        let err = doc("cask \"x\" do\n  zap trash: [\n    \"~/a\",\n").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
