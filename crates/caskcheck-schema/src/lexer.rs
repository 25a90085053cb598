//! Tokenizer for the subset of cask syntax the parser understands.
//!
//! The lexer never evaluates anything: string interpolations (`#{...}`) are
//! kept verbatim inside the string token, and unknown punctuation is passed
//! through as [`TokenKind::Punct`] so that unrecognized stanzas can still be
//! skipped structurally. Regex literals (`/.../i`) are kept whole for the same
//! reason: a quote inside one must not open a string.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    /// String literal contents with `\"` and `\\` unescaped.
    Str(String),
    /// `:name`
    Symbol(String),
    /// `name:` in keyword-argument position.
    Key(String),
    Number(String),
    /// `/body/flags`, verbatim.
    Regex(String),
    Comma,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Newline,
    Punct(char),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s) | TokenKind::Number(s) => write!(f, "`{s}`"),
            TokenKind::Str(s) => write!(f, "string \"{s}\""),
            TokenKind::Symbol(s) => write!(f, "symbol `:{s}`"),
            TokenKind::Key(s) => write!(f, "key `{s}:`"),
            TokenKind::Regex(s) => write!(f, "regex `{s}`"),
            TokenKind::Comma => f.write_str("`,`"),
            TokenKind::LBracket => f.write_str("`[`"),
            TokenKind::RBracket => f.write_str("`]`"),
            TokenKind::LParen => f.write_str("`(`"),
            TokenKind::RParen => f.write_str("`)`"),
            TokenKind::Newline => f.write_str("end of line"),
            TokenKind::Punct(c) => write!(f, "`{c}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub reason: String,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
    line: usize,
    out: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.char_indices().peekable(),
            src,
            line: 1,
            out: Vec::new(),
        }
    }

    fn push(&mut self, kind: TokenKind) {
        self.out.push(Token {
            kind,
            line: self.line,
        });
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while let Some((pos, c)) = self.chars.next() {
            match c {
                '\n' | ';' => {
                    self.push(TokenKind::Newline);
                    if c == '\n' {
                        self.line += 1;
                    }
                }
                c if c.is_whitespace() => {}
                '#' => self.skip_comment(),
                '"' | '\'' => {
                    let s = self.string(c)?;
                    self.push(TokenKind::Str(s));
                }
                ',' => self.push(TokenKind::Comma),
                '[' => self.push(TokenKind::LBracket),
                ']' => self.push(TokenKind::RBracket),
                '(' => self.push(TokenKind::LParen),
                ')' => self.push(TokenKind::RParen),
                ':' => self.symbol_or_punct(),
                '/' if self.regex_allowed(pos) => {
                    let body = self.regex()?;
                    self.push(TokenKind::Regex(body));
                }
                c if c.is_ascii_digit() => {
                    let end = self.take_while(pos, |ch| ch.is_ascii_alphanumeric() || ch == '.' || ch == '_');
                    self.push(TokenKind::Number(self.src[pos..end].to_owned()));
                }
                c if is_ident_start(c) => self.ident(pos),
                other => self.push(TokenKind::Punct(other)),
            }
        }
        Ok(self.out)
    }

    fn skip_comment(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    /// Advance while `pred` holds; returns the byte offset one past the run.
    fn take_while(&mut self, start: usize, pred: impl Fn(char) -> bool) -> usize {
        let mut end = start + 1;
        while let Some(&(i, c)) = self.chars.peek() {
            if !pred(c) {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        end
    }

    fn ident(&mut self, start: usize) {
        let mut end = self.take_while(start, is_ident_continue);
        if let Some(&(i, c @ ('?' | '!'))) = self.chars.peek() {
            end = i + c.len_utf8();
            self.chars.next();
        }
        let word = self.src[start..end].to_owned();

        // `key:` but not `Const::Path`
        let mut ahead = self.src[end..].chars();
        if ahead.next() == Some(':') && ahead.next() != Some(':') {
            self.chars.next();
            self.push(TokenKind::Key(word));
        } else {
            self.push(TokenKind::Ident(word));
        }
    }

    fn symbol_or_punct(&mut self) {
        match self.chars.peek() {
            Some(&(i, c)) if is_ident_start(c) => {
                self.chars.next();
                let end = self.take_while(i, is_ident_continue);
                self.push(TokenKind::Symbol(self.src[i..end].to_owned()));
            }
            _ => self.push(TokenKind::Punct(':')),
        }
    }

    /// A `/` starts a regex where an argument is expected: at the start of a
    /// line, after `(`, `[`, `,` or a key, and after a bare word when it is
    /// spaced like `regex /x/` rather than `a / b` or `a/b`.
    fn regex_allowed(&self, pos: usize) -> bool {
        match self.out.last().map(|t| &t.kind) {
            None
            | Some(
                TokenKind::Newline
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Comma
                | TokenKind::Key(_),
            ) => true,
            Some(TokenKind::Ident(_)) => {
                let before = self.src[..pos].chars().next_back();
                let after = self.src[pos + 1..].chars().next();
                before.is_some_and(char::is_whitespace) && after.is_some_and(|c| !c.is_whitespace())
            }
            Some(_) => false,
        }
    }

    fn regex(&mut self) -> Result<String, LexError> {
        let start_line = self.line;
        let mut out = String::from("/");
        loop {
            let Some((_, c)) = self.chars.next() else {
                return Err(LexError {
                    line: start_line,
                    reason: "unterminated regex literal".to_owned(),
                });
            };
            out.push(c);
            match c {
                '/' => break,
                '\\' => {
                    if let Some((_, e)) = self.chars.next() {
                        out.push(e);
                        if e == '\n' {
                            self.line += 1;
                        }
                    }
                }
                '#' if matches!(self.chars.peek(), Some(&(_, '{'))) => {
                    self.chars.next();
                    out.push('{');
                    self.interpolation(&mut out, start_line)?;
                }
                '\n' => self.line += 1,
                _ => {}
            }
        }
        while let Some(&(_, c)) = self.chars.peek() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        Ok(out)
    }

    fn string(&mut self, quote: char) -> Result<String, LexError> {
        let start_line = self.line;
        let mut out = String::new();
        loop {
            let Some((_, c)) = self.chars.next() else {
                return Err(LexError {
                    line: start_line,
                    reason: "unterminated string literal".to_owned(),
                });
            };
            match c {
                c if c == quote => return Ok(out),
                '\\' => match self.chars.next() {
                    Some((_, e)) if e == quote || e == '\\' => out.push(e),
                    Some((_, e)) => {
                        out.push('\\');
                        out.push(e);
                    }
                    None => {
                        return Err(LexError {
                            line: start_line,
                            reason: "unterminated string literal".to_owned(),
                        })
                    }
                },
                '#' if quote == '"' && matches!(self.chars.peek(), Some(&(_, '{'))) => {
                    self.chars.next();
                    out.push_str("#{");
                    self.interpolation(&mut out, start_line)?;
                }
                '\n' => {
                    self.line += 1;
                    out.push('\n');
                }
                other => out.push(other),
            }
        }
    }

    /// Copy an interpolation body verbatim up to and including its closing brace.
    fn interpolation(&mut self, out: &mut String, start_line: usize) -> Result<(), LexError> {
        let mut depth = 1usize;
        for (_, c) in self.chars.by_ref() {
            out.push(c);
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                '\n' => self.line += 1,
                _ => {}
            }
        }
        Err(LexError {
            line: start_line,
            reason: "unterminated string interpolation".to_owned(),
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
