//! Lightweight C/C++ preprocessor-aware tokenizer
//!
//! This is not a preprocessor. It recognizes just enough of the language to
//! pull `#include` targets, `#define` names and plain identifiers out of a
//! file without being fooled by text inside comments or string literals.
//!
//! A directive is only recognized when `#` is the first non-blank character of
//! a line. Block comments are treated as a single space, so
//! `/* note */ #include <a.h>` is still an include.

/// Include directive flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IncludeKind {
    /// `#include <name>`
    System,
    /// `#include "name"`
    Local,
}

/// A token the analysis cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Include { name: &'a str, kind: IncludeKind },
    /// Name introduced by `#define NAME`
    Define(&'a str),
    /// Identifier in ordinary code (keywords excluded)
    Ident(&'a str),
}

/// Single-pass tokenizer over C/C++ source text
pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line_start: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line_start: true,
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_line_comment(&mut self) {
        match self.src[self.pos..].find('\n') {
            Some(off) => self.pos += off,
            None => self.pos = self.bytes.len(),
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        match self.src[self.pos..].find("*/") {
            Some(off) => self.pos += off + 2,
            None => self.pos = self.bytes.len(),
        }
    }

    /// Skip a string or character literal; an unterminated one ends at the newline
    fn skip_quoted(&mut self, quote: u8) {
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                b'\n' => return,
                c if c == quote => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn skip_blanks(&mut self) {
        while let Some(b' ' | b'\t') = self.peek_at(0) {
            self.pos += 1;
        }
    }

    fn consume_ident(&mut self) -> &'a str {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Skip to the end of a directive, honouring line continuations
    fn skip_directive_rest(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\n' => return,
                b'\\' if self.peek_at(1) == Some(b'\n') => self.pos += 2,
                b'\\' if self.peek_at(1) == Some(b'\r') && self.peek_at(2) == Some(b'\n') => {
                    self.pos += 3
                }
                b'/' if self.peek_at(1) == Some(b'*') => self.skip_block_comment(),
                b'/' if self.peek_at(1) == Some(b'/') => {
                    self.skip_line_comment();
                    return;
                }
                q @ (b'"' | b'\'') => self.skip_quoted(q),
                _ => self.pos += 1,
            }
        }
    }

    /// Read the delimited target of an include, up to `close` on the same line
    fn include_target(&mut self, close: u8) -> Option<&'a str> {
        let start = self.pos + 1;
        let mut end = start;
        while end < self.bytes.len() {
            match self.bytes[end] {
                b'\n' => return None,
                c if c == close => {
                    self.pos = end + 1;
                    let name = self.src[start..end].trim();
                    return (!name.is_empty()).then_some(name);
                }
                _ => end += 1,
            }
        }
        None
    }

    /// Parse a directive starting at `#`
    fn directive(&mut self) -> Option<Token<'a>> {
        self.pos += 1;
        self.line_start = false;
        self.skip_blanks();

        let token = match self.consume_ident() {
            "include" => {
                self.skip_blanks();
                match self.peek_at(0) {
                    Some(b'<') => self
                        .include_target(b'>')
                        .map(|name| Token::Include {
                            name,
                            kind: IncludeKind::System,
                        }),
                    Some(b'"') => self
                        .include_target(b'"')
                        .map(|name| Token::Include {
                            name,
                            kind: IncludeKind::Local,
                        }),
                    _ => None,
                }
            }
            "define" => {
                self.skip_blanks();
                match self.peek_at(0) {
                    Some(b) if is_ident_start(b) => Some(Token::Define(self.consume_ident())),
                    _ => None,
                }
            }
            _ => None,
        };

        self.skip_directive_rest();
        token
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            match b {
                b'\n' => {
                    self.pos += 1;
                    self.line_start = true;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek_at(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek_at(1) == Some(b'*') => self.skip_block_comment(),
                b'"' | b'\'' => {
                    self.line_start = false;
                    self.skip_quoted(b);
                }
                b'#' if self.line_start => {
                    if let Some(token) = self.directive() {
                        return Some(token);
                    }
                }
                _ if is_ident_start(b) => {
                    self.line_start = false;
                    let word = self.consume_ident();
                    if !is_keyword(word) {
                        return Some(Token::Ident(word));
                    }
                }
                _ if b.is_ascii_digit() => {
                    // numeric literal, including suffixes and hex digits
                    self.line_start = false;
                    while self.pos < self.bytes.len()
                        && (is_ident_continue(self.bytes[self.pos]) || self.bytes[self.pos] == b'.')
                    {
                        self.pos += 1;
                    }
                }
                _ => {
                    self.line_start = false;
                    self.pos += 1;
                }
            }
        }
        None
    }
}

/// Targets of every include directive in `src`, in order of appearance
pub fn includes(src: &str) -> impl Iterator<Item = (&str, IncludeKind)> {
    Lexer::new(src).filter_map(|token| match token {
        Token::Include { name, kind } => Some((name, kind)),
        _ => None,
    })
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

const KEYWORDS: &[&str] = &[
    "alignas", "alignof", "asm", "auto", "bool", "break", "case", "catch", "char", "class",
    "const", "constexpr", "const_cast", "continue", "decltype", "default", "delete", "do",
    "double", "dynamic_cast", "else", "enum", "explicit", "extern", "false", "float", "for",
    "friend", "goto", "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept",
    "nullptr", "operator", "private", "protected", "public", "register", "reinterpret_cast",
    "restrict", "return", "short", "signed", "sizeof", "static", "static_assert", "static_cast",
    "struct", "switch", "template", "this", "throw", "true", "try", "typedef", "typeid",
    "typename", "union", "unsigned", "using", "virtual", "void", "volatile", "while",
    "_Bool", "_Complex", "_Noreturn", "_Static_assert", "_Thread_local",
];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}
