//! External identifier lookup
//!
//! Collects the function-like identifiers of a repository, asks an external
//! cross-reference tool about each one, and keeps the identifiers it reports
//! as functions.
//!
//! The lookup tool is invoked as `<program> <version> ident <name> C` and is
//! expected to print sections like:
//!
//! ```text
//! Symbol Definitions:
//! include/linux/fs.h:1234 (type: function)
//!
//! Symbol References:
//! ...
//!
//! Documented in:
//! ```
//!
//! Outputs are concatenated as `^^ <name>` blocks before parsing.

use crate::error::{HunterError, Result};
use crate::inventory::{read_lossy, Language, SourceFile};
use crate::lexer::{Lexer, Token};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;

const BLOCK_MARKER: &str = "^^";
const SECTION_HEADERS: &[&str] = &["Symbol Definitions:", "Symbol References:", "Documented in:"];

static TYPE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn type_pattern() -> &'static Regex {
    TYPE_PATTERN.get_or_init(|| Regex::new(r"type: (\w+)").expect("type pattern is valid"))
}

/// Source of free-text information about an identifier
pub trait SymbolLookup {
    fn lookup(&self, name: &str) -> Result<String>;
}

/// Runs an external cross-reference command per identifier
#[derive(Debug, Clone)]
pub struct CommandLookup {
    program: PathBuf,
    version: String,
}

impl CommandLookup {
    pub fn new(program: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            version: version.into(),
        }
    }
}

impl SymbolLookup for CommandLookup {
    fn lookup(&self, name: &str) -> Result<String> {
        let output = Command::new(&self.program)
            .args([self.version.as_str(), "ident", name, "C"])
            .output()
            .map_err(|e| {
                HunterError::Lookup(format!("cannot run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            return Err(HunterError::Lookup(format!(
                "{} exited with {} for '{}': {}",
                self.program.display(),
                output.status,
                name,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// An identifier with the kinds the lookup reported for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiEntry {
    pub name: String,
    pub types: BTreeSet<String>,
}

impl ApiEntry {
    pub fn is_function(&self) -> bool {
        self.types.contains("function")
    }
}

/// Outcome of the identifier lookup for one repository
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiReport {
    pub identifiers: usize,
    /// Identifiers the lookup knew nothing about
    pub false_positives: BTreeSet<String>,
    /// Cleaned, concatenated lookup output
    #[serde(skip)]
    pub annotated: String,
    pub entries: Vec<ApiEntry>,
}

impl ApiReport {
    /// Function identifiers and their kinds, as written to the JSON artifact
    pub fn functions(&self) -> BTreeMap<&str, Vec<&str>> {
        self.entries
            .iter()
            .filter(|entry| entry.is_function())
            .map(|entry| {
                (
                    entry.name.as_str(),
                    entry.types.iter().map(String::as_str).collect(),
                )
            })
            .collect()
    }

    pub fn functions_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.functions())?)
    }
}

/// Identifiers used in a repository's code, minus macro names
///
/// C files are preferred; C++ files are only used when there are no C files.
pub fn extract_identifiers<'a, I>(sources: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a SourceFile>,
{
    let sources: Vec<&SourceFile> = sources.into_iter().collect();
    let has_c = sources.iter().any(|s| s.language == Language::C);

    let mut identifiers = BTreeSet::new();
    let mut macros = BTreeSet::new();

    for source in sources {
        if has_c && source.language != Language::C {
            continue;
        }
        let content = match read_lossy(&source.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Source file not readable: {}: {}", source.path.display(), e);
                continue;
            }
        };
        for token in Lexer::new(&content) {
            match token {
                Token::Ident(name) => {
                    identifiers.insert(name.to_string());
                }
                Token::Define(name) => {
                    macros.insert(name.to_string());
                }
                Token::Include { .. } => {}
            }
        }
    }

    identifiers.retain(|name| !macros.contains(name));
    identifiers
}

/// Query every identifier and concatenate the answers into `^^` blocks
///
/// A failed lookup is logged and leaves an empty block.
pub fn collect_annotations<L, I, S>(lookup: &L, identifiers: I) -> String
where
    L: SymbolLookup + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for name in identifiers {
        let name = name.as_ref();
        out.push_str(BLOCK_MARKER);
        out.push(' ');
        out.push_str(name);
        out.push('\n');
        match lookup.lookup(name) {
            Ok(text) => out.push_str(&text),
            Err(e) => tracing::warn!("Lookup failed for '{}': {}", name, e),
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Split annotated text into `(name, body lines)` blocks
fn blocks(text: &str) -> Vec<(&str, Vec<&str>)> {
    let mut blocks: Vec<(&str, Vec<&str>)> = Vec::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(BLOCK_MARKER) {
            blocks.push((rest.trim(), Vec::new()));
        } else if let Some((_, body)) = blocks.last_mut() {
            body.push(line);
        }
    }
    blocks
}

/// Identifiers whose block holds nothing but empty sections
pub fn false_positives(text: &str) -> BTreeSet<String> {
    blocks(text)
        .into_iter()
        .filter(|(_, body)| {
            body.iter()
                .map(|line| line.trim())
                .all(|line| line.is_empty() || SECTION_HEADERS.contains(&line))
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Drop false-positive blocks and empty section headers
pub fn clean_annotations(text: &str) -> String {
    let fps = false_positives(text);
    let mut out = String::new();

    for (name, body) in blocks(text) {
        if fps.contains(name) {
            continue;
        }
        out.push_str(BLOCK_MARKER);
        out.push(' ');
        out.push_str(name);
        out.push('\n');

        let mut idx = 0;
        while idx < body.len() {
            let line = body[idx];
            let next_blank = body.get(idx + 1).map_or(true, |l| l.trim().is_empty());
            if SECTION_HEADERS.contains(&line.trim()) && next_blank {
                idx += 2;
                continue;
            }
            out.push_str(line);
            out.push('\n');
            idx += 1;
        }
    }
    out
}

/// Parse annotated text into identifiers and their `type:` tags
pub fn parse_annotations(text: &str) -> Vec<ApiEntry> {
    blocks(text)
        .into_iter()
        .map(|(name, body)| ApiEntry {
            name: name.to_string(),
            types: body
                .iter()
                .filter_map(|line| type_pattern().captures(line))
                .map(|caps| caps[1].to_string())
                .collect(),
        })
        .collect()
}

/// Run the whole lookup flow over a repository's sources
pub fn query_repository<'a, L, I>(lookup: &L, sources: I) -> ApiReport
where
    L: SymbolLookup + ?Sized,
    I: IntoIterator<Item = &'a SourceFile>,
{
    let identifiers = extract_identifiers(sources);
    tracing::info!("Running lookups for {} identifiers", identifiers.len());

    let raw = collect_annotations(lookup, &identifiers);
    let false_positives = false_positives(&raw);
    let annotated = clean_annotations(&raw);
    let entries = parse_annotations(&annotated);

    ApiReport {
        identifiers: identifiers.len(),
        false_positives,
        annotated,
        entries,
    }
}
