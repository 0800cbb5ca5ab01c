//! Line-accurate symbol occurrences
//!
//! A line counts when the symbol appears as a whole word and the trimmed line
//! does not open with `"`, `/*`, `*` or `//`. This is a per-line heuristic:
//! no comment state is carried between lines, so a block comment whose inner
//! lines start with plain text will still produce matches.

use crate::error::Result;
use crate::inventory::read_lossy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 1-indexed line number -> trimmed line text
pub type Occurrences = BTreeMap<usize, String>;

const EXCLUDED_LINE_PREFIXES: &[&str] = &["\"", "/*", "*", "//"];

/// Finds the lines of a file that reference one symbol
#[derive(Debug, Clone)]
pub struct OccurrenceLocator {
    symbol: String,
    pattern: Regex,
}

impl OccurrenceLocator {
    pub fn new(symbol: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(symbol)))?;
        Ok(Self {
            symbol: symbol.to_string(),
            pattern,
        })
    }

    /// Occurrences within already loaded text
    pub fn locate_in(&self, content: &str) -> Occurrences {
        content
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| {
                let trimmed = line.trim();
                if is_excluded(trimmed) || !self.pattern.is_match(line) {
                    return None;
                }
                Some((idx + 1, trimmed.to_string()))
            })
            .collect()
    }

    /// Occurrences within one file; an unreadable file yields nothing
    pub fn locate(&self, path: &Path) -> Occurrences {
        match read_lossy(path) {
            Ok(content) => self.locate_in(&content),
            Err(e) => {
                tracing::warn!(
                    "File '{}' not readable while locating {}: {}",
                    path.display(),
                    self.symbol,
                    e
                );
                Occurrences::new()
            }
        }
    }

    /// Occurrences across many files, omitting files without any
    pub fn locate_all<'a, I>(&self, files: I) -> BTreeMap<PathBuf, Occurrences>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        files
            .into_iter()
            .filter_map(|path| {
                let found = self.locate(path);
                (!found.is_empty()).then(|| (path.to_path_buf(), found))
            })
            .collect()
    }
}

fn is_excluded(trimmed: &str) -> bool {
    EXCLUDED_LINE_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
}

/// Shorthand for a single file and symbol
pub fn find_occurrences(path: &Path, symbol: &str) -> Result<Occurrences> {
    Ok(OccurrenceLocator::new(symbol)?.locate(path))
}
