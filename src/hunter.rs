//! Call-shaped syscall detection
//!
//! Looks for `name(` (whitespace allowed before the parenthesis) for every
//! catalog name. This will miss calls made through macros or function
//! pointers, and will report a local function that happens to share a
//! syscall's name.

use crate::catalog::SyscallCatalog;
use crate::error::Result;
use crate::inventory::read_lossy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;

/// Scans source text for calls to catalog syscalls
#[derive(Debug, Clone)]
pub struct SyscallHunter {
    /// `None` when the catalog is empty
    pattern: Option<Regex>,
}

impl SyscallHunter {
    pub fn new(catalog: &SyscallCatalog) -> Result<Self> {
        if catalog.is_empty() {
            return Ok(Self { pattern: None });
        }

        let mut names: Vec<&str> = catalog.iter().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = Regex::new(&format!(r"\b({})\s*\(", alternation))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Distinct syscalls called in `content`
    pub fn hunt(&self, content: &str) -> BTreeSet<String> {
        let Some(pattern) = &self.pattern else {
            return BTreeSet::new();
        };
        pattern
            .captures_iter(content)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Distinct syscalls called in the file at `path`
    ///
    /// An unreadable file is logged and yields an empty set.
    pub fn hunt_file(&self, path: &Path) -> BTreeSet<String> {
        match read_lossy(path) {
            Ok(content) => self.hunt(&content),
            Err(e) => {
                tracing::warn!("File '{}' not readable: {}", path.display(), e);
                BTreeSet::new()
            }
        }
    }
}
