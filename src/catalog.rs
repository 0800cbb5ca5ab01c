//! Syscall catalog: the set of names the analysis looks for
//!
//! The reference table is plain text, one syscall per line:
//!
//! ```text
//!   0  read        sys_read
//!   1  write       sys_write
//! ```
//!
//! Only the leading number and the name matter; anything else on the line is
//! ignored, and lines that do not start with `<number> <name>` are skipped.

use crate::error::{HunterError, Result};
use crate::syscalls::{syscall_number, X86_64_SYSCALLS};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

static LINE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn line_pattern() -> &'static Regex {
    LINE_PATTERN.get_or_init(|| {
        Regex::new(r"^\s*\d+\s+(\w+)(?:\s|$)").expect("catalog line pattern is valid")
    })
}

/// Immutable set of recognized syscall names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyscallCatalog {
    names: BTreeSet<String>,
}

impl SyscallCatalog {
    /// Load a reference table from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HunterError::CatalogNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| HunterError::read(path, e))?;
        let catalog = Self::parse(&text);
        tracing::info!(
            "Loaded {} syscalls from {}",
            catalog.len(),
            path.display()
        );
        let foreign = catalog.non_x86_64().count();
        if foreign > 0 {
            tracing::debug!("{} catalog names are not x86_64 syscalls", foreign);
        }
        Ok(catalog)
    }

    /// Parse reference table text; lines of any other shape are skipped
    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .filter_map(|line| line_pattern().captures(line))
            .map(|caps| caps[1].to_string())
            .collect();
        Self { names }
    }

    /// Catalog of every syscall in the built-in x86_64 table
    pub fn builtin() -> Self {
        Self::from_names(X86_64_SYSCALLS.iter().map(|&(_, name)| name))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Names without an entry in the built-in x86_64 table
    pub fn non_x86_64(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|name| syscall_number(name).is_none())
    }
}
