//! Analysis configuration
//!
//! Settings can come from a TOML file and are then overridden by command-line
//! flags. Every field has a default, so a file only needs the keys it changes:
//!
//! ```toml
//! repositories = "repos"
//! include_root = "/opt/sysroot/usr/include"
//! output = "out"
//! match_mode = "substring"
//!
//! [api]
//! enabled = true
//! lookup_cmd = "/srv/elixir/query.py"
//! target_version = "v6.1"
//! ```

use crate::error::{HunterError, Result};
use crate::mapper::MatchMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the syscall reference table
pub const DEFAULT_CATALOG: &str = "strace_calls.txt";

/// Settings for the optional external identifier lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    /// Cross-reference command, run as `<cmd> <version> ident <name> C`
    pub lookup_cmd: Option<PathBuf>,
    /// Version of the referenced code base passed to the lookup command
    pub target_version: String,
}

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HunterConfig {
    /// Directory whose immediate subdirectories are the repositories to analyse
    pub repositories: PathBuf,
    /// Root under which include names are resolved
    pub include_root: PathBuf,
    /// Output directory; cleared at the start of a run
    pub output: PathBuf,
    /// Syscall reference table
    pub catalog: PathBuf,
    /// Use the built-in x86_64 table when `catalog` does not exist
    pub builtin_catalog: bool,
    pub match_mode: MatchMode,
    /// Follow `#include "name"` directives of source files
    pub follow_local_includes: bool,
    /// Write the syscall -> header association
    pub echo: bool,
    /// Write header list, per-file syscalls and line numbers
    pub dev_echo: bool,
    /// Analyse repositories concurrently
    pub parallel: bool,
    pub api: ApiConfig,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            repositories: PathBuf::new(),
            include_root: PathBuf::new(),
            output: PathBuf::new(),
            catalog: PathBuf::from(DEFAULT_CATALOG),
            builtin_catalog: false,
            match_mode: MatchMode::default(),
            follow_local_includes: false,
            echo: true,
            dev_echo: true,
            parallel: false,
            api: ApiConfig::default(),
        }
    }
}

impl HunterConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| HunterError::read(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| HunterError::Config(e.to_string()))
    }

    /// Check that the required locations are set and exist
    pub fn validate(&self) -> Result<()> {
        if self.repositories.as_os_str().is_empty() {
            return Err(HunterError::Config("repositories directory is not set".into()));
        }
        if !self.repositories.is_dir() {
            return Err(HunterError::Config(format!(
                "repositories directory does not exist: {}",
                self.repositories.display()
            )));
        }
        if self.include_root.as_os_str().is_empty() {
            return Err(HunterError::Config("include root is not set".into()));
        }
        if !self.include_root.is_dir() {
            return Err(HunterError::Config(format!(
                "include root does not exist: {}",
                self.include_root.display()
            )));
        }
        if self.output.as_os_str().is_empty() {
            return Err(HunterError::Config("output directory is not set".into()));
        }

        // The output directory is wiped at the start of a run
        let output = normalized(&self.output);
        for (label, input) in [
            ("repositories directory", &self.repositories),
            ("include root", &self.include_root),
        ] {
            let input = normalized(input);
            if output.starts_with(&input) || input.starts_with(&output) {
                return Err(HunterError::Config(format!(
                    "output directory {} overlaps the {} {}",
                    output.display(),
                    label,
                    input.display()
                )));
            }
        }
        if self.api.enabled && self.api.lookup_cmd.is_none() {
            return Err(HunterError::Config(
                "identifier lookup enabled without a lookup command".into(),
            ));
        }
        Ok(())
    }
}

/// Absolute form of `path`, with symlinks and `..` resolved for the part
/// that already exists
fn normalized(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute.clone(),
        }
    }
}
