//! Source file discovery
//!
//! Walks a repository and collects every C or C++ translation unit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Language of a source file, inferred from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Language {
    C,
    Cpp,
}

impl Language {
    /// Infer the language from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "c" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "c++" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cpp => "C++",
        }
    }
}

/// A discovered source file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceFile {
    /// Absolute path
    pub path: PathBuf,
    pub language: Language,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let language = Language::from_path(&path)?;
        Some(Self { path, language })
    }
}

/// Find all C and C++ files under `root`, recursively
///
/// Paths are made absolute. Unreadable directory entries are skipped.
pub fn find_sources(root: &Path) -> BTreeSet<SourceFile> {
    let root = absolute(root);
    let mut files = BTreeSet::new();

    for entry in WalkDir::new(&root).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(file) = SourceFile::new(entry.into_path()) {
            files.insert(file);
        }
    }

    tracing::debug!("Found {} C/C++ files under {}", files.len(), root.display());
    files
}

/// Read a file as text, replacing invalid UTF-8 sequences
///
/// Vendor headers and old sources are not always UTF-8; a stray Latin-1
/// byte in a comment should not hide the rest of the file.
pub fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_path(Path::new("a.c")), Some(Language::C));
        assert_eq!(Language::from_path(Path::new("a.cpp")), Some(Language::Cpp));
        assert_eq!(Language::from_path(Path::new("a.cc")), Some(Language::Cpp));
        assert_eq!(Language::from_path(Path::new("a.h")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_find_sources_recurses() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/net")).unwrap();
        fs::write(dir.path().join("main.c"), "int main(void) { return 0; }").unwrap();
        fs::write(dir.path().join("src/net/sock.cpp"), "").unwrap();
        fs::write(dir.path().join("src/net/sock.h"), "").unwrap();
        fs::write(dir.path().join("README"), "").unwrap();

        let files = find_sources(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.path.is_absolute()));

        let langs: Vec<_> = files.iter().map(|f| f.language).collect();
        assert!(langs.contains(&Language::C));
        assert!(langs.contains(&Language::Cpp));
    }

    #[test]
    fn test_find_sources_missing_root_is_empty() {
        let files = find_sources(Path::new("/nonexistent/repo/for/syscall-hunter"));
        assert!(files.is_empty());
    }
}
