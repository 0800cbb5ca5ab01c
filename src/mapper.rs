//! Syscall-to-header association
//!
//! Every resolved header is scanned once for every catalog name in a single
//! Aho-Corasick pass. A hit associates the header with that syscall.

use crate::catalog::SyscallCatalog;
use crate::error::Result;
use crate::inventory::read_lossy;
use crate::prefix_set::PrefixSet;
use aho_corasick::{AhoCorasick, MatchKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Syscall name -> headers whose text mentions it
pub type SyscallHeaderMap = BTreeMap<String, BTreeSet<String>>;

/// How a syscall name must appear in header text to count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Name not flanked by identifier characters (`open` does not match `opendir`)
    #[default]
    WordBoundary,
    /// Plain substring containment
    Substring,
}

/// Builds a [`SyscallHeaderMap`] from resolved headers
#[derive(Debug)]
pub struct SyscallHeaderMapper {
    names: Vec<String>,
    matcher: AhoCorasick,
    mode: MatchMode,
    scanned: PrefixSet,
}

impl SyscallHeaderMapper {
    pub fn new(catalog: &SyscallCatalog, mode: MatchMode) -> Result<Self> {
        let names: Vec<String> = catalog.iter().map(str::to_string).collect();
        // Overlapping search needs standard semantics: `open` and `openat`
        // must both be reported at the same offset.
        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&names)?;
        Ok(Self {
            names,
            matcher,
            mode,
            scanned: PrefixSet::new(),
        })
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Catalog names present in `content` under the configured mode
    pub fn syscalls_in<'s>(&'s self, content: &str) -> BTreeSet<&'s str> {
        let bytes = content.as_bytes();
        let mut found = BTreeSet::new();

        for mat in self.matcher.find_overlapping_iter(content) {
            let hit = match self.mode {
                MatchMode::Substring => true,
                MatchMode::WordBoundary => {
                    let before = mat.start().checked_sub(1).map(|i| bytes[i]);
                    let after = bytes.get(mat.end()).copied();
                    !before.is_some_and(is_ident_byte) && !after.is_some_and(is_ident_byte)
                }
            };
            if hit {
                found.insert(self.names[mat.pattern().as_usize()].as_str());
            }
        }
        found
    }

    /// Associate catalog syscalls with the headers that mention them
    ///
    /// `headers` maps include names to resolved paths. A path scanned by an
    /// earlier call on this mapper is not read again.
    pub fn map_headers(&mut self, headers: &BTreeMap<String, PathBuf>) -> SyscallHeaderMap {
        let mut map = SyscallHeaderMap::new();
        self.extend_map(&mut map, headers);
        map
    }

    /// Like [`map_headers`](Self::map_headers), accumulating into `map`
    pub fn extend_map(&mut self, map: &mut SyscallHeaderMap, headers: &BTreeMap<String, PathBuf>) {
        for (name, path) in headers {
            let key = path.to_string_lossy();
            if self.scanned.contains(&key) {
                continue;
            }
            let content = match read_lossy(path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Header file not found: {}: {}", path.display(), e);
                    continue;
                }
            };
            self.scanned.insert(&key);

            for syscall in self.syscalls_in(&content) {
                map.entry(syscall.to_string())
                    .or_default()
                    .insert(name.clone());
            }
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn catalog(names: &[&str]) -> SyscallCatalog {
        SyscallCatalog::from_names(names.iter().copied())
    }

    #[test]
    fn test_word_boundary_rejects_longer_identifier() {
        let mapper = SyscallHeaderMapper::new(&catalog(&["open"]), MatchMode::WordBoundary).unwrap();
        assert!(mapper.syscalls_in("extern DIR *opendir(const char *);").is_empty());
        assert!(mapper.syscalls_in("int __open_2(void);").is_empty());
        assert_eq!(
            mapper.syscalls_in("extern int open (const char *, int, ...);"),
            BTreeSet::from(["open"])
        );
    }

    #[test]
    fn test_substring_mode_matches_inside_identifiers() {
        let mapper = SyscallHeaderMapper::new(&catalog(&["open"]), MatchMode::Substring).unwrap();
        assert_eq!(mapper.syscalls_in("opendir"), BTreeSet::from(["open"]));
    }

    #[test]
    fn test_overlapping_names_both_found() {
        let mapper =
            SyscallHeaderMapper::new(&catalog(&["open", "openat"]), MatchMode::Substring).unwrap();
        assert_eq!(mapper.syscalls_in("openat"), BTreeSet::from(["open", "openat"]));

        let mapper =
            SyscallHeaderMapper::new(&catalog(&["open", "openat"]), MatchMode::WordBoundary)
                .unwrap();
        assert_eq!(mapper.syscalls_in("openat(fd)"), BTreeSet::from(["openat"]));
    }

    #[test]
    fn test_match_at_text_edges() {
        let mapper = SyscallHeaderMapper::new(&catalog(&["read"]), MatchMode::WordBoundary).unwrap();
        assert_eq!(mapper.syscalls_in("read"), BTreeSet::from(["read"]));
        assert_eq!(mapper.syscalls_in("(read)"), BTreeSet::from(["read"]));
    }

    #[test]
    fn test_map_headers_completeness() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("sched.h");
        fs::write(&path, "extern int clone3 (struct clone_args *, size_t);\n").unwrap();

        let mut mapper =
            SyscallHeaderMapper::new(&catalog(&["clone3", "fork"]), MatchMode::WordBoundary)
                .unwrap();
        let headers = BTreeMap::from([("sched.h".to_string(), path)]);
        let map = mapper.map_headers(&headers);

        assert_eq!(map.len(), 1);
        assert!(map["clone3"].contains("sched.h"));
    }

    #[test]
    fn test_header_scanned_once() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("unistd.h");
        fs::write(&path, "ssize_t write(int, const void *, size_t);\n").unwrap();
        let headers = BTreeMap::from([("unistd.h".to_string(), path.clone())]);

        let mut mapper =
            SyscallHeaderMapper::new(&catalog(&["write"]), MatchMode::WordBoundary).unwrap();
        let first = mapper.map_headers(&headers);
        assert_eq!(first.len(), 1);

        // A second pass over an already scanned path contributes nothing
        let second = mapper.map_headers(&headers);
        assert!(second.is_empty());
    }

    #[test]
    fn test_missing_header_skipped() {
        let mut mapper =
            SyscallHeaderMapper::new(&catalog(&["write"]), MatchMode::WordBoundary).unwrap();
        let headers = BTreeMap::from([(
            "gone.h".to_string(),
            PathBuf::from("/nonexistent/include/gone.h"),
        )]);
        assert!(mapper.map_headers(&headers).is_empty());
    }

    #[test]
    fn test_empty_catalog() {
        let mapper = SyscallHeaderMapper::new(&SyscallCatalog::default(), MatchMode::Substring).unwrap();
        assert!(mapper.syscalls_in("open read write").is_empty());
    }
}
