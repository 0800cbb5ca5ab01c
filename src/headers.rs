//! Header closure resolution
//!
//! Starting from the `#include` directives of a set of source files, follows
//! nested includes under a single include root until no new header turns up.
//! Names are joined onto the root directly: there is no search path and no
//! `-I` handling.

use crate::inventory::{read_lossy, SourceFile};
use crate::lexer::{self, IncludeKind};
use crate::prefix_set::PrefixSet;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Suffixes of include targets that are resolved and expanded
pub const HEADER_SUFFIXES: &[&str] = &[".h", ".hh", ".hpp", ".hxx"];

/// Whether an include target looks like a header file
pub fn is_header_name(name: &str) -> bool {
    HEADER_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Result of resolving the include closure of one repository
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeaderClosure {
    /// Every include target seen, resolved or not
    pub discovered: BTreeSet<String>,
    /// Headers found and read under the include root
    pub resolved: BTreeMap<String, PathBuf>,
    /// Header names whose path does not exist under the include root
    pub missing: BTreeSet<String>,
    /// Headers in the order they were expanded
    pub expansion_order: Vec<String>,
    /// How many include directives named each header
    pub include_counts: BTreeMap<String, usize>,
}

/// Computes the transitive set of headers reachable from source files
#[derive(Debug)]
pub struct HeaderResolver {
    include_root: PathBuf,
    follow_local: bool,
}

impl HeaderResolver {
    pub fn new(include_root: impl Into<PathBuf>) -> Self {
        Self {
            include_root: include_root.into(),
            follow_local: false,
        }
    }

    /// Also follow `#include "name"` directives found in source files
    pub fn follow_local_includes(mut self, follow: bool) -> Self {
        self.follow_local = follow;
        self
    }

    /// Resolve the include closure of `sources`
    ///
    /// Each call starts from an empty visited set, so one resolver can serve
    /// several independent source sets.
    pub fn resolve<'a, I>(&self, sources: I) -> HeaderClosure
    where
        I: IntoIterator<Item = &'a SourceFile>,
    {
        let mut closure = HeaderClosure::default();
        let mut queue: Vec<String> = Vec::new();
        let mut visited = PrefixSet::new();

        for source in sources {
            match read_lossy(&source.path) {
                Ok(content) => {
                    self.discover(&content, true, &mut closure, &mut queue);
                }
                Err(e) => {
                    tracing::warn!("Source file not readable: {}: {}", source.path.display(), e);
                }
            }
        }

        while let Some(header) = queue.pop() {
            if !is_header_name(&header) {
                continue;
            }

            let path = self.include_root.join(&header);
            let key = path.to_string_lossy();
            if visited.contains(&key) {
                continue;
            }

            if !path.is_file() {
                tracing::warn!("Header not found: {}", path.display());
                closure.missing.insert(header);
                continue;
            }

            visited.insert(&key);
            let content = match read_lossy(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Header not readable: {}: {}", path.display(), e);
                    continue;
                }
            };

            tracing::trace!("Expanding {}", header);
            self.discover(&content, false, &mut closure, &mut queue);
            closure.expansion_order.push(header.clone());
            closure.resolved.insert(header, path);
        }

        tracing::debug!(
            "Header closure: {} discovered, {} resolved, {} missing",
            closure.discovered.len(),
            closure.resolved.len(),
            closure.missing.len()
        );
        closure
    }

    /// Record the includes of `content`; new ones go onto the work queue
    fn discover(
        &self,
        content: &str,
        from_source: bool,
        closure: &mut HeaderClosure,
        queue: &mut Vec<String>,
    ) {
        for (name, kind) in lexer::includes(content) {
            if kind == IncludeKind::Local && !(from_source && self.follow_local) {
                continue;
            }
            *closure.include_counts.entry(name.to_string()).or_default() += 1;
            if closure.discovered.insert(name.to_string()) {
                queue.push(name.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn source(dir: &Path, name: &str, content: &str) -> SourceFile {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        SourceFile::new(path).unwrap()
    }

    fn header(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_transitive_closure() {
        let repo = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        header(root.path(), "stdio.h", "#include <bits/types.h>\n");
        header(root.path(), "bits/types.h", "#include <bits/wordsize.h>\n");
        header(root.path(), "bits/wordsize.h", "#define __WORDSIZE 64\n");
        let main = source(repo.path(), "main.c", "#include <stdio.h>\nint main() {}\n");

        let closure = HeaderResolver::new(root.path()).resolve([&main]);
        let expected: BTreeSet<String> = ["stdio.h", "bits/types.h", "bits/wordsize.h"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(closure.discovered, expected);
        assert_eq!(closure.resolved.len(), 3);
        assert!(closure.missing.is_empty());
    }

    #[test]
    fn test_cycle_terminates_and_expands_once() {
        let repo = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        header(root.path(), "a.h", "#include <b.h>\n");
        header(root.path(), "b.h", "#include <a.h>\n");
        let main = source(repo.path(), "main.c", "#include <a.h>\n#include <b.h>\n");

        let closure = HeaderResolver::new(root.path()).resolve([&main]);
        assert_eq!(closure.discovered.len(), 2);
        assert_eq!(closure.expansion_order.iter().filter(|h| *h == "a.h").count(), 1);
        assert_eq!(closure.expansion_order.iter().filter(|h| *h == "b.h").count(), 1);
        assert_eq!(closure.include_counts["a.h"], 2);
        assert_eq!(closure.include_counts["b.h"], 2);
    }

    #[test]
    fn test_repeated_resolve_is_independent() {
        let repo = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        header(root.path(), "stdio.h", "#include <bits/types.h>\n");
        header(root.path(), "bits/types.h", "");
        let first = source(repo.path(), "a.c", "#include <stdio.h>\n");
        let second = source(repo.path(), "b.c", "#include <stdio.h>\n");

        let resolver = HeaderResolver::new(root.path());
        let a = resolver.resolve([&first]);
        let b = resolver.resolve([&second]);
        assert_eq!(a.resolved.len(), 2);
        assert_eq!(b.resolved, a.resolved);
        assert_eq!(b.expansion_order, a.expansion_order);
    }

    #[test]
    fn test_missing_header_kept_in_discovered() {
        let repo = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let main = source(repo.path(), "main.c", "#include <nowhere.h>\n");

        let closure = HeaderResolver::new(root.path()).resolve([&main]);
        assert!(closure.discovered.contains("nowhere.h"));
        assert!(closure.missing.contains("nowhere.h"));
        assert!(closure.resolved.is_empty());
    }

    #[test]
    fn test_non_header_targets_not_expanded() {
        let repo = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        header(root.path(), "vector", "#include <hidden.h>\n");
        header(root.path(), "hidden.h", "");
        let main = source(repo.path(), "main.cpp", "#include <vector>\n");

        let closure = HeaderResolver::new(root.path()).resolve([&main]);
        assert!(closure.discovered.contains("vector"));
        assert!(!closure.discovered.contains("hidden.h"));
        assert!(closure.missing.is_empty());
    }

    #[test]
    fn test_local_includes_ignored_by_default() {
        let repo = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        header(root.path(), "config.h", "");
        let main = source(repo.path(), "main.c", "#include \"config.h\"\n");

        let closure = HeaderResolver::new(root.path()).resolve([&main]);
        assert!(closure.discovered.is_empty());

        let closure = HeaderResolver::new(root.path())
            .follow_local_includes(true)
            .resolve([&main]);
        assert!(closure.resolved.contains_key("config.h"));
    }

    #[test]
    fn test_commented_include_not_followed() {
        let repo = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        header(root.path(), "a.h", "/* #include <b.h> */\n");
        header(root.path(), "b.h", "");
        let main = source(repo.path(), "main.c", "#include <a.h>\n");

        let closure = HeaderResolver::new(root.path()).resolve([&main]);
        assert!(!closure.discovered.contains("b.h"));
    }

    #[test]
    fn test_unreadable_source_skipped() {
        let root = TempDir::new().unwrap();
        let ghost = SourceFile::new("/nonexistent/ghost.c").unwrap();
        let closure = HeaderResolver::new(root.path()).resolve([&ghost]);
        assert!(closure.discovered.is_empty());
    }
}
