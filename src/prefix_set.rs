//! Character trie used as an exact-match visited set
//!
//! Header paths under one include root share long prefixes
//! (`/usr/include/linux/...`), so a trie keeps one copy of each shared run.
//! Lookups are exact: no normalization and no case folding.

use std::collections::HashMap;

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    terminal: bool,
}

/// Insert-only set of strings backed by a character trie
#[derive(Debug, Default)]
pub struct PrefixSet {
    root: TrieNode,
    len: usize,
}

impl PrefixSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as present
    ///
    /// Returns `true` if the key was not already in the set.
    pub fn insert(&mut self, key: &str) -> bool {
        let mut node = &mut self.root;
        for ch in key.chars() {
            node = node.children.entry(ch).or_default();
        }
        if node.terminal {
            return false;
        }
        node.terminal = true;
        self.len += 1;
        true
    }

    /// Check whether `key` was previously inserted
    pub fn contains(&self, key: &str) -> bool {
        let mut node = &self.root;
        for ch in key.chars() {
            match node.children.get(&ch) {
                Some(next) => node = next,
                None => return false,
            }
        }
        node.terminal
    }

    /// Number of distinct keys inserted
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
