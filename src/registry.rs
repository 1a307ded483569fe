//! ResourceRegistry - session-scoped resource ownership and key resolution
//!
//! One registry per editing session. Blocks reference resources by path;
//! keys are a derived naming layer re-assigned on every rebuild so the
//! canonical outline always carries a dense resource_1..resource_N sequence.
//! Inline resources keep the inline_resource_K key minted when they were
//! materialized; K never decreases, so keys are never reused within a
//! session even after deletions.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants as C;
use crate::outline::{MergeMode, Resource};

static INLINE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^inline_resource_(\d+)$").expect("inline key pattern"));

/// Parse the numeric index out of an inline_resource_N key
fn inline_key_index(key: &str) -> Option<usize> {
    INLINE_KEY_RE
        .captures(key)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Owns the set of named resources for one session
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    entries: Vec<Resource>,
    inline_count: usize,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ordinary resource. There is exactly one entry per
    /// distinct path; registering a known path returns the existing entry.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        merge_mode: MergeMode,
    ) -> &Resource {
        let path = path.into();
        if let Some(index) = self.entries.iter().position(|r| r.path == path) {
            return &self.entries[index];
        }

        self.entries.push(Resource {
            key: String::new(),
            path,
            title: title.into(),
            description: description.into(),
            merge_mode,
            is_inline: false,
        });
        self.assign_keys();
        let index = self.entries.len() - 1;
        &self.entries[index]
    }

    /// Register a materialized inline resource and return its key. A path
    /// already registered keeps its key (repeated materialization of the
    /// same block overwrites the file, not the registry entry); the title
    /// tracks the block's current heading.
    pub fn register_inline(&mut self, path: impl Into<String>, title: impl Into<String>) -> String {
        let path = path.into();
        if let Some(existing) = self.entries.iter_mut().find(|r| r.path == path) {
            existing.title = title.into();
            return existing.key.clone();
        }

        self.inline_count += 1;
        let key = format!("{}{}", C::INLINE_KEY_PREFIX, self.inline_count);
        self.entries.push(Resource {
            key: key.clone(),
            path,
            title: title.into(),
            description: String::new(),
            merge_mode: MergeMode::Concat,
            is_inline: true,
        });
        key
    }

    /// Re-derive sequential keys over ordinary entries in registration
    /// order. Inline entries keep their materialization-time keys.
    pub fn assign_keys(&mut self) {
        let mut next = 0;
        for entry in &mut self.entries {
            if !entry.is_inline {
                next += 1;
                entry.key = format!("{}{}", C::RESOURCE_KEY_PREFIX, next);
            }
        }
    }

    /// Resolve a resource path to its current key
    pub fn resolve_key(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|r| r.path == path)
            .map(|r| r.key.as_str())
    }

    pub fn get(&self, path: &str) -> Option<&Resource> {
        self.entries.iter().find(|r| r.path == path)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&Resource> {
        self.entries.iter().find(|r| r.key == key)
    }

    /// Resolve a key by the file name component of a resource path. Inline
    /// entries are found this way: their file name is derived from the
    /// owning block's id, while the directory part is session-specific.
    pub fn key_for_file_name(&self, file_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|r| {
                std::path::Path::new(&r.path)
                    .file_name()
                    .map(|n| n.to_string_lossy() == file_name)
                    .unwrap_or(false)
            })
            .map(|r| r.key.as_str())
    }

    /// Update the shared description for a path. Every section referencing
    /// the resource sees the change, since there is one entry per path.
    pub fn set_description(&mut self, path: &str, description: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|r| r.path == path) {
            Some(entry) => {
                entry.description = description.into();
                true
            }
            None => false,
        }
    }

    /// Update the display title for a path
    pub fn set_title(&mut self, path: &str, title: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|r| r.path == path) {
            Some(entry) => {
                entry.title = title.into();
                true
            }
            None => false,
        }
    }

    /// Drop entries whose path no block references anymore
    pub fn retain_referenced(&mut self, referenced: &HashSet<String>) {
        self.entries.retain(|r| referenced.contains(&r.path));
        self.assign_keys();
    }

    /// Remove the entry for a path. Returns whether anything was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|r| r.path != path);
        let removed = self.entries.len() != before;
        if removed {
            self.assign_keys();
        }
        removed
    }

    /// Rebuild registry state from an imported resource list, advancing the
    /// inline counter past the highest inline index seen so future
    /// materializations never reuse a key. Inline entries themselves are not
    /// retained: they point at the exporting session's files, and the blocks
    /// holding their content re-materialize under the importing session on
    /// the next rebuild.
    pub fn absorb(&mut self, resources: &[Resource]) {
        let highest = resources
            .iter()
            .filter_map(|r| inline_key_index(&r.key))
            .max()
            .unwrap_or(0);
        self.inline_count = self.inline_count.max(highest);
        self.entries = resources
            .iter()
            .filter(|r| !r.is_inline && inline_key_index(&r.key).is_none())
            .cloned()
            .collect();
        self.assign_keys();
    }

    /// All entries, inline included, in registration order
    pub fn resources(&self) -> &[Resource] {
        &self.entries
    }

    /// Ordinary entries only, the set shown to the editing surface
    pub fn visible(&self) -> impl Iterator<Item = &Resource> {
        self.entries.iter().filter(|r| !r.is_inline)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
