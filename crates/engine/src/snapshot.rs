//! Last known content hashes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use wsync_storage::LocalFile;

/// Hash of a file as it was last seen in sync with the remote, together with
/// the size and modification time it had on disk at that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub hash: String,
    pub size: u64,
    pub modified: OffsetDateTime,
}
impl SnapshotEntry {
    pub fn new(hash: impl Into<String>, size: u64, modified: OffsetDateTime) -> Self {
        Self {
            hash: hash.into(),
            size,
            modified,
        }
    }

    pub fn for_file(hash: impl Into<String>, file: &LocalFile) -> Self {
        Self::new(hash, file.size, file.modified)
    }

    /// Whether `file` still looks like it did when the hash was recorded.
    pub fn matches(&self, file: &LocalFile) -> bool {
        self.size == file.size && self.modified == file.modified
    }
}

/// Relative path → last known content hash.
///
/// Lives as long as the owning [`WorkspaceSync`](crate::WorkspaceSync) and is
/// never written to disk: a fresh process starts with an empty snapshot and
/// pays for one full hash pass.
#[derive(Debug, Clone, Default)]
pub struct HashSnapshot {
    entries: HashMap<PathBuf, SnapshotEntry>,
}

impl HashSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&SnapshotEntry> {
        self.entries.get(path)
    }

    /// The recorded hash, but only if `file`'s size and mtime still match the
    /// entry. Anything else has to be re-hashed.
    pub fn trusted_hash(&self, file: &LocalFile) -> Option<&str> {
        self.entries.get(&file.path).filter(|entry| entry.matches(file)).map(|entry| entry.hash.as_str())
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, entry: SnapshotEntry) -> Option<SnapshotEntry> {
        self.entries.insert(path.into(), entry)
    }

    /// Keep only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Path, &SnapshotEntry) -> bool) {
        self.entries.retain(|path, entry| keep(path, entry));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(PathBuf, SnapshotEntry)> for HashSnapshot {
    fn from_iter<T: IntoIterator<Item = (PathBuf, SnapshotEntry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<(PathBuf, SnapshotEntry)> for HashSnapshot {
    fn extend<T: IntoIterator<Item = (PathBuf, SnapshotEntry)>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}
