//! Local filesystem backend.
//!
//! This module provides access to the workspace directory: a recursive walk
//! for diffing and byte-level read/write/delete for transfers. Files are
//! accessed using `tokio::fs` for async I/O.

use crate::error::{ErrorKind, Result};
use crate::models::LocalFile;
use crate::path::validate as validate_path;
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use std::fs::{Metadata, create_dir_all as sync_create_dir};
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use tokio::fs::{self, DirEntry};

type LocalFileStream<'a> = Pin<Box<dyn Stream<Item = Result<LocalFile>> + Send + 'a>>;

/// Predicate deciding whether a walked entry should be skipped. Receives the
/// relative path and whether the entry is a directory. Skipped directories
/// are not descended into.
pub type SkipFn<'a> = &'a (dyn Fn(&Path, bool) -> bool + Send + Sync);

enum WalkEntry {
    File(LocalFile),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem backend rooted at the workspace directory.
///
/// All paths passed in and handed out are relative to the root, and every
/// relative path is run through [`validate_path`](crate::validate_path)
/// before it is joined onto the root.
///
/// # Examples
///
/// ```no_run
/// use wsync_storage::backend::LocalBackend;
///
/// let backend = LocalBackend::new("/tmp/ws1").unwrap();
/// assert_eq!(backend.root(), std::path::Path::new("/tmp/ws1"));
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    /// Root directory of the workspace
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend, creating the root directory if
    /// it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute, contains `..` or NUL bytes, or exists but is not a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || root.as_os_str().as_encoded_bytes().contains(&0) {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.components().any(|c| matches!(c, Component::ParentDir)) {
            exn::bail!(ErrorKind::InvalidPath(root));
        }

        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Use non-async here; it'll only happen once on construction and
            // it's not worth the hassle of making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }

        Ok(Self { root })
    }

    /// Absolute path of the workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the absolute path for a relative workspace path.
    ///
    /// Validates the path and joins it with the root directory.
    pub fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Convert an absolute path back to a relative workspace path.
    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        validate_path(relative)
    }

    fn metadata(path: &Path, metadata: Metadata) -> Result<LocalFile> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(LocalFile::new(path, metadata.len(), modified))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Classifies one directory entry so the walk loop stays free of error
    /// plumbing: inside `stream!` nothing can be `?`-ed.
    async fn process_entry(&self, entry: DirEntry, skip: SkipFn<'_>) -> Result<WalkEntry> {
        let path = entry.path();
        // Does not follow symlinks: a link is neither a file nor a directory
        // here, so links pointing outside the workspace are never read.
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &path))?;
        let relative = self.relative_path(&path)?;
        if skip(&relative, metadata.is_dir()) {
            return Ok(WalkEntry::Skip);
        }
        if metadata.is_dir() {
            return Ok(WalkEntry::Descend(path));
        }
        if metadata.is_file() {
            return Ok(WalkEntry::File(Self::metadata(&relative, metadata)?));
        }
        Ok(WalkEntry::Skip)
    }

    /// Stream every regular file under the root.
    ///
    /// `skip` is consulted for every entry before anything else happens to
    /// it; a skipped directory is never opened. Failing to read the root
    /// directory itself is yielded as an error, as is any other I/O failure.
    /// A subdirectory that disappears mid-walk is silently dropped.
    pub fn list_stream<'a>(&'a self, skip: SkipFn<'a>) -> LocalFileStream<'a> {
        let mut stack = vec![self.root.clone()];

        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound && current != self.root => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };

                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &current))); continue 'entries; },
                    };
                    match self.process_entry(entry, skip).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => stack.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    pub async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    /// Write file contents, creating parent directories as needed.
    pub async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    pub async fn delete(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    pub async fn stat(&self, path: &Path) -> Result<LocalFile> {
        let abs_path = self.absolute_path(path)?;
        let metadata = fs::metadata(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        Self::metadata(path, metadata)
    }

    /// Remove the now-empty ancestor directories of `path`, deepest first,
    /// stopping at the first directory that still has entries. The root is
    /// never removed. Returns how many directories were removed.
    pub async fn prune_empty_dirs(&self, path: &Path) -> Result<usize> {
        let validated = validate_path(path)?;
        let mut removed = 0;
        let mut current = validated.parent();
        while let Some(dir) = current
            && !dir.as_os_str().is_empty()
        {
            match fs::remove_dir(self.root.join(dir)).await {
                Ok(()) => removed += 1,
                // Not empty (or already gone): nothing above it can be empty either.
                Err(_) => break,
            }
            current = dir.parent();
        }
        Ok(removed)
    }
}
