//! Outcome of a pull or push.

use derive_more::Display;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// What went wrong with a single file.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileErrorKind {
    /// The key or path would escape the workspace root.
    #[display("invalid path")]
    InvalidPath,
    #[display("download failed")]
    Download,
    #[display("upload failed")]
    Upload,
    /// The local file could not be read for hashing or upload.
    #[display("read failed")]
    Read,
    /// Mirror cleanup could not remove the local file.
    #[display("delete failed")]
    Delete,
}

/// A per-file failure. Never aborts the operation it happened in.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[display("{}: {kind}: {message}", path.display())]
pub struct FileError {
    /// Relative path, or the raw relative key when it failed validation
    pub path: PathBuf,
    pub kind: FileErrorKind,
    pub message: String,
}
impl FileError {
    pub fn new(path: impl Into<PathBuf>, kind: FileErrorKind, message: impl ToString) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.to_string(),
        }
    }
}

/// Aggregated outcome of one [`pull()`](crate::WorkspaceSync::pull) or
/// [`push()`](crate::WorkspaceSync::push).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// `true` iff `errors` is empty
    pub success: bool,
    pub downloaded_files: Vec<PathBuf>,
    pub uploaded_files: Vec<PathBuf>,
    /// Local files removed by mirror cleanup
    pub deleted_files: Vec<PathBuf>,
    /// Files found to be in sync already
    pub skipped_files: Vec<PathBuf>,
    pub errors: Vec<FileError>,
    pub duration: Duration,
}
impl SyncResult {
    pub(crate) fn error(&mut self, path: impl AsRef<Path>, kind: FileErrorKind, message: impl ToString) {
        let error = FileError::new(path.as_ref(), kind, message);
        tracing::warn!(path = %error.path.display(), kind = %error.kind, message = %error.message, "File failed to sync");
        self.errors.push(error);
    }

    pub(crate) fn finish(mut self, started: Instant) -> Self {
        self.success = self.errors.is_empty();
        self.duration = started.elapsed();
        self.downloaded_files.sort();
        self.uploaded_files.sort();
        self.deleted_files.sort();
        self.skipped_files.sort();
        self
    }

    /// Paths of every failed file of the given kind, for selective retries.
    pub fn failed_paths(&self, kind: FileErrorKind) -> impl Iterator<Item = &Path> {
        self.errors.iter().filter(move |e| e.kind == kind).map(|e| e.path.as_path())
    }
}
