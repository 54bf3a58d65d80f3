use super::Inner;
use crate::error::Result;
use crate::hash::md5_hex;
use crate::progress::{ProgressFn, SyncPhase, SyncProgress};
use crate::result::{FileError, FileErrorKind, SyncResult};
use crate::snapshot::SnapshotEntry;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use wsync_storage::{LocalFile, Metadata, to_key};

/// User metadata key carrying the hex MD5 of an uploaded object, so that the
/// content hash survives even where the ETag is not one.
pub const CONTENT_MD5_METADATA: &str = "content-md5-hex";

/// How a changed-looking file turned out.
enum Pushed {
    Uploaded(PathBuf, SnapshotEntry),
    /// Touched but identical to the last known hash.
    Unchanged(PathBuf, SnapshotEntry),
}

impl Inner {
    pub(super) async fn push(&self, progress: ProgressFn<'_>) -> Result<SyncResult> {
        let started = Instant::now();
        let (bucket, prefix) = (self.target.bucket(), self.target.prefix());
        tracing::info!(bucket, prefix, store = self.store.name(), "Push started");
        let mut result = SyncResult::default();

        let files = self.walk_local().await?;
        let present: HashSet<PathBuf> = files.iter().map(|file| file.path.clone()).collect();

        let mut candidates = Vec::new();
        {
            let snapshot = self.snapshot();
            if snapshot.is_empty() {
                tracing::debug!("No known hashes, every file will be hashed");
            }
            for file in files {
                if snapshot.trusted_hash(&file).is_some() {
                    result.skipped_files.push(file.path);
                    continue;
                }
                let previous = snapshot.get(&file.path).map(|entry| entry.hash.clone());
                match to_key(&file.path) {
                    Ok(key) => candidates.push((self.target.key_for(&key), file, previous)),
                    Err(e) => result.error(&file.path, FileErrorKind::InvalidPath, e),
                }
            }
        }
        tracing::debug!(candidates = candidates.len(), unchanged = result.skipped_files.len(), "Diffed workspace");

        let outcome = self
            .uploads
            .run_with(
                candidates.into_iter().map(|(key, file, previous)| self.upload(key, file, previous)),
                |settled, current, total| {
                    let path = match settled {
                        Ok(Pushed::Uploaded(path, _) | Pushed::Unchanged(path, _)) => path,
                        Err(error) => &error.path,
                    };
                    progress(SyncProgress::new(SyncPhase::Upload, current, total, Some(path.clone())));
                },
            )
            .await;

        let mut entries = Vec::with_capacity(outcome.results.len());
        for pushed in outcome.results {
            match pushed {
                Pushed::Uploaded(path, entry) => {
                    result.uploaded_files.push(path.clone());
                    entries.push((path, entry));
                },
                Pushed::Unchanged(path, entry) => {
                    result.skipped_files.push(path.clone());
                    entries.push((path, entry));
                },
            }
        }
        for error in outcome.errors {
            result.error(error.path, error.kind, error.message);
        }

        {
            let mut snapshot = self.snapshot();
            snapshot.retain(|path, _| present.contains(path));
            snapshot.extend(entries);
        }

        let result = result.finish(started);
        tracing::info!(
            uploaded = result.uploaded_files.len(),
            skipped = result.skipped_files.len(),
            errors = result.errors.len(),
            duration = ?result.duration,
            "Push finished"
        );
        Ok(result)
    }

    async fn upload(
        &self,
        key: String,
        file: LocalFile,
        previous: Option<String>,
    ) -> std::result::Result<Pushed, FileError> {
        let data = self
            .local
            .read(&file.path)
            .await
            .map_err(|e| FileError::new(&file.path, FileErrorKind::Read, e))?;
        let hash = md5_hex(&data);
        let entry = SnapshotEntry::for_file(hash.clone(), &file);
        if previous.as_deref() == Some(hash.as_str()) {
            tracing::trace!(path = %file.path.display(), "Touched but unchanged");
            return Ok(Pushed::Unchanged(file.path, entry));
        }

        let content_type = self.content_types.resolve(&file.path);
        let metadata = Metadata::from([(CONTENT_MD5_METADATA.to_string(), hash)]);
        self.store
            .put(self.target.bucket(), &key, data, &content_type, &metadata)
            .await
            .map_err(|e| FileError::new(&file.path, FileErrorKind::Upload, e))?;
        tracing::debug!(path = %file.path.display(), key = %key, content_type = %content_type, "Uploaded");
        Ok(Pushed::Uploaded(file.path, entry))
    }
}
