use super::Inner;
use crate::error::{ErrorKind, Result};
use crate::hash::md5_hex;
use crate::progress::{ProgressFn, SyncPhase, SyncProgress};
use crate::result::{FileError, FileErrorKind, SyncResult};
use crate::snapshot::{HashSnapshot, SnapshotEntry};
use exn::ResultExt;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;
use wsync_storage::{LocalFile, RemoteObject, validate_key};

/// What to do about one remote object.
enum Plan {
    /// Local copy verified identical; carries the snapshot entry to keep.
    Keep(SnapshotEntry),
    Download,
}

impl Inner {
    pub(super) async fn pull(&self, progress: ProgressFn<'_>) -> Result<SyncResult> {
        let started = Instant::now();
        let (bucket, prefix) = (self.target.bucket(), self.target.prefix());
        tracing::info!(bucket, prefix, store = self.store.name(), "Pull started");
        let mut result = SyncResult::default();

        let objects = self
            .store
            .list(bucket, prefix)
            .await
            .or_raise(|| ErrorKind::Enumeration(format!("remote objects under s3://{bucket}/{prefix}")))?;
        let remote = self.remote_files(objects, &mut result);
        let local: HashMap<PathBuf, LocalFile> =
            self.walk_local().await?.into_iter().map(|file| (file.path.clone(), file)).collect();
        tracing::debug!(remote = remote.len(), local = local.len(), "Enumerated both sides");

        let mut snapshot = HashSnapshot::new();
        let mut downloads = Vec::new();
        for (path, object) in &remote {
            match self.plan(path, object, local.get(path)).await {
                Plan::Keep(entry) => {
                    result.skipped_files.push(path.clone());
                    snapshot.insert(path.clone(), entry);
                },
                Plan::Download => downloads.push((path.clone(), object.key.clone())),
            }
        }

        let outcome = self
            .downloads
            .run_with(
                downloads.into_iter().map(|(path, key)| self.download(path, key)),
                |settled, current, total| {
                    let path = match settled {
                        Ok((path, _)) => path,
                        Err(error) => &error.path,
                    };
                    progress(SyncProgress::new(SyncPhase::Download, current, total, Some(path.clone())));
                },
            )
            .await;
        for (path, entry) in outcome.results {
            result.downloaded_files.push(path.clone());
            snapshot.insert(path, entry);
        }
        for error in outcome.errors {
            result.error(error.path, error.kind, error.message);
        }

        self.mirror_cleanup(&remote, &local, &mut result, progress).await;

        *self.snapshot() = snapshot;
        let result = result.finish(started);
        tracing::info!(
            downloaded = result.downloaded_files.len(),
            deleted = result.deleted_files.len(),
            skipped = result.skipped_files.len(),
            errors = result.errors.len(),
            duration = ?result.duration,
            "Pull finished"
        );
        Ok(result)
    }

    /// Strip the prefix, validate and filter the listing. Keys that fail
    /// validation are recorded as errors and dropped.
    fn remote_files(&self, objects: Vec<RemoteObject>, result: &mut SyncResult) -> BTreeMap<PathBuf, RemoteObject> {
        let prefix = self.target.prefix();
        let mut remote = BTreeMap::new();
        for object in objects {
            let Some(relative) = object.key.strip_prefix(prefix) else {
                tracing::warn!(key = %object.key, "Store listed a key outside the prefix");
                continue;
            };
            // Directory placeholders created by consoles and some clients.
            if relative.is_empty() || relative.ends_with('/') {
                continue;
            }
            let path = match validate_key(relative) {
                Ok(path) => path,
                Err(e) => {
                    result.error(relative, FileErrorKind::InvalidPath, e);
                    continue;
                },
            };
            if self.filter.is_ignored_or_parents(&path, false) {
                tracing::trace!(path = %path.display(), "Ignoring remote object");
                continue;
            }
            remote.insert(path, object);
        }
        remote
    }

    async fn plan(&self, path: &Path, object: &RemoteObject, local: Option<&LocalFile>) -> Plan {
        let Some(local) = local else {
            return Plan::Download;
        };
        if local.size != object.size {
            return Plan::Download;
        }
        // Multipart and opaque tags say nothing about the content.
        let Some(remote_md5) = object.etag.content_md5() else {
            tracing::debug!(path = %path.display(), etag = %object.etag, "ETag is not a content hash");
            return Plan::Download;
        };
        let trusted = self.snapshot().trusted_hash(local).map(str::to_string);
        let local_md5 = match trusted {
            Some(hash) => hash,
            None => match self.local.read(path).await {
                Ok(data) => md5_hex(&data),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Cannot hash local file, downloading");
                    return Plan::Download;
                },
            },
        };
        if local_md5 == remote_md5 {
            Plan::Keep(SnapshotEntry::for_file(local_md5, local))
        } else {
            Plan::Download
        }
    }

    async fn download(&self, path: PathBuf, key: String) -> std::result::Result<(PathBuf, SnapshotEntry), FileError> {
        let failed = |e: wsync_storage::error::Error| FileError::new(&path, FileErrorKind::Download, e);
        let data = self.store.get(self.target.bucket(), &key).await.map_err(failed)?;
        let hash = md5_hex(&data);
        self.local.write(&path, &data).await.map_err(failed)?;
        let stat = self.local.stat(&path).await.map_err(failed)?;
        tracing::debug!(path = %path.display(), size = stat.size, "Downloaded");
        Ok((path, SnapshotEntry::for_file(hash, &stat)))
    }

    /// Delete every walked local file the (filtered) remote listing does not
    /// have, then prune the directories that leaves empty.
    async fn mirror_cleanup(
        &self,
        remote: &BTreeMap<PathBuf, RemoteObject>,
        local: &HashMap<PathBuf, LocalFile>,
        result: &mut SyncResult,
        progress: ProgressFn<'_>,
    ) {
        let mut orphans: Vec<&PathBuf> = local
            .keys()
            .filter(|path| !remote.contains_key(*path) && !self.filter.is_ignored_or_parents(path, false))
            .collect();
        orphans.sort();
        let total = orphans.len();
        for (index, path) in orphans.into_iter().enumerate() {
            match self.local.delete(path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Deleted local file missing from remote");
                    result.deleted_files.push(path.clone());
                    if let Err(e) = self.local.prune_empty_dirs(path).await {
                        tracing::debug!(path = %path.display(), error = %e, "Cannot prune empty directories");
                    }
                },
                Err(e) => result.error(path, FileErrorKind::Delete, e),
            }
            progress(SyncProgress::new(SyncPhase::Cleanup, index + 1, total, Some(path.clone())));
        }
    }
}
