//! The sync orchestrator.
//!
//! A [`WorkspaceSync`] binds one workspace directory to one bucket prefix.
//! The remote side is authoritative: [`pull()`](WorkspaceSync::pull) makes
//! the directory mirror the prefix (deleting local files the prefix does not
//! have), while [`push()`](WorkspaceSync::push) only ever adds or overwrites
//! objects.
//!
//! Files matched by the ignore rules are invisible in both directions.

mod background;
mod pull;
mod push;

pub use self::push::CONTENT_MD5_METADATA;

use self::background::BackgroundPull;
use crate::error::{ErrorKind, Operation, Result};
use crate::progress::{ProgressFn, SyncProgress, no_progress};
use crate::snapshot::HashSnapshot;
use crate::{ContentTypeResolver, SyncOptions, SyncResult, SyncTarget, TransferScheduler};
use exn::ResultExt;
use futures::TryStreamExt;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use wsync_filter::IgnoreFilter;
use wsync_storage::backend::LocalBackend;
use wsync_storage::{LocalFile, StoreHandle};

/// State shared with background pulls.
struct Inner {
    target: SyncTarget,
    store: StoreHandle,
    local: LocalBackend,
    filter: IgnoreFilter,
    content_types: ContentTypeResolver,
    downloads: TransferScheduler,
    uploads: TransferScheduler,
    /// Only ever locked for synchronous reads and writes, never across an
    /// `.await`.
    snapshot: Mutex<HashSnapshot>,
    /// [`IDLE`], or the [`Operation`] currently running.
    in_flight: AtomicU8,
}

const IDLE: u8 = 0;

fn encode(operation: Operation) -> u8 {
    match operation {
        Operation::Pull => 1,
        Operation::Push => 2,
    }
}

fn decode(state: u8) -> Operation {
    if state == encode(Operation::Push) { Operation::Push } else { Operation::Pull }
}

impl Inner {
    fn snapshot(&self) -> MutexGuard<'_, HashSnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every regular, non-ignored file in the workspace. Ignored directories
    /// are not descended into.
    async fn walk_local(&self) -> Result<Vec<LocalFile>> {
        let skip = |path: &Path, is_dir: bool| self.filter.is_ignored(path, is_dir);
        self.local.list_stream(&skip).try_collect::<Vec<_>>().await.or_raise(|| {
            ErrorKind::Enumeration(format!("workspace directory `{}`", self.target.workspace_dir().display()))
        })
    }
}

/// Marks an operation as in flight until dropped, so the instance is released
/// on every exit path, errors and panics included.
///
/// Pulls and pushes share one slot: a pull's mirror cleanup and snapshot
/// replacement must never interleave with a push.
struct BusyGuard {
    inner: Arc<Inner>,
}
impl BusyGuard {
    fn acquire(inner: &Arc<Inner>, operation: Operation) -> Result<Self> {
        if let Err(running) =
            inner.in_flight.compare_exchange(IDLE, encode(operation), Ordering::AcqRel, Ordering::Acquire)
        {
            exn::bail!(ErrorKind::Busy(decode(running)));
        }
        Ok(Self {
            inner: Arc::clone(inner),
        })
    }
}
impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.inner.in_flight.store(IDLE, Ordering::Release);
    }
}

/// Keeps one workspace directory and one bucket prefix in sync.
///
/// One operation runs at a time: starting a pull or a push while either is
/// running fails with [`Busy`](ErrorKind::Busy) naming the running one,
/// instead of queueing. A background pull counts as a running pull.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use wsync_engine::{SyncOptions, WorkspaceSync};
/// use wsync_storage::backend::MockStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let workspace = tempfile::tempdir().unwrap();
/// let store = Arc::new(MockStore::with_objects("test-bucket", [("users/u1/ws/a.txt", "hello")]));
/// let sync = WorkspaceSync::new(SyncOptions::new("test-bucket", "users/u1/ws", workspace.path()), store).unwrap();
///
/// let result = sync.pull().await.unwrap();
/// assert_eq!(result.downloaded_files.len(), 1);
///
/// std::fs::write(workspace.path().join("c.txt"), "new").unwrap();
/// let result = sync.push().await.unwrap();
/// assert_eq!(result.uploaded_files.len(), 1);
/// # }
/// ```
pub struct WorkspaceSync {
    inner: Arc<Inner>,
    background: BackgroundPull,
}

impl WorkspaceSync {
    /// Validate the options, create the workspace directory if needed and
    /// compile the ignore rules (including the workspace's `.syncignore`).
    ///
    /// # Errors
    ///
    /// - [`Construction`](ErrorKind::Construction) for an invalid bucket,
    ///   prefix, workspace directory or concurrency limit
    /// - [`Filter`](ErrorKind::Filter) for a malformed ignore pattern
    pub fn new(options: SyncOptions, store: StoreHandle) -> Result<Self> {
        let target = options.target()?;
        let downloads = TransferScheduler::new(options.download_concurrency)?;
        let uploads = TransferScheduler::new(options.upload_concurrency)?;
        let local = LocalBackend::new(target.workspace_dir()).or_raise(|| {
            ErrorKind::Construction(format!("workspace directory `{}` is unusable", target.workspace_dir().display()))
        })?;
        let filter = IgnoreFilter::load(target.workspace_dir(), &options.ignore_patterns).or_raise(|| ErrorKind::Filter)?;

        tracing::debug!(
            bucket = target.bucket(),
            prefix = target.prefix(),
            workspace = %target.workspace_dir().display(),
            store = store.name(),
            "Created workspace sync"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                target,
                store,
                local,
                filter,
                content_types: options.content_type_resolver,
                downloads,
                uploads,
                snapshot: Mutex::new(HashSnapshot::new()),
                in_flight: AtomicU8::new(IDLE),
            }),
            background: BackgroundPull::default(),
        })
    }

    pub fn workspace_path(&self) -> &Path {
        self.inner.target.workspace_dir()
    }

    pub fn target(&self) -> &SyncTarget {
        &self.inner.target
    }

    /// Number of files whose hash is currently known.
    pub fn snapshot_len(&self) -> usize {
        self.inner.snapshot().len()
    }

    /// Make the workspace mirror the remote prefix.
    ///
    /// # Errors
    ///
    /// [`Busy`](ErrorKind::Busy) if a pull or push is already running, and
    /// [`Enumeration`](ErrorKind::Enumeration) if either side cannot be
    /// listed. Per-file failures are reported in the returned [`SyncResult`].
    pub async fn pull(&self) -> Result<SyncResult> {
        self.pull_with_progress(no_progress).await
    }

    pub async fn pull_with_progress<F>(&self, progress: F) -> Result<SyncResult>
    where
        F: Fn(SyncProgress) + Send + Sync,
    {
        let _guard = BusyGuard::acquire(&self.inner, Operation::Pull)?;
        let progress: ProgressFn<'_> = &progress;
        self.inner.pull(progress).await
    }

    /// Upload new and changed files. Never deletes remote objects.
    pub async fn push(&self) -> Result<SyncResult> {
        self.push_with_progress(no_progress).await
    }

    pub async fn push_with_progress<F>(&self, progress: F) -> Result<SyncResult>
    where
        F: Fn(SyncProgress) + Send + Sync,
    {
        let _guard = BusyGuard::acquire(&self.inner, Operation::Push)?;
        let progress: ProgressFn<'_> = &progress;
        self.inner.push(progress).await
    }

    /// Start a pull on a separate task and return immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_background_pull(&self) -> Result<()> {
        let guard = BusyGuard::acquire(&self.inner, Operation::Pull)?;
        let inner = Arc::clone(&self.inner);
        self.background.start(async move {
            let result = inner.pull(&no_progress).await;
            drop(guard);
            result
        });
        Ok(())
    }

    /// Wait for the background pull to settle. Once it has, every call
    /// returns the same result immediately.
    ///
    /// # Errors
    ///
    /// [`NoBackgroundPull`](ErrorKind::NoBackgroundPull) if
    /// [`start_background_pull()`](Self::start_background_pull) was never
    /// called, [`BackgroundPull`](ErrorKind::BackgroundPull) if the pull
    /// failed.
    pub async fn wait_for_pull(&self) -> Result<SyncResult> {
        self.background.wait().await
    }

    /// Whether the background pull has settled. `false` if none was started.
    pub fn is_pull_complete(&self) -> bool {
        self.background.is_complete()
    }
}
