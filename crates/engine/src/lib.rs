//! Keep an ephemeral workspace directory in sync with an object store
//! prefix.
//!
//! The entry point is [`WorkspaceSync`]: [`pull()`](WorkspaceSync::pull)
//! before doing local work, [`push()`](WorkspaceSync::push) afterwards.

mod content_type;
pub mod error;
mod hash;
mod options;
mod progress;
mod result;
mod scheduler;
mod snapshot;
mod sync;

pub use crate::content_type::{ContentTypeResolver, DEFAULT_CONTENT_TYPE};
pub use crate::error::Operation;
pub use crate::hash::md5_hex;
pub use crate::options::{DEFAULT_REGION, SyncOptions, SyncTarget};
pub use crate::progress::{ProgressFn, SyncPhase, SyncProgress};
pub use crate::result::{FileError, FileErrorKind, SyncResult};
pub use crate::scheduler::{DEFAULT_DOWNLOAD_CONCURRENCY, DEFAULT_UPLOAD_CONCURRENCY, Outcome, TransferScheduler};
pub use crate::snapshot::{HashSnapshot, SnapshotEntry};
pub use crate::sync::{CONTENT_MD5_METADATA, WorkspaceSync};
