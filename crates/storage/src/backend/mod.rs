//! Object store trait and backend implementations.
//!
//! This module defines the [`ObjectStore`] trait, the narrow interface the
//! sync engine needs from remote storage, and the [`LocalBackend`] that plays
//! the same role for the workspace directory on disk.

mod local;
#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "s3")]
mod s3;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockStore;
#[cfg(feature = "s3")]
pub use self::s3::{S3Backend, S3Credentials};
use crate::error::Result;
use crate::models::RemoteObject;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::collections::HashMap;
use std::pin::Pin;

/// Boxed stream of listing results returned by [`ObjectStore::list_stream`].
pub type RemoteObjectStream<'a> = Pin<Box<dyn Stream<Item = Result<RemoteObject>> + Send + 'a>>;

/// User metadata attached to an uploaded object.
pub type Metadata = HashMap<String, String>;

/// Unified interface for object storage.
///
/// Keys are full object keys (prefix included). The store does not know
/// anything about workspaces: key validation and prefix handling are the
/// caller's job.
///
/// # Examples
///
/// ```
/// use futures::TryStreamExt;
/// use wsync_storage::{ObjectStore, error::Result};
///
/// async fn total_size(store: &dyn ObjectStore, bucket: &str, prefix: &str) -> Result<u64> {
///     let mut total = 0;
///     let mut objects = store.list_stream(bucket, prefix);
///     while let Some(object) = objects.try_next().await? {
///         total += object.size;
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the store, used for logging only.
    fn name(&self) -> &str;

    /// Stream every object whose key starts with `prefix`.
    ///
    /// Implementations backed by a paginated API must keep requesting pages
    /// until the listing is exhausted. An `Err` item means the listing is
    /// incomplete; callers should treat it as fatal.
    fn list_stream<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> RemoteObjectStream<'a>;

    /// List every object whose key starts with `prefix`.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream)
    /// into a [`Vec`].
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<RemoteObject>> {
        self.list_stream(bucket, prefix).try_collect().await
    }

    /// Fetch the complete contents of an object.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the object
    /// does not exist.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Create or overwrite an object.
    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: &str, metadata: &Metadata) -> Result<()>;
}
