//! In-memory object store for testing.

use super::{Metadata, RemoteObjectStream};
use crate::error::{ErrorKind, Result};
use crate::models::{ETag, RemoteObject};
use crate::ObjectStore;
use async_stream::stream;
use async_trait::async_trait;
use md5::{Digest, Md5};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    etag: ETag,
    content_type: Option<String>,
    metadata: Metadata,
    modified: OffsetDateTime,
}
impl StoredObject {
    fn new(data: Vec<u8>) -> Self {
        let etag = ETag::Md5(format!("{:x}", Md5::digest(&data)));
        Self {
            data,
            etag,
            content_type: None,
            metadata: Metadata::new(),
            modified: OffsetDateTime::now_utc(),
        }
    }
}

/// Decrements the in-flight counter when a call finishes, however it finishes.
struct InFlight<'a>(&'a AtomicUsize);
impl<'a> InFlight<'a> {
    fn enter(current: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(current)
    }
}
impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory object store for testing.
///
/// Objects live in a map keyed by `(bucket, key)` behind a [`RwLock`], so all
/// trait methods operate on `&self`. ETags are the MD5 of the content, the
/// way S3 reports them for single-part uploads. The store is instrumented:
/// it counts calls, records the highest number of concurrent `get`/`put`
/// calls, can inject latency and can be told to fail specific keys or the
/// whole listing.
///
/// # Examples
///
/// ```
/// use wsync_storage::{ObjectStore, backend::MockStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MockStore::with_objects("bucket", [
///     ("ws/a.txt", "hello"),
/// ]);
/// assert_eq!(store.get("bucket", "ws/a.txt").await.unwrap(), b"hello");
/// assert_eq!(store.list("bucket", "ws/").await.unwrap().len(), 1);
/// # }
/// ```
#[derive(Default)]
pub struct MockStore {
    objects: RwLock<BTreeMap<(String, String), StoredObject>>,
    latency: Option<Duration>,
    failing_keys: Mutex<HashSet<String>>,
    fail_listing: AtomicBool,
    get_calls: AtomicUsize,
    put_calls: AtomicUsize,
    gets_in_flight: AtomicUsize,
    puts_in_flight: AtomicUsize,
    max_gets_in_flight: AtomicUsize,
    max_puts_in_flight: AtomicUsize,
}

impl MockStore {
    /// Create a mock store pre-populated with objects in one bucket.
    ///
    /// Keys are stored verbatim, hostile ones included: the store is an
    /// object store, not a filesystem, and tests need to be able to plant
    /// keys like `prefix/../../etc/passwd`.
    pub fn with_objects(
        bucket: impl Into<String>,
        objects: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>,
    ) -> Self {
        let bucket = bucket.into();
        let map = objects
            .into_iter()
            .map(|(key, data)| ((bucket.clone(), key.into()), StoredObject::new(data.into())))
            .collect();
        Self {
            objects: RwLock::new(map),
            ..Self::default()
        }
    }

    /// Sleep this long inside every `get` and `put`, so that concurrent
    /// calls actually overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every `get` and `put` of `key` fail with a network error.
    pub fn fail_key(&self, key: impl Into<String>) {
        self.failing_keys.lock().unwrap_or_else(|e| e.into_inner()).insert(key.into());
    }

    /// Make listings fail (or succeed again).
    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Insert or replace an object directly, bypassing call counters.
    pub async fn insert(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), StoredObject::new(data.into()));
    }

    /// Remove an object directly, bypassing call counters.
    pub async fn remove(&self, bucket: &str, key: &str) -> bool {
        self.objects.write().await.remove(&(bucket.to_string(), key.to_string())).is_some()
    }

    /// Override the ETag reported for an object (e.g. a multipart tag).
    pub async fn set_etag(&self, bucket: &str, key: &str, etag: ETag) {
        if let Some(object) = self.objects.write().await.get_mut(&(bucket.to_string(), key.to_string())) {
            object.etag = etag;
        }
    }

    /// Raw contents of an object, if present.
    pub async fn contents(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(&(bucket.to_string(), key.to_string())).map(|o| o.data.clone())
    }

    /// Content type recorded by the last `put` of an object.
    pub async fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .and_then(|o| o.content_type.clone())
    }

    /// User metadata recorded by the last `put` of an object.
    pub async fn metadata(&self, bucket: &str, key: &str) -> Option<Metadata> {
        self.objects.read().await.get(&(bucket.to_string(), key.to_string())).map(|o| o.metadata.clone())
    }

    /// All keys in a bucket, sorted.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects.read().await.keys().filter(|(b, _)| b == bucket).map(|(_, k)| k.clone()).collect()
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Highest number of `get` calls observed running at the same time.
    pub fn max_gets_in_flight(&self) -> usize {
        self.max_gets_in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of `put` calls observed running at the same time.
    pub fn max_puts_in_flight(&self) -> usize {
        self.max_puts_in_flight.load(Ordering::SeqCst)
    }

    fn check_failure(&self, key: &str) -> Result<()> {
        if self.failing_keys.lock().unwrap_or_else(|e| e.into_inner()).contains(key) {
            exn::bail!(ErrorKind::Network(format!("injected failure for `{key}`")));
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_stream<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> RemoteObjectStream<'a> {
        Box::pin(stream! {
            if self.fail_listing.load(Ordering::SeqCst) {
                yield Err(exn::Exn::from(ErrorKind::Network("injected listing failure".to_string())));
                return;
            }
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let entries: Vec<RemoteObject> = {
                let guard = self.objects.read().await;
                guard
                    .iter()
                    .filter(|((b, key), _)| b == bucket && key.starts_with(prefix))
                    .map(|((_, key), object)| {
                        RemoteObject::new(key.clone(), object.data.len() as u64, object.etag.clone(), object.modified)
                    })
                    .collect()
            };
            for object in entries {
                yield Ok(object);
            }
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.gets_in_flight, &self.max_gets_in_flight);
        self.simulate_latency().await;
        self.check_failure(key)?;
        let guard = self.objects.read().await;
        let object = guard
            .get(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(PathBuf::from(key))))?;
        Ok(object.data.clone())
    }

    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: &str, metadata: &Metadata) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.puts_in_flight, &self.max_puts_in_flight);
        self.simulate_latency().await;
        self.check_failure(key)?;
        let mut object = StoredObject::new(data);
        object.content_type = Some(content_type.to_string());
        object.metadata = metadata.clone();
        self.objects.write().await.insert((bucket.to_string(), key.to_string()), object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MockStore::default();
        store.put("b", "ws/test.txt", b"hello".to_vec(), "text/plain", &Metadata::new()).await.unwrap();
        assert_eq!(store.get("b", "ws/test.txt").await.unwrap(), b"hello");
        assert_eq!(store.content_type("b", "ws/test.txt").await.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let store = MockStore::default();
        let err = store.get("b", "missing.txt").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_bucket_and_prefix() {
        let store = MockStore::with_objects("b", [("ws/a.txt", "1"), ("ws/sub/b.txt", "2"), ("other/c.txt", "3")]);
        store.insert("other-bucket", "ws/d.txt", "4").await;
        let keys: Vec<_> = store.list("b", "ws/").await.unwrap().into_iter().map(|o| o.key).collect();
        assert_eq!(keys, vec!["ws/a.txt".to_string(), "ws/sub/b.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_etag_is_content_md5() {
        let store = MockStore::with_objects("b", [("a.txt", "hello")]);
        let objects = store.list("b", "").await.unwrap();
        assert_eq!(objects[0].etag.content_md5(), Some("5d41402abc4b2a76b9719d911017c592"));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MockStore::with_objects("b", [("a.txt", "1")]);
        store.fail_key("a.txt");
        assert!(store.get("b", "a.txt").await.is_err());
        store.fail_listing(true);
        assert!(store.list("b", "").await.is_err());
    }

    #[tokio::test]
    async fn test_tracks_concurrency() {
        let store = MockStore::with_objects("b", [("a", "1"), ("b", "2"), ("c", "3")]).with_latency(Duration::from_millis(20));
        join_all(["a", "b", "c"].map(|key| store.get("b", key))).await;
        assert_eq!(store.get_calls(), 3);
        assert_eq!(store.max_gets_in_flight(), 3);
    }
}
