//! S3-compatible object store.
//!
//! This module provides an [`ObjectStore`] implementation for S3-compatible
//! services including AWS S3, MinIO and others.
//!
//! # Credentials
//!
//! Credentials are provided explicitly. On serverless compute the runtime
//! exports `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and
//! `AWS_SESSION_TOKEN`; the configuration layer reads those and hands them
//! over as [`S3Credentials`].

use crate::backend::{Metadata, RemoteObjectStream};
use crate::error::{ErrorKind, Result};
use crate::models::{ETag, RemoteObject};
use crate::ObjectStore;
use async_stream::stream;
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    error::DisplayErrorContext,
    primitives::{ByteStream, DateTime},
    types::Object,
};
use exn::{OptionExt, ResultExt};
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Generous default for concurrent S3 requests per client. The sync engine
/// applies its own, smaller, per-operation limits on top of this.
const DEFAULT_CONCURRENT_REQUESTS: usize = 100;

/// Static or session credentials for an S3 client.
#[derive(Clone)]
pub struct S3Credentials {
    pub key_id: String,
    pub key_secret: String,
    pub session_token: Option<String>,
}
impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// S3-compatible object store.
///
/// # Examples
///
/// ```no_run
/// use wsync_storage::backend::{S3Backend, S3Credentials};
///
/// let backend = S3Backend::new(
///     "workspaces",
///     "eu-west-1",
///     None,
///     S3Credentials {
///         key_id: "access_key_id".to_string(),
///         key_secret: "secret_access_key".to_string(),
///         session_token: None,
///     },
/// );
/// ```
#[derive(Debug, Clone)]
pub struct S3Backend {
    name: String,
    client: Client,
    /// Rate limiter for concurrent S3 requests.
    rate_limiter: Arc<Semaphore>,
}

impl S3Backend {
    /// Create a new S3 object store.
    ///
    /// # Arguments
    /// * `name` - A name for this store (used in logging)
    /// * `region` - Region, already resolved by the caller
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `credentials` - Access key, secret and optional session token
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        endpoint: Option<String>,
        credentials: S3Credentials,
    ) -> Self {
        let region = Region::new(region.into());
        let credentials = Credentials::new(
            credentials.key_id,
            credentials.key_secret,
            credentials.session_token,
            None,
            "wsync-config",
        );
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(region)
            // Configure retry policy with exponential backoff (1 initial + 3 retries)
            .retry_config(RetryConfig::standard().with_max_attempts(4));
        // Use path-style addressing for better compatibility with
        // S3-compatible services (MinIO, etc.)
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url).force_path_style(true);
        }
        Self::from_client(name, Client::from_conf(config_builder.build()))
    }

    /// Wrap an already configured client.
    pub fn from_client(name: impl Into<String>, client: Client) -> Self {
        Self {
            name: name.into(),
            client,
            rate_limiter: Arc::new(Semaphore::new(DEFAULT_CONCURRENT_REQUESTS)),
        }
    }

    /// Acquire a rate limiter permit before making an S3 API call.
    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit> {
        self.rate_limiter
            .clone()
            .acquire_owned()
            .await
            .or_raise(|| ErrorKind::BackendError("S3 rate limiter closed".to_string()))
    }

    /// Convert AWS DateTime to OffsetDateTime.
    fn parse_datetime(dt: &DateTime) -> Result<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(dt.as_nanos())
            .or_raise(|| ErrorKind::BackendError("S3 datetime out of range".to_string()))
    }

    fn remote_object(object: &Object) -> Result<RemoteObject> {
        let key = object.key().ok_or_raise(|| ErrorKind::BackendError("S3 listed an object without a key".to_string()))?;
        let size = u64::try_from(object.size().unwrap_or(0))
            .or_raise(|| ErrorKind::BackendError(format!("S3 listed a negative size for `{key}`")))?;
        let etag = ETag::parse(object.e_tag().unwrap_or_default());
        let last_modified = match object.last_modified() {
            Some(dt) => Self::parse_datetime(dt)?,
            None => OffsetDateTime::UNIX_EPOCH,
        };
        Ok(RemoteObject::new(key, size, etag, last_modified))
    }
}

#[async_trait]
impl ObjectStore for S3Backend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> RemoteObjectStream<'a> {
        Box::pin(stream! {
            let mut pages = self.client.list_objects_v2().bucket(bucket).prefix(prefix).into_paginator().send();
            loop {
                let _permit = match self.acquire_permit().await {
                    Ok(permit) => permit,
                    Err(e) => { yield Err(e); return; },
                };
                let page = match pages.next().await {
                    Some(Ok(page)) => page,
                    Some(Err(e)) => {
                        let message = format!("listing s3://{bucket}/{prefix}: {}", DisplayErrorContext(&e));
                        yield Err(exn::Exn::from(ErrorKind::Network(message)));
                        return;
                    },
                    None => break,
                };
                tracing::trace!(store = %self.name, bucket, prefix, objects = page.contents().len(), "Listed S3 page");
                for object in page.contents() {
                    yield Self::remote_object(object);
                }
            }
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let _permit = self.acquire_permit().await?;
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                exn::bail!(ErrorKind::NotFound(PathBuf::from(key)))
            },
            Err(e) => exn::bail!(ErrorKind::Network(format!("get s3://{bucket}/{key}: {}", DisplayErrorContext(&e)))),
        };
        let body = output
            .body
            .collect()
            .await
            .or_raise(|| ErrorKind::Network(format!("reading body of s3://{bucket}/{key}")))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: &str, metadata: &Metadata) -> Result<()> {
        let _permit = self.acquire_permit().await?;
        let size = data.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .set_metadata((!metadata.is_empty()).then(|| metadata.clone()))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| ErrorKind::Network(format!("put s3://{bucket}/{key}: {}", DisplayErrorContext(&e))))?;
        tracing::trace!(store = %self.name, bucket, key, size, "Uploaded S3 object");
        Ok(())
    }
}
