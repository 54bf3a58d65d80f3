//! Construction options.

use crate::ContentTypeResolver;
use crate::error::{ErrorKind, Result};
use crate::scheduler::{DEFAULT_DOWNLOAD_CONCURRENCY, DEFAULT_UPLOAD_CONCURRENCY};
use exn::ResultExt;
use std::path::{Path, PathBuf};

/// Region used when neither the options nor the environment name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Where a [`WorkspaceSync`](crate::WorkspaceSync) reads from and writes to.
/// Validated once at construction; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    bucket: String,
    prefix: String,
    workspace_dir: PathBuf,
    region: String,
}
impl SyncTarget {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key prefix, always ending in `/`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Full object key for a validated relative path.
    pub(crate) fn key_for(&self, relative: &str) -> String {
        format!("{}{relative}", self.prefix)
    }
}

/// Builder for [`WorkspaceSync`](crate::WorkspaceSync).
///
/// ```
/// use wsync_engine::SyncOptions;
///
/// let options = SyncOptions::new("test-bucket", "users/u1/ws", "/tmp/ws1")
///     .download_concurrency(8)
///     .ignore_pattern("*.bak");
/// let target = options.target().unwrap();
/// assert_eq!(target.prefix(), "users/u1/ws/");
/// ```
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub(crate) bucket: String,
    pub(crate) prefix: String,
    pub(crate) workspace_dir: PathBuf,
    pub(crate) region: Option<String>,
    pub(crate) download_concurrency: usize,
    pub(crate) upload_concurrency: usize,
    pub(crate) ignore_patterns: Vec<String>,
    pub(crate) content_type_resolver: ContentTypeResolver,
}

impl SyncOptions {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>, workspace_dir: impl Into<PathBuf>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            workspace_dir: workspace_dir.into(),
            region: None,
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            ignore_patterns: Vec::new(),
            content_type_resolver: ContentTypeResolver::default(),
        }
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn download_concurrency(mut self, concurrency: usize) -> Self {
        self.download_concurrency = concurrency;
        self
    }

    pub fn upload_concurrency(mut self, concurrency: usize) -> Self {
        self.upload_concurrency = concurrency;
        self
    }

    /// Append one caller ignore pattern. Caller patterns are evaluated after
    /// the built-in defaults and `.syncignore`.
    pub fn ignore_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.ignore_patterns.push(pattern.into());
        self
    }

    pub fn ignore_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn content_type_resolver(mut self, resolver: ContentTypeResolver) -> Self {
        self.content_type_resolver = resolver;
        self
    }

    /// Validate bucket, prefix and workspace directory without touching the
    /// filesystem.
    pub fn target(&self) -> Result<SyncTarget> {
        validate_bucket(&self.bucket)?;
        let prefix = normalize_prefix(&self.prefix)?;
        if !self.workspace_dir.is_absolute() {
            exn::bail!(ErrorKind::Construction(format!(
                "workspace directory `{}` must be absolute",
                self.workspace_dir.display()
            )));
        }
        Ok(SyncTarget {
            bucket: self.bucket.clone(),
            prefix,
            workspace_dir: self.workspace_dir.clone(),
            region: resolve_region(self.region.as_deref()),
        })
    }
}

/// 3 to 63 characters of `a-z`, `0-9`, `.` and `-`, starting and ending with
/// a letter or digit.
fn validate_bucket(bucket: &str) -> Result<()> {
    let valid_chars = bucket.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-');
    let valid_ends = bucket.bytes().next().is_some_and(|b| b.is_ascii_alphanumeric())
        && bucket.bytes().last().is_some_and(|b| b.is_ascii_alphanumeric());
    if !(3..=63).contains(&bucket.len()) || !valid_chars || !valid_ends {
        exn::bail!(ErrorKind::Construction(format!("invalid bucket name `{bucket}`")));
    }
    Ok(())
}

/// Validate the prefix like any other key and give it exactly one trailing
/// `/`, so that `ws` never matches keys under `ws2/`.
fn normalize_prefix(prefix: &str) -> Result<String> {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        exn::bail!(ErrorKind::Construction("prefix is required".to_string()));
    }
    let key = wsync_storage::validate_key(trimmed)
        .and_then(wsync_storage::to_key)
        .or_raise(|| ErrorKind::Construction(format!("invalid prefix `{prefix}`")))?;
    Ok(format!("{key}/"))
}

fn resolve_region(region: Option<&str>) -> String {
    region
        .map(str::to_string)
        .or_else(|| std::env::var("AWS_REGION").ok())
        .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}
