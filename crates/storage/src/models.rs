//! Storage models.
//!
//! These types describe what the object store and the local filesystem know
//! about a file, and are what the sync engine diffs against each other.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use time::OffsetDateTime;

/// Object metadata returned by an [`ObjectStore`](crate::ObjectStore) listing.
///
/// Produced fresh on every listing call; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Full object key, including the sync prefix
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// Entity tag as reported by the store
    pub etag: ETag,
    /// Last modified timestamp
    pub last_modified: OffsetDateTime,
}
impl RemoteObject {
    pub fn new(key: impl Into<String>, size: u64, etag: ETag, last_modified: OffsetDateTime) -> Self {
        Self {
            key: key.into(),
            size,
            etag,
            last_modified,
        }
    }
}

/// File metadata returned by [`LocalBackend`](crate::backend::LocalBackend).
///
/// The content hash is deliberately absent: hashing is the expensive part of
/// a diff and the engine decides when it is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Relative path from the workspace root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl LocalFile {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
        }
    }
}

/// An object entity tag, classified by whether it can stand in for a content
/// hash.
///
/// S3 reports the MD5 of the object as its ETag only for single-part uploads
/// without SSE-KMS. Multipart uploads get a composite tag (an MD5 of the part
/// MD5s, suffixed with `-<part count>`) and other stores may hand out
/// anything at all. Only [`ETag::Md5`] is ever compared to a local hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ETag {
    /// Exactly 32 hex digits; normalized to lowercase.
    Md5(String),
    /// `<32 hex digits>-<part count>`; not a content hash.
    Composite { digest: String, parts: u32 },
    /// Anything else, including a missing tag.
    Opaque(String),
}
impl ETag {
    /// Classify a raw ETag value. Surrounding double quotes (and a weak `W/`
    /// marker) are stripped first.
    ///
    /// ```
    /// use wsync_storage::ETag;
    /// assert_eq!(
    ///     ETag::parse("\"5D41402ABC4B2A76B9719D911017C592\""),
    ///     ETag::Md5("5d41402abc4b2a76b9719d911017c592".to_string())
    /// );
    /// assert!(matches!(ETag::parse("\"5d41402abc4b2a76b9719d911017c592-3\""), ETag::Composite { parts: 3, .. }));
    /// assert!(matches!(ETag::parse("v1"), ETag::Opaque(_)));
    /// ```
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let unquoted = trimmed.strip_prefix("W/").unwrap_or(trimmed).trim_matches('"');
        if is_md5_hex(unquoted) {
            return Self::Md5(unquoted.to_ascii_lowercase());
        }
        if let Some((digest, parts)) = unquoted.split_once('-')
            && is_md5_hex(digest)
            && let Ok(parts) = parts.parse::<u32>()
        {
            return Self::Composite {
                digest: digest.to_ascii_lowercase(),
                parts,
            };
        }
        Self::Opaque(unquoted.to_string())
    }

    /// The content MD5 (lowercase hex), if this tag is one.
    pub fn content_md5(&self) -> Option<&str> {
        match self {
            Self::Md5(md5) => Some(md5),
            Self::Composite { .. } | Self::Opaque(_) => None,
        }
    }
}
impl Display for ETag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Md5(md5) => write!(f, "{md5}"),
            Self::Composite { digest, parts } => write!(f, "{digest}-{parts}"),
            Self::Opaque(raw) => write!(f, "{raw}"),
        }
    }
}

fn is_md5_hex(value: &str) -> bool {
    value.len() == 32 && value.bytes().all(|b| b.is_ascii_hexdigit())
}
