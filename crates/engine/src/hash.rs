//! Content hashing.
//!
//! The content hash is the lowercase hex MD5 of a file, the same digest S3
//! reports as the ETag of a single-part upload.

use md5::{Digest, Md5};

/// Lowercase hex MD5 of `data`.
///
/// ```
/// assert_eq!(wsync_engine::md5_hex(b"hello"), "5d41402abc4b2a76b9719d911017c592");
/// ```
#[must_use]
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}
