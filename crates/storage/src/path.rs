//! Path validation and security utilities.
//!
//! This module provides functions to validate workspace-relative paths and
//! object keys, and prevent security issues like path traversal attacks. Every
//! path that reaches the filesystem or the object store goes through here.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a workspace-relative path for security and correctness.
///
/// Repeated separators, `.` components and trailing separators are
/// normalized away. Any `..` component is rejected outright, even one that
/// would stay inside the root (`a/../b`): a remote key spelled that way is
/// either hostile or broken, and neither is worth resolving.
///
/// > **Note:** Backslashes are only separators on Windows. Use
/// >           [`validate_key`] for object keys, which normalizes them first.
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use wsync_storage::validate_path;
/// // Valid paths
/// assert!(validate_path("src/main.rs").is_ok());
/// assert!(validate_path("a/b/c/file.txt").is_ok());
/// // Invalid paths
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a/../b").is_err());
/// assert!(validate_path("/etc/passwd").is_err());
/// assert!(validate_path("a\0b").is_err());
/// // Paths get normalized
/// assert_eq!(
///     validate_path("./notes//./todo.md/").unwrap(),
///     Path::new("notes/todo.md")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls; reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir => {},
            Component::RootDir | Component::Prefix(_) | Component::ParentDir => {
                exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()))
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Validates an object key (already stripped of the sync prefix).
///
/// Object stores treat `\` as an ordinary character, but a key written from
/// a Windows machine would land as a single oddly-named file locally, or
/// worse, as `..\..\` traversal on a Windows host. Backslashes are turned
/// into `/` before running [`validate`].
///
/// ```
/// use std::path::Path;
/// use wsync_storage::validate_key;
/// assert_eq!(validate_key("docs\\readme.md").unwrap(), Path::new("docs/readme.md"));
/// assert!(validate_key("..\\..\\etc\\passwd").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<PathBuf> {
    validate(key.replace('\\', "/"))
}

/// Converts a workspace-relative path into the `/`-separated form used in
/// object keys.
///
/// The path is validated first. Non UTF-8 paths cannot be represented as an
/// object key and are rejected as [`InvalidPath`](ErrorKind::InvalidPath).
///
/// ```
/// use std::path::Path;
/// use wsync_storage::to_key;
/// assert_eq!(to_key(Path::new("sub/./b.txt")).unwrap(), "sub/b.txt");
/// ```
pub fn to_key(path: impl AsRef<Path>) -> Result<String> {
    let validated = validate(path.as_ref())?;
    let mut parts = Vec::new();
    for component in validated.components() {
        match component.as_os_str().to_str() {
            Some(part) => parts.push(part),
            None => exn::bail!(ErrorKind::InvalidPath(validated.clone())),
        }
    }
    Ok(parts.join("/"))
}
