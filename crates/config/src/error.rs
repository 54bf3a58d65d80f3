//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A config error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An explicitly requested config file does not exist
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Unsupported config file extension
    #[display("unsupported config format: {}", _0.display())]
    Format(#[error(not(source))] PathBuf),
    /// The merged configuration could not be deserialized
    #[display("invalid configuration")]
    Invalid,
    /// A required setting is missing from every source
    #[display("missing required setting `{_0}`")]
    Missing(#[error(not(source))] &'static str),
    /// The settings were rejected when building the sync engine
    #[display("settings rejected by the sync engine")]
    Engine,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
