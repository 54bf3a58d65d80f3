//! Engine Error Types
//!
//! Fatal errors only. Failures that concern a single file never abort an
//! operation; they are collected into [`SyncResult`](crate::SyncResult).

use derive_more::{Display, Error};

/// An engine error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The two sync directions.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    #[display("pull")]
    Pull,
    #[display("push")]
    Push,
}

/// ### Construction Errors
/// - [`ErrorKind::Construction`]
/// - [`ErrorKind::Filter`]
///
/// ### Operational Errors
/// - [`ErrorKind::Enumeration`]
/// - [`ErrorKind::Busy`]
/// - [`ErrorKind::NoBackgroundPull`]
/// - [`ErrorKind::BackgroundPull`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Storage`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Invalid bucket, prefix, workspace directory or concurrency.
    #[display("invalid sync configuration: {_0}")]
    Construction(#[error(not(source))] String),
    /// Ignore rules could not be compiled or loaded.
    #[display("cannot compile ignore rules")]
    Filter,
    /// The remote listing or the local walk failed; no file was touched.
    #[display("cannot enumerate {_0}")]
    Enumeration(#[error(not(source))] String),
    /// Another operation, the one named, is already running on this instance.
    #[display("{_0} already in progress")]
    Busy(#[error(not(source))] Operation),
    #[display("no background pull was started")]
    NoBackgroundPull,
    #[display("background pull failed: {_0}")]
    BackgroundPull(#[error(not(source))] String),
    /// The local storage backend could not be set up.
    #[display("storage backend failure")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Enumeration(_) | Self::Busy(_) | Self::BackgroundPull(_) | Self::Storage => true,
            Self::Construction(_) | Self::Filter | Self::NoBackgroundPull => false,
        }
    }
}
