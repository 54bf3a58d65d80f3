//! Filter Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A pattern could not be compiled into a glob
    #[display("invalid ignore pattern `{pattern}` ({origin})")]
    InvalidPattern { pattern: String, origin: String },
    /// The ignore file exists but could not be read
    #[display("cannot read ignore file: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// The compiled rule set could not be assembled
    #[display("cannot build ignore matcher")]
    Build,
}

impl ErrorKind {
    /// Ignore rules are static input: nothing here gets better on retry.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
