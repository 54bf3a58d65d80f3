pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::{Metadata, ObjectStore, RemoteObjectStream};
pub use crate::models::{ETag, LocalFile, RemoteObject};
pub use crate::path::{to_key, validate as validate_path, validate_key};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn ObjectStore + Send + Sync>;
