//! Layered configuration for wsync.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. A config file (`.toml`, `.yaml`/`.yml` or `.json`), by default
//!    `config.toml` in the platform config directory
//! 3. The standard AWS environment variables (`AWS_REGION`,
//!    `AWS_ACCESS_KEY_ID`, ...)
//! 4. `WSYNC_*` environment variables (`WSYNC_BUCKET`, `WSYNC_PREFIX`, ...)

mod config;
pub mod error;

pub use crate::config::{Config, default_config_path};
