pub mod error;
mod filter;
mod rules;

pub use crate::filter::{DEFAULT_PATTERNS, IgnoreFilter, SYNCIGNORE_FILE};
pub use crate::rules::{IgnoreRule, RuleSource};
