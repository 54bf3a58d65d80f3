//! Compiled ignore rules.
//!
//! Rules are gitignore patterns evaluated in order, later rules overriding
//! earlier ones: built-in defaults first, then the workspace's `.syncignore`,
//! then whatever the caller passes in.

use crate::error::{ErrorKind, Result};
use crate::rules::{IgnoreRule, RuleSource};
use exn::ResultExt;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Name of the per-workspace ignore file, looked up in the workspace root.
pub const SYNCIGNORE_FILE: &str = ".syncignore";

/// Patterns every workspace ignores unless a later rule re-includes them.
pub const DEFAULT_PATTERNS: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "node_modules/",
    "dist/",
    "*.log",
    ".git/",
    "__pycache__/",
    "*.swp",
    "*.tmp",
];

/// A precompiled ignore matcher.
///
/// Paths are always relative to the workspace root, and use `/` separators.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use wsync_filter::{DEFAULT_PATTERNS, IgnoreFilter};
///
/// let filter = IgnoreFilter::compile(DEFAULT_PATTERNS, Some("secrets/\n"), ["!keep.log"]).unwrap();
/// assert!(filter.is_ignored(Path::new("debug.log"), false));
/// assert!(!filter.is_ignored(Path::new("keep.log"), false));
/// assert!(filter.is_ignored_or_parents(Path::new("secrets/api.key"), false));
/// assert!(!filter.is_ignored_or_parents(Path::new("src/main.rs"), false));
/// ```
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    matcher: Gitignore,
    rules: Vec<IgnoreRule>,
}

impl IgnoreFilter {
    /// Compile built-in defaults, the contents of a `.syncignore` file and
    /// caller patterns, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPattern`](ErrorKind::InvalidPattern) naming the first
    /// pattern that fails to compile and where it came from.
    pub fn compile<I, S>(defaults: &[&str], syncignore: Option<&str>, caller_patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let defaults = defaults.iter().filter_map(|line| IgnoreRule::parse(line, RuleSource::Defaults));
        let file = syncignore
            .into_iter()
            .flat_map(str::lines)
            .enumerate()
            .filter_map(|(index, line)| IgnoreRule::parse(line, RuleSource::SyncIgnore { line: index + 1 }));
        let caller: Vec<IgnoreRule> = caller_patterns
            .into_iter()
            .filter_map(|line| IgnoreRule::parse(line.as_ref(), RuleSource::Caller))
            .collect();
        let rules: Vec<IgnoreRule> = defaults.chain(file).chain(caller).collect();

        let mut builder = GitignoreBuilder::new(".");
        for rule in &rules {
            builder.add_line(None, &rule.pattern).or_raise(|| ErrorKind::InvalidPattern {
                pattern: rule.pattern.clone(),
                origin: rule.source.to_string(),
            })?;
        }
        let matcher = builder.build().or_raise(|| ErrorKind::Build)?;
        tracing::debug!(rules = rules.len(), "Compiled ignore rules");
        Ok(Self { matcher, rules })
    }

    /// Compile [`DEFAULT_PATTERNS`], `<workspace_dir>/.syncignore` (if it
    /// exists) and caller patterns.
    pub fn load<I, S>(workspace_dir: impl AsRef<Path>, caller_patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path = workspace_dir.as_ref().join(SYNCIGNORE_FILE);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e).or_raise(|| ErrorKind::Read(path)),
        };
        if contents.is_some() {
            tracing::debug!(path = %path.display(), "Loaded ignore file");
        }
        Self::compile(DEFAULT_PATTERNS, contents.as_deref(), caller_patterns)
    }

    /// Whether `path` itself matches. Meant for tree walks, where an ignored
    /// directory is never descended into and so its contents never reach
    /// this check.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.matcher.matched(path, is_dir).is_ignore()
    }

    /// Whether `path` or any of its ancestor directories matches. Meant for
    /// paths that did not come from a walk, such as remote keys.
    ///
    /// Gives the same answer a walk would: a file under an ignored directory
    /// stays ignored even when a later rule re-includes the file itself.
    pub fn is_ignored_or_parents(&self, path: &Path, is_dir: bool) -> bool {
        let ancestor_ignored = path
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty() && !(dir.has_root() && dir.parent().is_none()))
            .any(|dir| self.is_ignored(dir, true));
        ancestor_ignored || self.is_ignored(path, is_dir)
    }

    /// The compiled rules, in evaluation order.
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }
}
