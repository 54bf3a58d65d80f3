use std::fmt::{Display, Formatter, Result as FmtResult};

/// Where an ignore rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSource {
    /// Built-in defaults
    Defaults,
    /// A line of the workspace's `.syncignore` (1-based)
    SyncIgnore { line: usize },
    /// Patterns handed over by the caller at construction
    Caller,
}
impl Display for RuleSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Defaults => write!(f, "<defaults>"),
            Self::SyncIgnore { line } => write!(f, ".syncignore:{line}"),
            Self::Caller => write!(f, "<caller>"),
        }
    }
}

/// One compiled ignore rule, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    /// The pattern as written, without surrounding whitespace
    pub pattern: String,
    /// `!pattern`: re-includes what earlier rules excluded
    pub is_negation: bool,
    /// `pattern/`: matches directories (and everything beneath them) only
    pub is_dir_only: bool,
    pub source: RuleSource,
}
impl IgnoreRule {
    /// Parse one gitignore line. Blank lines and `#` comments yield `None`.
    pub(crate) fn parse(line: &str, source: RuleSource) -> Option<Self> {
        let pattern = line.trim();
        if pattern.is_empty() || pattern.starts_with('#') {
            return None;
        }
        Some(Self {
            pattern: pattern.to_string(),
            is_negation: pattern.starts_with('!'),
            is_dir_only: pattern.ends_with('/'),
            source,
        })
    }
}
