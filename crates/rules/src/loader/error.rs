//! Reload outcomes and per-line diagnostics.

use std::fmt;

/// What to do with a rules file that contains malformed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidLinePolicy {
    /// Any bad line rejects the whole file; the active rules stay in place.
    #[default]
    RejectReload,
    /// Bad lines are logged and skipped; the remaining rules are loaded.
    SkipLine,
}

/// A rules file line that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiagnostic {
    /// 1-based line number.
    pub line: usize,
    pub text: String,
    pub error: String,
}

impl fmt::Display for LineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({})", self.line, self.error, self.text)
    }
}

/// Result of one call to [`RuleEngine::read_rules`](crate::engine::RuleEngine::read_rules).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// No rules file has been configured.
    NoSource,
    /// The rules file does not exist; rules and cache were cleared.
    Missing,
    /// The file's modification time could not be read.
    StatFailed { error: String },
    /// The file could not be read.
    ReadFailed { error: String },
    /// The file has not changed since the last successful load.
    Unchanged,
    /// The file has the same mtime and contents as a version rejected on an earlier poll.
    PreviouslyRejected,
    /// The file contains malformed lines and was not applied.
    Rejected { diagnostics: Vec<LineDiagnostic> },
    /// A new rule set is active.
    Reloaded {
        rules: usize,
        skipped: Vec<LineDiagnostic>,
    },
}

impl ReloadOutcome {
    /// Whether this reload replaced the active rule set.
    pub fn is_reloaded(&self) -> bool {
        matches!(self, Self::Reloaded { .. })
    }
}
