//! Rules file parsing.

use crate::methods::MethodRegistry;
use crate::rule::{MatchMode, Rule};

use super::error::LineDiagnostic;

/// Every rule that compiled, in file order, plus a diagnostic per failed line.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub rules: Vec<Rule>,
    pub diagnostics: Vec<LineDiagnostic>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Parse the contents of a rules file.
///
/// Blank lines and lines starting with `#` (after leading whitespace) are ignored.
pub fn parse_rules(contents: &str, methods: &MethodRegistry, mode: MatchMode) -> ParseReport {
    let mut report = ParseReport::default();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match Rule::parse(line, methods, mode) {
            Ok(rule) => report.rules.push(rule),
            Err(e) => report.diagnostics.push(LineDiagnostic {
                line: idx + 1,
                text: line.to_string(),
                error: e.to_string(),
            }),
        }
    }

    report
}
