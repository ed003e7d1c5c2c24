//! Input pattern → regex translation.
//!
//! Patterns are split on `.` and each segment is translated on its own:
//!
//! | segment        | regex                       |
//! |----------------|-----------------------------|
//! | `pre<<name>>post` | `pre(?P<name>.+)post` (may span dots) |
//! | `pre<name>post`   | `pre(?P<name>[^.]+)post`    |
//! | `*`            | `[^.]+`                     |
//! | anything else  | literal, `*` → `[^.]*`      |
//!
//! Segments are rejoined with `\.`.

use regex::Regex;

use crate::error::{Result, RuleError};

/// How much of a metric path a rule's pattern has to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The pattern only has to match a prefix of the path.
    #[default]
    Prefix,
    /// The pattern has to match the entire path.
    Full,
}

/// Compile an input pattern into an anchored regex.
pub(crate) fn compile(input_pattern: &str, mode: MatchMode) -> Result<Regex> {
    let body = translate(input_pattern);
    let anchored = match mode {
        MatchMode::Prefix => format!("^(?:{})", body),
        MatchMode::Full => format!("^(?:{})$", body),
    };
    Regex::new(&anchored).map_err(|e| RuleError::Pattern {
        pattern: input_pattern.to_string(),
        source: Box::new(e),
    })
}

/// Translate an input pattern into an unanchored regex body.
pub(crate) fn translate(input_pattern: &str) -> String {
    input_pattern
        .split('.')
        .map(translate_segment)
        .collect::<Vec<_>>()
        .join(r"\.")
}

fn translate_segment(segment: &str) -> String {
    if let Some((pre, name, post)) = delimited(segment, "<<", ">>") {
        return format!("{}(?P<{}>.+){}", literal(pre), name, literal(post));
    }
    if let Some((pre, name, post)) = delimited(segment, "<", ">") {
        return format!("{}(?P<{}>[^.]+){}", literal(pre), name, literal(post));
    }
    if segment == "*" {
        return "[^.]+".to_string();
    }
    literal(segment)
}

/// Split `segment` around the first `open` ... `close` pair.
fn delimited<'a>(segment: &'a str, open: &str, close: &str) -> Option<(&'a str, &'a str, &'a str)> {
    let start = segment.find(open)?;
    let name_start = start + open.len();
    let end = name_start + segment[name_start..].find(close)?;
    Some((
        &segment[..start],
        &segment[name_start..end],
        &segment[end + close.len()..],
    ))
}

/// Escape literal text, keeping `*` as a within-segment wildcard.
fn literal(text: &str) -> String {
    text.split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[^.]*")
}
