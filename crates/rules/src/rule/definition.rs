//! Textual rule definitions: `<output_pattern> (<frequency>) = <method> <input_pattern>`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};

/// One parsed, not yet compiled, rule line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub output_pattern: String,
    /// Flush frequency in seconds.
    pub frequency: u32,
    pub method: String,
    pub input_pattern: String,
}

impl RuleDefinition {
    pub fn new(
        input_pattern: impl Into<String>,
        output_pattern: impl Into<String>,
        method: impl Into<String>,
        frequency: u32,
    ) -> Self {
        Self {
            output_pattern: output_pattern.into(),
            frequency,
            method: method.into(),
            input_pattern: input_pattern.into(),
        }
    }

    /// Parse a single definition line.
    ///
    /// The line is split once on `=`. The left side must hold exactly the
    /// output pattern and the parenthesized frequency, the right side exactly
    /// the method name and the input pattern.
    pub fn parse(line: &str) -> Result<Self> {
        let (left, right) = line
            .split_once('=')
            .ok_or_else(|| RuleError::Syntax(format!("missing '=' in '{}'", line.trim())))?;

        let [output_pattern, frequency] = two_tokens(left, "output pattern and (frequency)")?;
        let [method, input_pattern] = two_tokens(right, "method and input pattern")?;

        let literal = frequency.trim_start_matches('(').trim_end_matches(')');
        let frequency = match literal.parse::<u32>() {
            Ok(0) | Err(_) => return Err(RuleError::Frequency(frequency.to_string())),
            Ok(n) => n,
        };

        Ok(Self::new(input_pattern, output_pattern, method, frequency))
    }
}

fn two_tokens<'a>(side: &'a str, expected: &str) -> Result<[&'a str; 2]> {
    let tokens: Vec<&str> = side.split_whitespace().collect();
    match tokens.as_slice() {
        [a, b] => Ok([*a, *b]),
        _ => Err(RuleError::Syntax(format!(
            "expected {}, found {} token(s) in '{}'",
            expected,
            tokens.len(),
            side.trim()
        ))),
    }
}

impl fmt::Display for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) = {} {}",
            self.output_pattern, self.frequency, self.method, self.input_pattern
        )
    }
}
