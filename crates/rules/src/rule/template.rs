//! Output name templates.

use std::fmt;

use regex::Captures;

use crate::error::{Result, RuleError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Field(String),
}

/// A compiled output pattern: literal text interleaved with capture slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    pieces: Vec<Piece>,
}

/// Failure to render a template against one metric path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("capture '{0}' was not produced by the input pattern")]
    MissingField(String),
}

impl OutputTemplate {
    /// Compile an output pattern. Both `<name>` and `<<name>>` become slots for
    /// the capture called `name`.
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut pieces = Vec::new();
        let mut rest = pattern;

        while let Some(start) = rest.find('<') {
            if start > 0 {
                pieces.push(Piece::Literal(rest[..start].to_string()));
            }
            let (open, close) = if rest[start..].starts_with("<<") {
                ("<<", ">>")
            } else {
                ("<", ">")
            };
            let name_start = start + open.len();
            let name_len = rest[name_start..].find(close).ok_or_else(|| RuleError::Template {
                pattern: pattern.to_string(),
                reason: format!("unterminated '{}' placeholder", open),
            })?;
            let name = &rest[name_start..name_start + name_len];
            if name.is_empty() {
                return Err(RuleError::Template {
                    pattern: pattern.to_string(),
                    reason: "empty placeholder name".to_string(),
                });
            }
            pieces.push(Piece::Field(name.to_string()));
            rest = &rest[name_start + name_len + close.len()..];
        }
        if !rest.is_empty() {
            pieces.push(Piece::Literal(rest.to_string()));
        }

        Ok(Self { pieces })
    }

    /// Names of the captures this template substitutes, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Field(name) => Some(name.as_str()),
            Piece::Literal(_) => None,
        })
    }

    /// Substitute `captures` into the template.
    pub fn render(&self, captures: &Captures<'_>) -> std::result::Result<String, TemplateError> {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Field(name) => {
                    let value = captures
                        .name(name)
                        .ok_or_else(|| TemplateError::MissingField(name.clone()))?;
                    out.push_str(value.as_str());
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for OutputTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => f.write_str(text)?,
                Piece::Field(name) => write!(f, "<{}>", name)?,
            }
        }
        Ok(())
    }
}
