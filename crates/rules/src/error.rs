//! Error types for rule compilation.

/// Errors raised while turning a rule definition into a compiled [`Rule`](crate::rule::Rule).
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The definition line does not have the `<output> (<freq>) = <method> <input>` shape.
    #[error("malformed rule definition: {0}")]
    Syntax(String),

    /// The frequency literal is not a positive integer.
    #[error("invalid frequency '{0}': expected a positive integer")]
    Frequency(String),

    /// The aggregation method is not registered.
    #[error("invalid aggregation method '{0}'")]
    UnknownMethod(String),

    /// The input pattern translated into an invalid regex (e.g. a repeated capture name).
    #[error("invalid input pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// The output pattern has an unterminated or empty placeholder.
    #[error("invalid output pattern '{pattern}': {reason}")]
    Template { pattern: String, reason: String },
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
