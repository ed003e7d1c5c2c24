//! Aggregation rules: definition parsing, pattern compilation and output naming.
//!
//! A [`Rule`] is immutable once built. Its input pattern is compiled into a
//! regex with named captures and its output pattern into an
//! [`OutputTemplate`]; both are reused for every metric path evaluated.

mod definition;
mod pattern;
mod template;


use std::fmt;

use regex::{Captures, Regex};
use tracing::warn;

use crate::error::{Result, RuleError};
use crate::methods::{MethodRegistry, Reducer};

pub use self::definition::RuleDefinition;
pub use self::pattern::MatchMode;
pub use self::template::{OutputTemplate, TemplateError};

/// A compiled aggregation rule.
pub struct Rule {
    definition: RuleDefinition,
    reducer: Reducer,
    regex: Regex,
    template: OutputTemplate,
}

impl Rule {
    /// Compile a rule, resolving its method against `methods`.
    pub fn new(definition: RuleDefinition, methods: &MethodRegistry, mode: MatchMode) -> Result<Self> {
        let reducer = methods
            .lookup(&definition.method)
            .ok_or_else(|| RuleError::UnknownMethod(definition.method.clone()))?;
        let regex = pattern::compile(&definition.input_pattern, mode)?;
        let template = OutputTemplate::parse(&definition.output_pattern)?;

        Ok(Self {
            definition,
            reducer,
            regex,
            template,
        })
    }

    /// Parse and compile a single rule-file line.
    pub fn parse(line: &str, methods: &MethodRegistry, mode: MatchMode) -> Result<Self> {
        Self::new(RuleDefinition::parse(line)?, methods, mode)
    }

    pub fn input_pattern(&self) -> &str {
        &self.definition.input_pattern
    }

    pub fn output_pattern(&self) -> &str {
        &self.definition.output_pattern
    }

    pub fn method(&self) -> &str {
        &self.definition.method
    }

    /// Flush frequency in seconds.
    pub fn frequency(&self) -> u32 {
        self.definition.frequency
    }

    pub fn definition(&self) -> &RuleDefinition {
        &self.definition
    }

    /// Match `metric_path` against the rule's input pattern.
    pub fn captures<'p>(&self, metric_path: &'p str) -> Option<Captures<'p>> {
        self.regex.captures(metric_path)
    }

    /// Output metric name for `metric_path`, or `None` if the rule does not apply.
    ///
    /// A template referencing a capture the pattern never produced is logged
    /// and treated as no match.
    pub fn aggregate_metric(&self, metric_path: &str) -> Option<String> {
        let captures = self.captures(metric_path)?;
        match self.template.render(&captures) {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(
                    metric = %metric_path,
                    template = %self.definition.output_pattern,
                    error = %e,
                    "failed to interpolate output template"
                );
                None
            }
        }
    }

    /// Reduce accumulated samples with the rule's aggregation method.
    pub fn aggregate(&self, values: &[f64]) -> Option<f64> {
        (self.reducer)(values)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("definition", &self.definition)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.definition, f)
    }
}
