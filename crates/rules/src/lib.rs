//! Metric-name aggregation rule engine.
//!
//! This crate provides:
//! - A line-oriented rule language (`<output> (<freq>) = <method> <input>`)
//!   compiled into regex matchers and output-name templates
//! - A registry of aggregation methods (`sum`, `avg`, plus registered extras)
//! - A per-metric match cache, unbounded or LRU-bounded
//! - Hot reload of the rules file by modification-time polling, keeping the
//!   rule set, cache and downstream aggregation buffers consistent

pub mod buffer;
pub mod cache;
pub mod engine;
pub mod error;
pub mod loader;
pub mod methods;
pub mod rule;
pub mod scheduler;

pub use buffer::{AggregationBuffers, NoBuffers};
pub use engine::{AggregateMatch, EngineOptions, Matches, RuleEngine, RuleSet};
pub use error::RuleError;
pub use loader::{InvalidLinePolicy, ReloadOutcome};
pub use methods::MethodRegistry;
pub use rule::{MatchMode, Rule, RuleDefinition};
pub use scheduler::ReloadTask;
