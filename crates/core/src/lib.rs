pub mod config;

pub use config::{AggregatorConfig, RulesConfig};
