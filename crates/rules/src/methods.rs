//! Registry of aggregation methods available to rules.
//!
//! A method is a pure reducer from a slice of samples to a single value.
//! The registry is owned by the engine; rules resolve their method against it
//! when they are compiled.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Reduces a batch of samples to one value, or `None` when there is nothing to report.
pub type Reducer = Arc<dyn Fn(&[f64]) -> Option<f64> + Send + Sync>;

/// Named aggregation methods.
#[derive(Clone)]
pub struct MethodRegistry {
    methods: HashMap<String, Reducer>,
}

impl MethodRegistry {
    /// Create a registry with no methods at all.
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in `sum` and `avg` methods.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("sum", sum);
        registry.register("avg", avg);
        registry
    }

    /// Register (or replace) a method under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, reducer: F)
    where
        F: Fn(&[f64]) -> Option<f64> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(reducer));
    }

    pub fn lookup(&self, name: &str) -> Option<Reducer> {
        self.methods.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.names())
            .finish()
    }
}

/// Arithmetic sum; zero for an empty batch.
pub fn sum(values: &[f64]) -> Option<f64> {
    Some(values.iter().sum())
}

/// Arithmetic mean; `None` for an empty batch.
pub fn avg(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
