//! Rule evaluation engine.
//!
//! [`RuleEngine`] owns the active [`RuleSet`], the match cache and the loader
//! state. Evaluation is synchronous and infallible; reloads swap the rule set
//! as a whole and invalidate the cache before the new set becomes visible.
//!
//! The rule set snapshot and the cache both carry a generation number. A
//! reload bumps the cache generation (emptying it) before publishing the new
//! snapshot, and an evaluation only reads or writes the cache while the
//! generations agree, so a result computed against an older rule set is never
//! cached after the swap.

mod reload;

#[cfg(test)]
mod tests;

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rollup_core::config::{RulesConfig, DEFAULT_RELOAD_INTERVAL_SECS};

use crate::buffer::{AggregationBuffers, NoBuffers};
use crate::cache::RuleCache;
use crate::loader::{InvalidLinePolicy, RuleSource};
use crate::methods::MethodRegistry;
use crate::rule::{MatchMode, Rule};

// ── Results ─────────────────────────────────────────────────────────

/// One rule that applies to a metric path, with the name it aggregates into.
#[derive(Debug, Clone)]
pub struct AggregateMatch {
    pub rule: Arc<Rule>,
    pub output: String,
}

/// Matches for one metric path, in rule-file order.
pub type Matches = Arc<[AggregateMatch]>;

// ── Rule set ────────────────────────────────────────────────────────

/// Ordered, immutable collection of the rules in effect.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Arc<Rule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules: rules.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.iter()
    }
}

#[derive(Clone)]
struct Snapshot {
    generation: u64,
    rules: Arc<RuleSet>,
}

struct CacheState {
    generation: u64,
    entries: RuleCache<Matches>,
}

// ── Options ─────────────────────────────────────────────────────────

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Maximum cached metric paths; `None` = unbounded.
    pub cache_size: Option<NonZeroUsize>,
    pub match_mode: MatchMode,
    pub invalid_lines: InvalidLinePolicy,
    pub reload_interval: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_size: None,
            match_mode: MatchMode::Prefix,
            invalid_lines: InvalidLinePolicy::RejectReload,
            reload_interval: Duration::from_secs(DEFAULT_RELOAD_INTERVAL_SECS),
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &RulesConfig) -> Self {
        Self {
            cache_size: config.cache_size,
            match_mode: if config.full_match {
                MatchMode::Full
            } else {
                MatchMode::Prefix
            },
            invalid_lines: if config.skip_invalid_lines {
                InvalidLinePolicy::SkipLine
            } else {
                InvalidLinePolicy::RejectReload
            },
            reload_interval: Duration::from_secs(config.reload_interval_secs.max(1)),
        }
    }
}

// ── Engine ──────────────────────────────────────────────────────────

/// Matches metric paths against the active aggregation rules.
pub struct RuleEngine {
    options: EngineOptions,
    methods: MethodRegistry,
    buffers: Arc<dyn AggregationBuffers>,
    /// Loader state; held for the duration of a reload.
    source: Mutex<RuleSource>,
    active: RwLock<Snapshot>,
    cache: Mutex<CacheState>,
    empty: Matches,
}

impl RuleEngine {
    /// Create an engine with no rules.
    pub fn new(
        options: EngineOptions,
        methods: MethodRegistry,
        buffers: Arc<dyn AggregationBuffers>,
    ) -> Self {
        let cache = RuleCache::new(options.cache_size);
        Self {
            options,
            methods,
            buffers,
            source: Mutex::new(RuleSource::default()),
            active: RwLock::new(Snapshot {
                generation: 0,
                rules: Arc::new(RuleSet::default()),
            }),
            cache: Mutex::new(CacheState {
                generation: 0,
                entries: cache,
            }),
            empty: Arc::from(Vec::new()),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// Every rule that applies to `metric_path`, with its output name, in rule-file order.
    pub fn evaluate(&self, metric_path: &str) -> Matches {
        let snapshot = self.snapshot();
        self.evaluate_in(&snapshot, metric_path)
    }

    fn evaluate_in(&self, snapshot: &Snapshot, metric_path: &str) -> Matches {
        if snapshot.rules.is_empty() {
            return Arc::clone(&self.empty);
        }

        {
            let mut cache = self.cache.lock().expect("rule cache lock poisoned");
            if cache.generation == snapshot.generation {
                if let Some(hit) = cache.entries.get(metric_path) {
                    return hit;
                }
            }
        }

        let computed = self.compute(&snapshot.rules, metric_path);

        let mut cache = self.cache.lock().expect("rule cache lock poisoned");
        if cache.generation == snapshot.generation {
            cache
                .entries
                .insert(metric_path.to_string(), Arc::clone(&computed));
        }
        computed
    }

    fn compute(&self, rules: &RuleSet, metric_path: &str) -> Matches {
        let matches: Vec<AggregateMatch> = rules
            .iter()
            .filter_map(|rule| {
                rule.aggregate_metric(metric_path).map(|output| AggregateMatch {
                    rule: Arc::clone(rule),
                    output,
                })
            })
            .collect();

        if matches.is_empty() {
            Arc::clone(&self.empty)
        } else {
            Arc::from(matches)
        }
    }

    fn snapshot(&self) -> Snapshot {
        self.active.read().expect("rule set lock poisoned").clone()
    }

    /// Replace the active rule set, invalidating the cache first.
    fn install(&self, rules: RuleSet) {
        let mut cache = self.cache.lock().expect("rule cache lock poisoned");
        let mut active = self.active.write().expect("rule set lock poisoned");
        let generation = active.generation + 1;
        cache.generation = generation;
        cache.entries.clear();
        *active = Snapshot {
            generation,
            rules: Arc::new(rules),
        };
    }

    /// Drop all rules and cached results.
    pub fn clear(&self) {
        self.install(RuleSet::default());
    }

    /// The rule set currently in effect.
    pub fn rules(&self) -> Arc<RuleSet> {
        self.snapshot().rules
    }

    /// Number of rule sets installed so far.
    pub fn generation(&self) -> u64 {
        self.active.read().expect("rule set lock poisoned").generation
    }

    /// Number of cached metric paths.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().expect("rule cache lock poisoned").entries.len()
    }

    /// Whether a metric path currently has a cached result.
    pub fn is_cached(&self, metric_path: &str) -> bool {
        self.cache
            .lock()
            .expect("rule cache lock poisoned")
            .entries
            .contains(metric_path)
    }

    /// Modification time of the rules file that produced the active rule set.
    pub fn last_loaded(&self) -> Option<DateTime<Utc>> {
        self.source
            .lock()
            .expect("rule source lock poisoned")
            .last_loaded()
            .map(DateTime::<Utc>::from)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(
            EngineOptions::default(),
            MethodRegistry::default(),
            Arc::new(NoBuffers),
        )
    }
}
