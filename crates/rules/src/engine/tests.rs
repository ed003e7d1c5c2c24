//! Tests for rule evaluation and caching.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use super::*;
use crate::rule::MatchMode;

fn rule_set(lines: &[&str]) -> RuleSet {
    let methods = MethodRegistry::default();
    RuleSet::new(
        lines
            .iter()
            .map(|line| Rule::parse(line, &methods, MatchMode::Prefix).expect("rule compiles"))
            .collect(),
    )
}

fn engine_with(lines: &[&str]) -> RuleEngine {
    let engine = RuleEngine::default();
    engine.install(rule_set(lines));
    engine
}

fn bounded_engine(capacity: usize, lines: &[&str]) -> RuleEngine {
    let options = EngineOptions {
        cache_size: NonZeroUsize::new(capacity),
        ..EngineOptions::default()
    };
    let engine = RuleEngine::new(options, MethodRegistry::default(), Arc::new(NoBuffers));
    engine.install(rule_set(lines));
    engine
}

fn outputs(matches: &Matches) -> Vec<&str> {
    matches.iter().map(|m| m.output.as_str()).collect()
}

#[test]
fn empty_rule_set_bypasses_cache() {
    let engine = RuleEngine::default();
    assert!(engine.evaluate("servers.prod.cpu.load1").is_empty());
    assert_eq!(engine.cache_len(), 0);
}

#[test]
fn evaluate_single_rule() {
    let engine = engine_with(&["aggregated.<env>.cpu (60) = avg servers.<env>.cpu.*"]);
    let matches = engine.evaluate("servers.prod.cpu.load1");
    assert_eq!(outputs(&matches), vec!["aggregated.prod.cpu"]);
    assert_eq!(matches[0].rule.method(), "avg");
    assert_eq!(matches[0].rule.frequency(), 60);
}

#[test]
fn repeated_evaluation_hits_cache() {
    let engine = engine_with(&["<<cluster>>.mean (30) = sum <<cluster>>.requests"]);
    let first = engine.evaluate("east.zoneA.requests");
    let second = engine.evaluate("east.zoneA.requests");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(outputs(&second), vec!["east.zoneA.mean"]);
    assert_eq!(engine.cache_len(), 1);
    assert_eq!(engine.rules().len(), 1);
}

#[test]
fn negative_results_are_cached() {
    let engine = engine_with(&["out (60) = sum servers.*.cpu"]);
    let first = engine.evaluate("unrelated.metric");
    assert!(first.is_empty());
    assert!(engine.is_cached("unrelated.metric"));

    let second = engine.evaluate("unrelated.metric");
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn all_matches_returned_in_rule_order() {
    let engine = engine_with(&[
        "by_env.<env>.total (60) = sum servers.<env>.*.requests",
        "never (60) = sum other.*",
        "all.requests (60) = sum servers.*.*.requests",
        "by_host.<host> (10) = avg servers.*.<host>.requests",
    ]);
    let matches = engine.evaluate("servers.prod.web1.requests");
    assert_eq!(
        outputs(&matches),
        vec!["by_env.prod.total", "all.requests", "by_host.web1"]
    );
}

#[test]
fn template_failure_only_drops_that_rule() {
    let engine = engine_with(&[
        "broken.<region> (60) = sum servers.<env>.cpu",
        "fine.<env> (60) = sum servers.<env>.cpu",
    ]);
    let matches = engine.evaluate("servers.prod.cpu");
    assert_eq!(outputs(&matches), vec!["fine.prod"]);
}

#[test]
fn bounded_cache_keeps_most_recent_paths() {
    let engine = bounded_engine(3, &["out.<a> (60) = sum m.<a>"]);
    for i in 0..10 {
        engine.evaluate(&format!("m.{i}"));
    }
    assert_eq!(engine.cache_len(), 3);
    for i in 7..10 {
        assert!(engine.is_cached(&format!("m.{i}")));
    }
}

#[test]
fn cache_hit_refreshes_recency() {
    let engine = bounded_engine(3, &["out.<a> (60) = sum m.<a>"]);
    for path in ["m.a", "m.b", "m.c", "m.a", "m.d"] {
        engine.evaluate(path);
    }
    assert!(engine.is_cached("m.a"));
    assert!(!engine.is_cached("m.b"));
    assert!(engine.is_cached("m.c"));
    assert!(engine.is_cached("m.d"));
}

#[test]
fn install_invalidates_cached_results() {
    let engine = engine_with(&["old.<env> (60) = sum servers.<env>.cpu"]);
    assert_eq!(outputs(&engine.evaluate("servers.prod.cpu")), vec!["old.prod"]);

    engine.install(rule_set(&["new.<env> (60) = avg servers.<env>.cpu"]));
    assert_eq!(engine.cache_len(), 0);
    assert_eq!(outputs(&engine.evaluate("servers.prod.cpu")), vec!["new.prod"]);
    assert_eq!(engine.generation(), 2);
}

#[test]
fn evaluation_against_a_replaced_rule_set_is_not_cached() {
    let engine = engine_with(&["old.<env> (60) = sum servers.<env>.cpu"]);
    let stale = engine.snapshot();

    engine.install(rule_set(&["new.<env> (60) = sum servers.<env>.cpu"]));
    let result = engine.evaluate_in(&stale, "servers.prod.cpu");
    assert_eq!(outputs(&result), vec!["old.prod"]);
    assert!(!engine.is_cached("servers.prod.cpu"));

    assert_eq!(outputs(&engine.evaluate("servers.prod.cpu")), vec!["new.prod"]);
}

#[test]
fn clear_drops_rules_and_cache() {
    let engine = engine_with(&["out (60) = sum a.*"]);
    engine.evaluate("a.b");
    engine.clear();
    assert!(engine.rules().is_empty());
    assert_eq!(engine.cache_len(), 0);
    assert!(engine.evaluate("a.b").is_empty());
}

#[test]
fn concurrent_evaluation_during_swaps_settles_on_latest_rules() {
    let engine = Arc::new(engine_with(&["v0.<h> (60) = sum hosts.<h>.cpu"]));
    let paths: Vec<String> = (0..50).map(|i| format!("hosts.h{i}.cpu")).collect();

    thread::scope(|scope| {
        for _ in 0..4 {
            let engine = Arc::clone(&engine);
            let paths = &paths;
            scope.spawn(move || {
                for _ in 0..20 {
                    for path in paths {
                        let matches = engine.evaluate(path);
                        assert!(matches.len() <= 1);
                    }
                }
            });
        }
        let engine = Arc::clone(&engine);
        scope.spawn(move || {
            for version in 1..=10 {
                let line = format!("v{version}.<h> (60) = sum hosts.<h>.cpu");
                engine.install(rule_set(&[line.as_str()]));
            }
        });
    });

    for path in &paths {
        let matches = engine.evaluate(path);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].output.starts_with("v10."), "stale output {}", matches[0].output);
    }
}

#[test]
fn options_from_config() {
    let config = RulesConfig {
        cache_size: NonZeroUsize::new(500),
        full_match: true,
        skip_invalid_lines: true,
        reload_interval_secs: 30,
        ..RulesConfig::default()
    };
    let options = EngineOptions::from_config(&config);
    assert_eq!(options.cache_size, NonZeroUsize::new(500));
    assert_eq!(options.match_mode, MatchMode::Full);
    assert_eq!(options.invalid_lines, InvalidLinePolicy::SkipLine);
    assert_eq!(options.reload_interval, Duration::from_secs(30));
}
