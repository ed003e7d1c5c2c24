//! Integration tests for the background reload task.

use std::fs::{self, File};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tempfile::TempDir;

use rollup_rules::{EngineOptions, MethodRegistry, RuleEngine};

fn write_rules(path: &Path, contents: &str, secs: u64) {
    fs::write(path, contents).unwrap();
    let mtime: SystemTime = UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

fn outputs(engine: &RuleEngine, path: &str) -> Vec<String> {
    engine.evaluate(path).iter().map(|m| m.output.clone()).collect()
}

fn fast_engine(clears: Arc<AtomicUsize>) -> Arc<RuleEngine> {
    let options = EngineOptions {
        reload_interval: Duration::from_millis(50),
        ..EngineOptions::default()
    };
    Arc::new(RuleEngine::new(
        options,
        MethodRegistry::default(),
        Arc::new(move || {
            clears.fetch_add(1, Ordering::SeqCst);
        }),
    ))
}

async fn wait_for(engine: &RuleEngine, path: &str, expected: &[&str]) -> bool {
    for _ in 0..100 {
        if outputs(engine, path) == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_from_loads_immediately_and_follows_changes() {
    let dir = TempDir::new().unwrap();
    let rules = dir.path().join("aggregation-rules.conf");
    write_rules(&rules, "old.<env> (60) = sum servers.<env>.cpu\n", 0);

    let clears = Arc::new(AtomicUsize::new(0));
    let engine = fast_engine(Arc::clone(&clears));
    let task = engine.read_from(&rules);

    assert_eq!(outputs(&engine, "servers.prod.cpu"), vec!["old.prod"]);
    assert_eq!(clears.load(Ordering::SeqCst), 1);

    write_rules(&rules, "new.<env> (60) = avg servers.<env>.cpu\n", 10);
    assert!(wait_for(&engine, "servers.prod.cpu", &["new.prod"]).await);
    assert_eq!(clears.load(Ordering::SeqCst), 2);

    fs::remove_file(&rules).unwrap();
    assert!(wait_for(&engine, "servers.prod.cpu", &[]).await);
    assert!(engine.rules().is_empty());

    task.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stopped_task_no_longer_reloads() {
    let dir = TempDir::new().unwrap();
    let rules = dir.path().join("aggregation-rules.conf");
    write_rules(&rules, "old.<env> (60) = sum servers.<env>.cpu\n", 0);

    let engine = fast_engine(Arc::new(AtomicUsize::new(0)));
    let task = engine.read_from(&rules);
    task.shutdown().await;

    write_rules(&rules, "new.<env> (60) = sum servers.<env>.cpu\n", 10);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(outputs(&engine, "servers.prod.cpu"), vec!["old.prod"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_source_at_startup_yields_no_matches() {
    let dir = TempDir::new().unwrap();
    let engine = fast_engine(Arc::new(AtomicUsize::new(0)));
    let task = engine.read_from(dir.path().join("absent.conf"));

    for path in ["servers.prod.cpu", "", "a.b.c.d"] {
        assert!(engine.evaluate(path).is_empty());
    }
    assert!(!task.is_finished());
    task.shutdown().await;
}
