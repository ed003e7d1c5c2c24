//! aggregate-names — resolve metric paths to their aggregated output names.
//!
//! Reads metric paths from stdin, one per line, and prints every aggregation
//! rule that applies:
//!
//! ```text
//! <metric>\t<output>\t<method>\t<frequency>
//! ```
//!
//! The rules file is polled in the background while stdin stays open, so
//! edits take effect without a restart.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use rollup_core::config::{self, AggregatorConfig};
use rollup_rules::{EngineOptions, MethodRegistry, NoBuffers, RuleDefinition, RuleEngine};

// ── CLI ─────────────────────────────────────────────────────────────

/// Resolve metric paths against aggregation rules.
#[derive(Parser, Debug)]
#[command(name = "aggregate-names", version, about)]
struct Cli {
    /// Path to the aggregation rules file (defaults to AGGREGATION_RULES or the built-in default).
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Maximum cached metric paths; `inf` or 0 for unbounded.
    #[arg(long)]
    cache_size: Option<String>,

    /// Rules file poll interval in seconds.
    #[arg(long)]
    reload_interval: Option<u64>,

    /// Require patterns to match the whole metric path.
    #[arg(long)]
    full_match: bool,

    /// Skip malformed rule lines instead of rejecting the file.
    #[arg(long)]
    skip_invalid: bool,

    /// Print the loaded rules as JSON and exit.
    #[arg(long)]
    list: bool,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    show_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut AggregatorConfig) {
        if let Some(path) = &self.rules {
            config.rules.rules_file = path.clone();
        }
        if let Some(raw) = &self.cache_size {
            config.rules.cache_size = config::parse_cache_size(raw);
        }
        if let Some(secs) = self.reload_interval {
            config.rules.reload_interval_secs = secs.max(1);
        }
        config.rules.full_match |= self.full_match;
        config.rules.skip_invalid_lines |= self.skip_invalid;
    }
}

fn cache_label(size: Option<NonZeroUsize>) -> String {
    size.map(|n| n.to_string())
        .unwrap_or_else(|| "unbounded".to_string())
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    config::load_dotenv();
    let cli = Cli::parse();

    let mut config = AggregatorConfig::from_env();
    cli.apply(&mut config);

    if cli.show_config {
        println!("{}", serde_json::to_string_pretty(&config.summary())?);
        return Ok(());
    }
    config.log_summary();

    let options = EngineOptions::from_config(&config.rules);
    let engine = Arc::new(RuleEngine::new(
        options,
        MethodRegistry::default(),
        Arc::new(NoBuffers),
    ));

    if cli.list {
        engine.set_source(&config.rules.rules_file);
        let outcome = engine.read_rules();
        if !outcome.is_reloaded() {
            warn!(?outcome, "no rules loaded");
        }
        let rules = engine.rules();
        let definitions: Vec<&RuleDefinition> = rules.iter().map(|r| r.definition()).collect();
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    let task = engine.read_from(&config.rules.rules_file);
    match engine.rules().len() {
        0 => warn!(path = %config.rules.rules_file.display(), "no aggregation rules active"),
        n => info!(rules = n, cache = %cache_label(config.rules.cache_size), "aggregation rules active"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut resolved = 0usize;

    while let Some(line) = lines.next_line().await? {
        let metric = line.trim();
        if metric.is_empty() {
            continue;
        }
        for m in engine.evaluate(metric).iter() {
            let row = format!(
                "{}\t{}\t{}\t{}\n",
                metric,
                m.output,
                m.rule.method(),
                m.rule.frequency()
            );
            stdout.write_all(row.as_bytes()).await?;
            resolved += 1;
        }
    }
    stdout.flush().await?;

    match tokio::time::timeout(Duration::from_secs(5), task.shutdown()).await {
        Ok(()) => {}
        Err(_) => warn!("timed out waiting for reload task to stop"),
    }

    info!(resolved, cached = engine.cache_len(), "aggregate-names exited cleanly");
    Ok(())
}
