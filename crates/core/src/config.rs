use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

/// Default location of the aggregation rules file.
pub const DEFAULT_RULES_FILE: &str = "conf/aggregation-rules.conf";

/// Default interval between rules file polls, in seconds.
pub const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 10;

/// Parse a rules cache size setting.
///
/// `inf`, `infinity`, an empty string and `0` all mean "unbounded" and yield
/// `None`. Values that are not a non-negative integer also fall back to
/// unbounded, with a warning.
pub fn parse_cache_size(raw: &str) -> Option<NonZeroUsize> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("inf")
        || trimmed.eq_ignore_ascii_case("infinity")
    {
        return None;
    }
    match trimmed.parse::<usize>() {
        Ok(n) => NonZeroUsize::new(n),
        Err(_) => {
            tracing::warn!(value = %trimmed, "invalid rules cache size, using an unbounded cache");
            None
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    pub rules: RulesConfig,
}

impl AggregatorConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ROLLUP_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("ROLLUP_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            rules: RulesConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:       file={}", self.rules.rules_file.display());
        tracing::info!(
            "  cache:       max_size={}",
            self.rules
                .cache_size
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        );
        tracing::info!(
            "  reload:      interval={}s, full_match={}, skip_invalid={}",
            self.rules.reload_interval_secs,
            self.rules.full_match,
            self.rules.skip_invalid_lines
        );
    }

    /// Return a JSON view of the config for diagnostics output.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "rules": {
                "file": self.rules.rules_file,
                "cache_size": self.rules.cache_size,
                "reload_interval_secs": self.rules.reload_interval_secs,
                "full_match": self.rules.full_match,
                "skip_invalid_lines": self.rules.skip_invalid_lines,
            },
        })
    }
}

// ── Aggregation rules ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    pub rules_file: PathBuf,
    /// Maximum number of cached metric paths; `None` = unbounded.
    pub cache_size: Option<NonZeroUsize>,
    pub reload_interval_secs: u64,
    /// Require patterns to consume the whole metric path.
    pub full_match: bool,
    /// Skip malformed rule lines instead of rejecting the whole reload.
    pub skip_invalid_lines: bool,
}

impl RulesConfig {
    fn from_env_profiled(p: &str) -> Self {
        let reload_interval_secs =
            profiled_env_u64(p, "AGGREGATION_RULES_RELOAD_INTERVAL", DEFAULT_RELOAD_INTERVAL_SECS);
        Self {
            rules_file: PathBuf::from(profiled_env_or(p, "AGGREGATION_RULES", DEFAULT_RULES_FILE)),
            cache_size: parse_cache_size(&profiled_env_or(p, "AGGREGATION_RULES_CACHE_SIZE", "inf")),
            reload_interval_secs: reload_interval_secs.max(1),
            full_match: profiled_env_bool(p, "AGGREGATION_RULES_FULL_MATCH", false),
            skip_invalid_lines: profiled_env_bool(p, "AGGREGATION_RULES_SKIP_INVALID", false),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            rules_file: PathBuf::from(DEFAULT_RULES_FILE),
            cache_size: None,
            reload_interval_secs: DEFAULT_RELOAD_INTERVAL_SECS,
            full_match: false,
            skip_invalid_lines: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_size_sentinels_are_unbounded() {
        assert_eq!(parse_cache_size("inf"), None);
        assert_eq!(parse_cache_size("Infinity"), None);
        assert_eq!(parse_cache_size(""), None);
        assert_eq!(parse_cache_size("0"), None);
    }

    #[test]
    fn cache_size_parses_positive_integers() {
        assert_eq!(parse_cache_size("1000"), NonZeroUsize::new(1000));
        assert_eq!(parse_cache_size(" 5 "), NonZeroUsize::new(5));
    }

    #[test]
    fn invalid_cache_size_falls_back_to_unbounded() {
        assert_eq!(parse_cache_size("lots"), None);
        assert_eq!(parse_cache_size("-3"), None);
    }

    #[test]
    fn profile_prefix_wins_over_plain_key() {
        env::set_var("ROLLUPTEST_AGGREGATION_RULES", "/etc/prod-rules.conf");
        env::set_var("ROLLUPTEST_AGGREGATION_RULES_CACHE_SIZE", "250");
        let config = AggregatorConfig::for_profile("rolluptest");
        assert_eq!(config.profile_label(), "ROLLUPTEST");
        assert_eq!(config.rules.rules_file, PathBuf::from("/etc/prod-rules.conf"));
        assert_eq!(config.rules.cache_size, NonZeroUsize::new(250));
        env::remove_var("ROLLUPTEST_AGGREGATION_RULES");
        env::remove_var("ROLLUPTEST_AGGREGATION_RULES_CACHE_SIZE");
    }

    #[test]
    fn summary_reports_unbounded_cache_as_null() {
        let config = AggregatorConfig {
            profile: String::new(),
            rules: RulesConfig::default(),
        };
        let summary = config.summary();
        assert_eq!(summary["profile"], "default");
        assert!(summary["rules"]["cache_size"].is_null());
        assert_eq!(summary["rules"]["reload_interval_secs"], 10);
    }
}
