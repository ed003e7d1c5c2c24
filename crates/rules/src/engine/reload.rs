//! Rules file reloading for [`RuleEngine`].

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::loader::{parse_rules, InvalidLinePolicy, Poll, ReloadOutcome};
use crate::scheduler::ReloadTask;

use super::{RuleEngine, RuleSet};

impl RuleEngine {
    /// Use `path` as the rules file, load it now, and keep polling it.
    ///
    /// Must be called from within a tokio runtime. The first poll happens one
    /// reload interval after this call.
    pub fn read_from(self: &Arc<Self>, path: impl Into<PathBuf>) -> ReloadTask {
        self.set_source(path);
        self.read_rules();
        ReloadTask::spawn(Arc::clone(self), self.options.reload_interval)
    }

    /// Use `path` as the rules file without loading it.
    pub fn set_source(&self, path: impl Into<PathBuf>) {
        self.source
            .lock()
            .expect("rule source lock poisoned")
            .set_path(path.into());
    }

    /// Reload the rules file if it changed since the last successful load.
    pub fn read_rules(&self) -> ReloadOutcome {
        let mut source = self.source.lock().expect("rule source lock poisoned");
        let Some(path) = source.path().map(PathBuf::from) else {
            return ReloadOutcome::NoSource;
        };

        let mtime = match source.poll(&path) {
            Poll::Missing => {
                if !self.rules().is_empty() || self.cache_len() > 0 {
                    info!(path = %path.display(), "aggregation rules file missing, clearing rules");
                }
                self.clear();
                source.mark_missing();
                return ReloadOutcome::Missing;
            }
            Poll::StatFailed(e) => {
                warn!(path = %path.display(), error = %e, "failed to get mtime of aggregation rules file");
                return ReloadOutcome::StatFailed {
                    error: e.to_string(),
                };
            }
            Poll::Unchanged => return ReloadOutcome::Unchanged,
            Poll::Modified(mtime) => mtime,
        };

        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read aggregation rules file");
                return ReloadOutcome::ReadFailed {
                    error: e.to_string(),
                };
            }
        };
        if source.is_rejected(mtime, &contents) {
            debug!(path = %path.display(), "aggregation rules file still invalid, waiting for a change");
            return ReloadOutcome::PreviouslyRejected;
        }

        info!(path = %path.display(), "reading new aggregation rules");

        let report = parse_rules(&contents, &self.methods, self.options.match_mode);
        for diag in &report.diagnostics {
            warn!(
                path = %path.display(),
                line = diag.line,
                text = %diag.text,
                error = %diag.error,
                "failed to parse aggregation rule"
            );
        }

        if !report.is_clean() && self.options.invalid_lines == InvalidLinePolicy::RejectReload {
            warn!(
                path = %path.display(),
                errors = report.diagnostics.len(),
                "rejecting aggregation rules file, keeping previous rules"
            );
            source.mark_rejected(mtime, &contents);
            return ReloadOutcome::Rejected {
                diagnostics: report.diagnostics,
            };
        }

        info!("clearing aggregation buffers");
        self.buffers.clear();

        let count = report.rules.len();
        self.install(RuleSet::new(report.rules));
        source.mark_loaded(mtime);

        info!(
            path = %path.display(),
            rules = count,
            skipped = report.diagnostics.len(),
            modified = %DateTime::<Utc>::from(mtime),
            "loaded aggregation rules"
        );
        ReloadOutcome::Reloaded {
            rules: count,
            skipped: report.diagnostics,
        }
    }
}
