//! Modification-time tracking for the rules file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sha2::{Digest, Sha256};

/// Result of checking the rules file before reading it.
#[derive(Debug)]
pub(crate) enum Poll {
    Missing,
    StatFailed(io::Error),
    Unchanged,
    Modified(SystemTime),
}

/// A file version rejected for malformed lines.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rejection {
    mtime: SystemTime,
    /// SHA-256 hex digest of the rejected contents.
    digest: String,
}

impl Rejection {
    fn new(mtime: SystemTime, contents: &str) -> Self {
        Self {
            mtime,
            digest: content_digest(contents),
        }
    }
}

fn content_digest(contents: &str) -> String {
    let digest = Sha256::digest(contents.as_bytes());
    format!("{digest:x}")
}

/// Loader state: where the rules live and which version was last applied.
#[derive(Debug, Default)]
pub(crate) struct RuleSource {
    path: Option<PathBuf>,
    /// Modification time of the last successfully applied file.
    last_loaded: Option<SystemTime>,
    /// The last file version rejected for malformed lines.
    last_rejected: Option<Rejection>,
}

impl RuleSource {
    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Point at a new file; forgets everything known about the previous one.
    pub(crate) fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
        self.last_loaded = None;
        self.last_rejected = None;
    }

    pub(crate) fn last_loaded(&self) -> Option<SystemTime> {
        self.last_loaded
    }

    /// Check whether `path` holds a version that has not been seen yet.
    pub(crate) fn poll(&self, path: &Path) -> Poll {
        if !path.exists() {
            return Poll::Missing;
        }
        let mtime = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => return Poll::StatFailed(e),
        };
        if self.last_loaded.is_some_and(|loaded| mtime <= loaded) {
            return Poll::Unchanged;
        }
        Poll::Modified(mtime)
    }

    pub(crate) fn mark_loaded(&mut self, mtime: SystemTime) {
        self.last_loaded = Some(mtime);
        self.last_rejected = None;
    }

    /// Whether `contents` at `mtime` is exactly the version rejected last time.
    ///
    /// Contents are compared too, since a fix written within the same mtime
    /// tick must still be picked up.
    pub(crate) fn is_rejected(&self, mtime: SystemTime, contents: &str) -> bool {
        self.last_rejected
            .as_ref()
            .is_some_and(|r| r.mtime == mtime && r.digest == content_digest(contents))
    }

    pub(crate) fn mark_rejected(&mut self, mtime: SystemTime, contents: &str) {
        self.last_rejected = Some(Rejection::new(mtime, contents));
    }

    /// The file disappeared: the next file that shows up is loaded regardless of age.
    pub(crate) fn mark_missing(&mut self) {
        self.last_loaded = None;
        self.last_rejected = None;
    }
}
