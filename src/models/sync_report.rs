use serde::{Deserialize, Serialize};

/// Why a path was skipped during a reconcile run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// File exists but could not be decoded as an image.
    Unreadable,
    /// File disappeared between enumeration and extraction.
    Vanished,
    /// Directory walk could not enter the path (permissions, broken links).
    Inaccessible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFailure {
    pub path: String,
    pub kind: FailureKind,
}

/// Outcome of one reconcile run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn record_failure(&mut self, path: impl Into<String>, kind: FailureKind) {
        self.failed.push(SyncFailure {
            path: path.into(),
            kind,
        });
    }

    pub fn summary(&self) -> String {
        format!(
            "added {}, removed {}, failed {}",
            self.added,
            self.removed,
            self.failed.len()
        )
    }
}
