//! State types for the last applied snapshot.
//!
//! The snapshot is the differ's baseline: every resolved app as it was last
//! written to disk, plus a short history of apply runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::translator::ResolvedApp;

/// Current version of the state format.
pub const STATE_VERSION: &str = "1.0";

/// History entries kept in the snapshot.
const MAX_HISTORY: usize = 100;

/// The complete applied state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyState {
    /// State format version.
    pub version: String,
    /// Cluster name.
    pub cluster: String,
    /// Hash of the last applied configuration file.
    pub config_hash: String,
    /// Resolved apps as last applied.
    pub apps: BTreeMap<String, ResolvedApp>,
    /// When the state was last updated.
    pub last_updated: DateTime<Utc>,
    /// Apply history, oldest first.
    #[serde(default)]
    pub history: Vec<ApplyHistoryEntry>,
}

/// A single entry in the apply history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyHistoryEntry {
    /// When the apply ran.
    pub timestamp: DateTime<Utc>,
    /// Configuration hash at the time.
    pub config_hash: String,
    /// Apps created.
    #[serde(default)]
    pub created: Vec<String>,
    /// Apps updated.
    #[serde(default)]
    pub updated: Vec<String>,
    /// Apps deleted.
    #[serde(default)]
    pub deleted: Vec<String>,
    /// Whether the apply succeeded.
    pub success: bool,
    /// Optional error message.
    #[serde(default)]
    pub error: Option<String>,
}

impl ApplyState {
    /// Creates a new empty state.
    #[must_use]
    pub fn new(cluster: &str) -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            cluster: cluster.to_string(),
            config_hash: String::new(),
            apps: BTreeMap::new(),
            last_updated: Utc::now(),
            history: Vec::new(),
        }
    }

    /// Replaces the applied snapshot.
    pub fn set_apps(&mut self, apps: BTreeMap<String, ResolvedApp>, config_hash: &str) {
        self.apps = apps;
        config_hash.clone_into(&mut self.config_hash);
        self.last_updated = Utc::now();
    }

    /// Adds a history entry, dropping the oldest beyond the limit.
    pub fn add_history(&mut self, entry: ApplyHistoryEntry) {
        if self.history.len() >= MAX_HISTORY {
            self.history.remove(0);
        }
        self.history.push(entry);
    }
}

impl ApplyHistoryEntry {
    /// Creates a successful history entry.
    #[must_use]
    pub fn new(
        config_hash: &str,
        created: Vec<String>,
        updated: Vec<String>,
        deleted: Vec<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            config_hash: config_hash.to_string(),
            created,
            updated,
            deleted,
            success: true,
            error: None,
        }
    }

    /// Creates a failed history entry.
    #[must_use]
    pub fn failed(config_hash: &str, error: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            config_hash: config_hash.to_string(),
            created: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
            success: false,
            error: Some(error.to_string()),
        }
    }

    /// Total number of apps touched.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded() {
        let mut state = ApplyState::new("firefly");
        for i in 0..(MAX_HISTORY + 5) {
            state.add_history(ApplyHistoryEntry::new(&i.to_string(), vec![], vec![], vec![]));
        }

        assert_eq!(state.history.len(), MAX_HISTORY);
        assert_eq!(state.history[0].config_hash, "5");
    }

    #[test]
    fn test_failed_entry() {
        let entry = ApplyHistoryEntry::failed("abc", "disk full");
        assert!(!entry.success);
        assert_eq!(entry.change_count(), 0);
        assert_eq!(entry.error.as_deref(), Some("disk full"));
    }
}
