//! Diff engine for comparing previously applied and desired trees.
//!
//! Both sides are complete `name → ResolvedApp` snapshots. Trees are compared
//! with value equality: sequences are order-sensitive, mapping key order is
//! irrelevant.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::ConfigHasher;
use crate::translator::ResolvedApp;

/// Engine for computing diffs between applied and desired state.
#[derive(Debug, Default)]
pub struct DiffEngine {
    /// Configuration hasher.
    hasher: ConfigHasher,
}

/// Difference for a single application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    /// Application name.
    pub name: String,
    /// Type of difference.
    pub diff_type: DiffType,
    /// Top-level keys whose value differs (updates only), sorted.
    pub changed_fields: Vec<String>,
    /// Hash of the previous tree, if any.
    pub old_hash: Option<String>,
    /// Hash of the desired tree, if any.
    pub new_hash: Option<String>,
}

/// Type of difference detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffType {
    /// Application is new.
    Create,
    /// Application exists and changed.
    Update,
    /// Application was removed from configuration.
    Delete,
    /// Application is unchanged.
    Unchanged,
}

/// Complete diff result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiffResult {
    /// All entries, sorted by application name.
    pub diffs: Vec<DiffEntry>,
    /// Number of applications to create.
    pub creates: usize,
    /// Number of applications to update.
    pub updates: usize,
    /// Number of applications to delete.
    pub deletes: usize,
    /// Number of unchanged applications.
    pub unchanged: usize,
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hasher: ConfigHasher::new(),
        }
    }

    /// Computes the diff between the previous snapshot and the desired one.
    #[must_use]
    pub fn compute_diff(
        &self,
        previous: &BTreeMap<String, ResolvedApp>,
        desired: &BTreeMap<String, ResolvedApp>,
    ) -> DiffResult {
        let names: BTreeSet<&String> = previous.keys().chain(desired.keys()).collect();

        let diffs: Vec<DiffEntry> = names
            .into_iter()
            .map(|name| self.compute_app_diff(name, previous.get(name), desired.get(name)))
            .collect();

        let count = |kind: DiffType| diffs.iter().filter(|d| d.diff_type == kind).count();
        let creates = count(DiffType::Create);
        let updates = count(DiffType::Update);
        let deletes = count(DiffType::Delete);
        let unchanged = count(DiffType::Unchanged);

        DiffResult {
            diffs,
            creates,
            updates,
            deletes,
            unchanged,
        }
    }

    fn compute_app_diff(
        &self,
        name: &str,
        old: Option<&ResolvedApp>,
        new: Option<&ResolvedApp>,
    ) -> DiffEntry {
        let old_hash = old.map(|app| self.hasher.hash_value(&app.values));
        let new_hash = new.map(|app| self.hasher.hash_value(&app.values));

        let (diff_type, changed_fields) = match (old, new) {
            (None, _) => {
                debug!("App {name} needs to be created");
                (DiffType::Create, Vec::new())
            }
            (Some(_), None) => {
                debug!("App {name} was removed from configuration");
                (DiffType::Delete, Vec::new())
            }
            (Some(old), Some(new)) if old.values == new.values => {
                debug!("App {name} is up to date");
                (DiffType::Unchanged, Vec::new())
            }
            (Some(old), Some(new)) => {
                let fields = changed_fields(&old.values, &new.values);
                debug!("App {name} changed: {}", fields.join(", "));
                (DiffType::Update, fields)
            }
        };

        DiffEntry {
            name: name.to_string(),
            diff_type,
            changed_fields,
            old_hash,
            new_hash,
        }
    }
}

/// Lists the top-level keys whose values differ between two trees.
#[must_use]
pub fn changed_fields(old: &Value, new: &Value) -> Vec<String> {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let keys: BTreeSet<&String> = old_map.keys().chain(new_map.keys()).collect();
            keys.into_iter()
                .filter(|key| old_map.get(*key) != new_map.get(*key))
                .cloned()
                .collect()
        }
        _ if old == new => Vec::new(),
        _ => vec![String::from("values")],
    }
}

impl DiffResult {
    /// Returns true if there are any changes.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }

    /// Returns the total number of changes.
    #[must_use]
    pub const fn total_changes(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    /// Filters to only entries that require action.
    #[must_use]
    pub fn actionable_diffs(&self) -> Vec<&DiffEntry> {
        self.diffs
            .iter()
            .filter(|d| d.diff_type != DiffType::Unchanged)
            .collect()
    }
}

impl std::fmt::Display for DiffType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Unchanged => "no change",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.diff_type)?;
        if !self.changed_fields.is_empty() {
            write!(f, " ({})", self.changed_fields.join(", "))?;
        }
        Ok(())
    }
}
