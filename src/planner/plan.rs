//! Plan reports.
//!
//! A [`PlanReport`] bundles one run over the configuration: translation,
//! diff against the previously applied snapshot, and capacity analysis. It
//! also turns the diff into the manifest actions `apply` performs and decides
//! the process exit status.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::info;

use crate::config::{ConfigHasher, ManiforgeConfig, Platform};
use crate::error::AppError;
use crate::translator::{ResolvedApp, Translator};

use super::capacity::{CapacityAnalysis, CapacityPlanner};
use super::diff::{DiffEngine, DiffResult, DiffType};

/// Everything one planning run produced.
#[derive(Debug)]
pub struct PlanReport {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Hash of the configuration file this plan is based on.
    pub config_hash: String,
    /// Apps that resolved.
    pub resolved: BTreeMap<String, ResolvedApp>,
    /// Per-app translation errors.
    pub translation_errors: Vec<AppError>,
    /// Diff against the previous snapshot.
    pub diff: DiffResult,
    /// Capacity analysis over the resolved apps.
    pub capacity: CapacityAnalysis,
}

/// Outcome class of a plan, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    /// No errors and nothing to change.
    Clean,
    /// No errors, but changes are pending.
    Changes,
    /// Translation or capacity errors.
    Failed,
}

/// A single manifest action derived from the diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    /// Action type.
    pub action_type: ActionType,
    /// Application name.
    pub app: String,
    /// Reason for this action.
    pub reason: String,
}

/// Types of manifest actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    /// Write manifests for a new or changed app.
    Write,
    /// Remove the manifests of a deleted app.
    Remove,
}

impl PlanReport {
    /// Translates, diffs and analyzes capacity in one pass.
    ///
    /// Apps that fail to translate are dropped from both sides of the diff,
    /// so a broken declaration never shows up as a deletion.
    #[must_use]
    pub fn build(
        config: &ManiforgeConfig,
        platform: &Platform,
        previous: &BTreeMap<String, ResolvedApp>,
    ) -> Self {
        let outcome = Translator::new(platform).translate_all(&config.apps);

        let baseline: BTreeMap<String, ResolvedApp> = previous
            .iter()
            .filter(|(name, _)| !outcome.errors.iter().any(|e| &e.app == *name))
            .map(|(name, app)| (name.clone(), app.clone()))
            .collect();

        let diff = DiffEngine::new().compute_diff(&baseline, &outcome.resolved);
        let capacity = CapacityPlanner::new(platform.node_groups()).analyze(&outcome.resolved);

        info!(
            "Plan: {} to create, {} to update, {} to delete, {} unchanged",
            diff.creates, diff.updates, diff.deletes, diff.unchanged
        );

        Self {
            created_at: Utc::now(),
            config_hash: ConfigHasher::new().hash_config(config),
            resolved: outcome.resolved,
            translation_errors: outcome.errors,
            diff,
            capacity,
        }
    }

    /// Returns true when translation or capacity analysis reported errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.translation_errors.is_empty() || !self.capacity.is_success()
    }

    /// Returns every error as display text, translation errors first.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.translation_errors
            .iter()
            .map(ToString::to_string)
            .chain(self.capacity.errors.iter().map(ToString::to_string))
            .collect()
    }

    /// Classifies the plan.
    #[must_use]
    pub fn status(&self) -> PlanStatus {
        if self.has_errors() {
            PlanStatus::Failed
        } else if self.diff.has_changes() {
            PlanStatus::Changes
        } else {
            PlanStatus::Clean
        }
    }

    /// Converts the diff into manifest actions: removals first, then writes.
    #[must_use]
    pub fn actions(&self) -> Vec<PlannedAction> {
        let removals = self
            .diff
            .diffs
            .iter()
            .filter(|d| d.diff_type == DiffType::Delete)
            .map(|d| PlannedAction {
                action_type: ActionType::Remove,
                app: d.name.clone(),
                reason: String::from("App removed from configuration"),
            });

        let writes = self
            .diff
            .diffs
            .iter()
            .filter(|d| matches!(d.diff_type, DiffType::Create | DiffType::Update))
            .map(|d| PlannedAction {
                action_type: ActionType::Write,
                app: d.name.clone(),
                reason: if d.diff_type == DiffType::Create {
                    String::from("App defined in configuration")
                } else {
                    format!("Changed: {}", d.changed_fields.join(", "))
                },
            });

        removals.chain(writes).collect()
    }

    /// Returns true if the plan has nothing to do.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.diff.has_changes()
    }
}

impl PlanStatus {
    /// Exit status for `plan`: 0 clean, 2 changes pending, 1 errors.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::Changes => 2,
            Self::Failed => 1,
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Write => "write",
            Self::Remove => "remove",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.action_type, self.app)?;
        if !self.reason.is_empty() {
            write!(f, " ({})", self.reason)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for PlanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let actions = self.actions();
        if actions.is_empty() {
            return write!(f, "No changes required");
        }

        writeln!(f, "Plan ({} actions):", actions.len())?;
        for (i, action) in actions.iter().enumerate() {
            writeln!(f, "  {i}. {action}")?;
        }
        Ok(())
    }
}
