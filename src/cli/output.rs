//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{ConfigHasher, ManiforgeConfig, ValidationResult};
use crate::planner::{
    CapacityAnalysis, CapacityReport, DiffEntry, DiffType, HeadroomStatus, PlanReport,
};
use crate::state::ApplyHistoryEntry;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan change row for table display.
#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "App")]
    app: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

/// Node group row for table display.
#[derive(Tabled)]
struct CapacityRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Nodes")]
    nodes: u32,
    #[tabled(rename = "CPU req/lim/total")]
    cpu: String,
    #[tabled(rename = "Memory req/lim/total")]
    memory: String,
    #[tabled(rename = "CPU %")]
    cpu_percent: String,
    #[tabled(rename = "Mem %")]
    memory_percent: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Per-app demand row for table display.
#[derive(Tabled)]
struct DemandRow {
    #[tabled(rename = "App")]
    app: String,
    #[tabled(rename = "CPU req")]
    cpu_request: String,
    #[tabled(rename = "CPU lim")]
    cpu_limit: String,
    #[tabled(rename = "Mem req")]
    memory_request: String,
    #[tabled(rename = "Mem lim")]
    memory_limit: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(
        &self,
        result: &ValidationResult,
        config: &ManiforgeConfig,
        show_warnings: bool,
    ) -> String {
        match self.format {
            OutputFormat::Json => to_json(&ValidationJson {
                valid: result.is_valid(),
                errors: result.errors.iter().map(ToString::to_string).collect(),
                warnings: result.warnings.clone(),
                apps: config.apps.len(),
                nodes: config.nodes.len(),
            }),
            OutputFormat::Text => {
                let mut output = String::new();

                if result.is_valid() {
                    let _ = writeln!(output, "{} Configuration is valid", "✓".green());
                } else {
                    let _ = writeln!(
                        output,
                        "{} {} error(s) found:",
                        "✗".red(),
                        result.error_count()
                    );
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                }

                if show_warnings && !result.warnings.is_empty() {
                    let _ = writeln!(output, "\n{} Warnings:", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                let _ = writeln!(output, "\nConfiguration summary:");
                let _ = writeln!(output, "   Cluster: {}", config.cluster.name);
                let _ = writeln!(output, "   Apps: {}", config.apps.len());
                let _ = writeln!(output, "   Node groups: {}", config.nodes.len());

                output
            }
        }
    }

    /// Formats a plan report for display.
    #[must_use]
    pub fn format_plan(&self, report: &PlanReport, detailed: bool) -> String {
        match self.format {
            OutputFormat::Json => to_json(&PlanJson::from(report)),
            OutputFormat::Text => Self::format_plan_text(report, detailed),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(report: &PlanReport, detailed: bool) -> String {
        let mut output = String::new();

        Self::write_errors(&mut output, &report.error_messages());

        if report.is_empty() {
            let _ = writeln!(
                output,
                "{} No changes required - manifests are up to date.",
                "✓".green()
            );
        } else {
            let _ = writeln!(output, "\nPlan");
            let _ = writeln!(
                output,
                "   Config hash: {}\n",
                ConfigHasher::new().short_hash(&report.config_hash)
            );

            let rows: Vec<ChangeRow> = report
                .diff
                .actionable_diffs()
                .into_iter()
                .enumerate()
                .map(|(i, d)| ChangeRow {
                    index: i + 1,
                    change: Self::format_diff_type(d.diff_type),
                    app: d.name.clone(),
                    fields: d.changed_fields.join(", "),
                })
                .collect();

            output.push_str(&Table::new(rows).to_string());
            output.push('\n');

            let _ = writeln!(
                output,
                "\nPlan: {} to create, {} to update, {} to delete, {} unchanged",
                report.diff.creates.to_string().green(),
                report.diff.updates.to_string().yellow(),
                report.diff.deletes.to_string().red(),
                report.diff.unchanged
            );
        }

        if detailed {
            let _ = writeln!(output, "\nDetails:");
            for entry in &report.diff.diffs {
                let _ = writeln!(output, "   {}", Self::format_entry_hashes(entry));
            }
        }

        let over: Vec<&str> = report
            .capacity
            .reports
            .values()
            .filter(|r| r.over_capacity)
            .map(|r| r.group.as_str())
            .collect();
        if !over.is_empty() {
            let _ = writeln!(
                output,
                "\n{} Limits exceed capacity on: {}",
                "⚠".yellow(),
                over.join(", ")
            );
        }

        output
    }

    /// Formats a capacity analysis.
    #[must_use]
    pub fn format_capacity(&self, analysis: &CapacityAnalysis, detailed: bool) -> String {
        match self.format {
            OutputFormat::Json => to_json(&CapacityJson::from(analysis)),
            OutputFormat::Text => {
                let mut output = String::new();

                let errors: Vec<String> = analysis.errors.iter().map(ToString::to_string).collect();
                Self::write_errors(&mut output, &errors);

                if analysis.reports.is_empty() {
                    output.push_str("No node groups declared.\n");
                    return output;
                }

                let rows: Vec<CapacityRow> = analysis.reports.values().map(Self::capacity_row).collect();
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');

                if detailed {
                    for report in analysis.reports.values().filter(|r| r.has_demand()) {
                        let _ = writeln!(output, "\n{}:", report.group.bold());
                        let rows: Vec<DemandRow> = report
                            .apps
                            .iter()
                            .map(|app| DemandRow {
                                app: if app.has_profile {
                                    app.name.clone()
                                } else {
                                    format!("{} (no profile)", app.name)
                                },
                                cpu_request: app.cpu_request.to_human(),
                                cpu_limit: app.cpu_limit.to_human(),
                                memory_request: app.memory_request.to_human(),
                                memory_limit: app.memory_limit.to_human(),
                            })
                            .collect();
                        output.push_str(&Table::new(rows).to_string());
                        output.push('\n');
                    }
                }

                if !analysis.unassigned.is_empty() {
                    let _ = writeln!(
                        output,
                        "\nNot scheduled onto a node group: {}",
                        analysis.unassigned.join(", ")
                    );
                }

                output
            }
        }
    }

    /// Formats the outcome of an apply.
    #[must_use]
    pub fn format_apply(&self, entry: &ApplyHistoryEntry) -> String {
        match self.format {
            OutputFormat::Json => to_json(entry),
            OutputFormat::Text => {
                let status = if entry.success {
                    format!("{} Apply complete", "✓".green())
                } else {
                    format!("{} Apply failed", "✗".red())
                };

                let mut output = format!("{status}\n\n");
                let _ = writeln!(output, "   Created: {}", entry.created.len());
                let _ = writeln!(output, "   Updated: {}", entry.updated.len());
                let _ = writeln!(output, "   Deleted: {}", entry.deleted.len());
                let _ = writeln!(output, "   Total:   {}", entry.change_count());

                if let Some(error) = &entry.error {
                    let _ = writeln!(output, "\n{} {error}", "⚠".yellow());
                }

                output
            }
        }
    }

    fn capacity_row(report: &CapacityReport) -> CapacityRow {
        let percent = |value: Option<f64>| value.map_or_else(|| String::from("n/a"), |p| format!("{p:.1}%"));

        CapacityRow {
            group: report.group.clone(),
            nodes: report.node_count,
            cpu: format!(
                "{}/{}/{}",
                report.cpu_request.to_human(),
                report.cpu_limit.to_human(),
                report.total_cpu.to_human()
            ),
            memory: format!(
                "{}/{}/{}",
                report.memory_request.to_human(),
                report.memory_limit.to_human(),
                report.total_memory.to_human()
            ),
            cpu_percent: percent(report.utilization.map(|u| u.cpu_request)),
            memory_percent: percent(report.utilization.map(|u| u.memory_request)),
            status: Self::format_status(report),
        }
    }

    fn write_errors(output: &mut String, errors: &[String]) {
        if errors.is_empty() {
            return;
        }
        let _ = writeln!(output, "{} {} error(s):", "✗".red(), errors.len());
        for error in errors {
            let _ = writeln!(output, "   - {error}");
        }
        output.push('\n');
    }

    fn format_entry_hashes(entry: &DiffEntry) -> String {
        let hasher = ConfigHasher::new();
        let hash = |h: Option<&String>| h.map_or_else(|| String::from("-"), |h| hasher.short_hash(h));
        format!(
            "{entry} [{} -> {}]",
            hash(entry.old_hash.as_ref()),
            hash(entry.new_hash.as_ref())
        )
    }

    /// Formats a diff type with color.
    fn format_diff_type(diff_type: DiffType) -> String {
        match diff_type {
            DiffType::Create => "+create".green().to_string(),
            DiffType::Update => "~update".yellow().to_string(),
            DiffType::Delete => "-delete".red().to_string(),
            DiffType::Unchanged => "unchanged".dimmed().to_string(),
        }
    }

    /// Formats a headroom status with color.
    fn format_status(report: &CapacityReport) -> String {
        let status = match report.status {
            HeadroomStatus::Available => report.status.to_string().green().to_string(),
            HeadroomStatus::NearCapacity => report.status.to_string().yellow().to_string(),
            HeadroomStatus::OverCapacity => report.status.to_string().red().to_string(),
            HeadroomStatus::Undefined => report.status.to_string().dimmed().to_string(),
        };
        if report.over_capacity {
            format!("{status} {}", "(limits over)".red())
        } else {
            status
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

// JSON serialization helpers

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationJson {
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
    apps: usize,
    nodes: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanJson<'a> {
    config_hash: &'a str,
    exit_code: u8,
    creates: usize,
    updates: usize,
    deletes: usize,
    unchanged: usize,
    diffs: &'a [DiffEntry],
    errors: Vec<String>,
    capacity: CapacityJson<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CapacityJson<'a> {
    groups: Vec<&'a CapacityReport>,
    unassigned: &'a [String],
    errors: Vec<String>,
}

impl<'a> From<&'a PlanReport> for PlanJson<'a> {
    fn from(report: &'a PlanReport) -> Self {
        Self {
            config_hash: &report.config_hash,
            exit_code: report.status().exit_code(),
            creates: report.diff.creates,
            updates: report.diff.updates,
            deletes: report.diff.deletes,
            unchanged: report.diff.unchanged,
            diffs: &report.diff.diffs,
            errors: report.error_messages(),
            capacity: CapacityJson::from(&report.capacity),
        }
    }
}

impl<'a> From<&'a CapacityAnalysis> for CapacityJson<'a> {
    fn from(analysis: &'a CapacityAnalysis) -> Self {
        Self {
            groups: analysis.reports.values().collect(),
            unassigned: &analysis.unassigned,
            errors: analysis.errors.iter().map(ToString::to_string).collect(),
        }
    }
}
