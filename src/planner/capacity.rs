//! Capacity planning for node groups.
//!
//! Each resolved app whose node selector lands on a node group adds its
//! requests and limits to that group once. One scheduled instance per app is
//! assumed regardless of the group's member count, so multi-replica
//! workloads are undercounted.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::{NodeGroup, ResourceRequirements};
use crate::error::CapacityError;
use crate::quantity::{CpuQuantity, MemoryQuantity};
use crate::translator::ResolvedApp;

/// Request utilization above which a group counts as near capacity.
pub const NEAR_CAPACITY_PERCENT: f64 = 80.0;

/// Request utilization above which a group counts as over capacity.
pub const OVER_CAPACITY_PERCENT: f64 = 100.0;

/// Capacity planner over a fixed set of node groups.
#[derive(Debug, Clone, Copy)]
pub struct CapacityPlanner<'a> {
    node_groups: &'a BTreeMap<String, NodeGroup>,
}

/// One app's contribution to a node group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDemand {
    /// Application name.
    pub name: String,
    /// Requested CPU.
    pub cpu_request: CpuQuantity,
    /// CPU limit.
    pub cpu_limit: CpuQuantity,
    /// Requested memory.
    pub memory_request: MemoryQuantity,
    /// Memory limit.
    pub memory_limit: MemoryQuantity,
    /// False when the app has no resource profile and contributes nothing.
    pub has_profile: bool,
}

/// Aggregate demand as a percentage of total capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Utilization {
    /// CPU requests over total CPU.
    pub cpu_request: f64,
    /// CPU limits over total CPU.
    pub cpu_limit: f64,
    /// Memory requests over total memory.
    pub memory_request: f64,
    /// Memory limits over total memory.
    pub memory_limit: f64,
}

/// Headroom left in a node group, judged on requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HeadroomStatus {
    /// At most 80% requested.
    Available,
    /// More than 80% requested.
    NearCapacity,
    /// More than 100% requested.
    OverCapacity,
    /// Demand exists but the group has no capacity to divide by.
    Undefined,
}

/// Capacity picture for one node group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityReport {
    /// Node group name.
    pub group: String,
    /// Member count.
    pub node_count: u32,
    /// CPU across all members.
    pub total_cpu: CpuQuantity,
    /// Memory across all members.
    pub total_memory: MemoryQuantity,
    /// Summed CPU requests.
    pub cpu_request: CpuQuantity,
    /// Summed CPU limits.
    pub cpu_limit: CpuQuantity,
    /// Summed memory requests.
    pub memory_request: MemoryQuantity,
    /// Summed memory limits.
    pub memory_limit: MemoryQuantity,
    /// Utilization ratios, absent when capacity is zero.
    pub utilization: Option<Utilization>,
    /// True when summed limits exceed total capacity.
    pub over_capacity: bool,
    /// Headroom status.
    pub status: HeadroomStatus,
    /// Contributing apps, by name.
    pub apps: Vec<AppDemand>,
}

/// Result of a capacity analysis.
#[derive(Debug, Clone, Default)]
pub struct CapacityAnalysis {
    /// One report per node group.
    pub reports: BTreeMap<String, CapacityReport>,
    /// Apps without a node selector.
    pub unassigned: Vec<String>,
    /// Apps targeting unknown groups and groups with undefined utilization.
    pub errors: Vec<CapacityError>,
}

impl<'a> CapacityPlanner<'a> {
    /// Creates a planner over the given node groups.
    #[must_use]
    pub const fn new(node_groups: &'a BTreeMap<String, NodeGroup>) -> Self {
        Self { node_groups }
    }

    /// Aggregates demand per node group.
    #[must_use]
    pub fn analyze(&self, apps: &BTreeMap<String, ResolvedApp>) -> CapacityAnalysis {
        let mut analysis = CapacityAnalysis::default();
        let mut demand: BTreeMap<&str, Vec<AppDemand>> = BTreeMap::new();

        for app in apps.values() {
            let Some(group) = app.node_group.as_deref() else {
                analysis.unassigned.push(app.name.clone());
                continue;
            };

            if !self.node_groups.contains_key(group) {
                warn!("App {} targets unknown node group {group}", app.name);
                analysis.errors.push(CapacityError::UnknownNodeSelector {
                    app: app.name.clone(),
                    selector: group.to_string(),
                });
                continue;
            }

            demand
                .entry(group)
                .or_default()
                .push(AppDemand::new(&app.name, app.resources.as_ref()));
        }

        for (name, group) in self.node_groups {
            let apps = demand.remove(name.as_str()).unwrap_or_default();
            let report = match CapacityReport::build(group, apps) {
                Ok(report) => report,
                Err(e) => {
                    warn!("{e}");
                    analysis.errors.push(e);
                    continue;
                }
            };

            if report.status == HeadroomStatus::Undefined {
                warn!("Node group {name} has demand but zero capacity");
                analysis.errors.push(CapacityError::CapacityUndefined {
                    group: name.clone(),
                    demand: report.apps.len(),
                });
            }

            debug!(
                "Node group {name}: cpu {}/{} memory {}/{} ({:?})",
                report.cpu_request,
                report.total_cpu,
                report.memory_request,
                report.total_memory,
                report.status
            );
            analysis.reports.insert(name.clone(), report);
        }

        analysis
    }
}

impl AppDemand {
    fn new(name: &str, resources: Option<&ResourceRequirements>) -> Self {
        Self {
            name: name.to_string(),
            cpu_request: resources.map_or(CpuQuantity::ZERO, |r| r.cpu_request),
            cpu_limit: resources.map_or(CpuQuantity::ZERO, |r| r.cpu_limit),
            memory_request: resources.map_or(MemoryQuantity::ZERO, |r| r.memory_request),
            memory_limit: resources.map_or(MemoryQuantity::ZERO, |r| r.memory_limit),
            has_profile: resources.is_some(),
        }
    }
}

impl CapacityReport {
    fn build(group: &NodeGroup, apps: Vec<AppDemand>) -> Result<Self, CapacityError> {
        let overflow = |quantity: &str| CapacityError::Overflow {
            group: group.name.clone(),
            quantity: quantity.to_string(),
        };

        let total_cpu = group.total_cpu().ok_or_else(|| overflow("cpu capacity"))?;
        let total_memory = group
            .total_memory()
            .ok_or_else(|| overflow("memory capacity"))?;

        let cpu_request = CpuQuantity::checked_sum(apps.iter().map(|a| a.cpu_request))
            .ok_or_else(|| overflow("cpu requests"))?;
        let cpu_limit = CpuQuantity::checked_sum(apps.iter().map(|a| a.cpu_limit))
            .ok_or_else(|| overflow("cpu limits"))?;
        let memory_request = MemoryQuantity::checked_sum(apps.iter().map(|a| a.memory_request))
            .ok_or_else(|| overflow("memory requests"))?;
        let memory_limit = MemoryQuantity::checked_sum(apps.iter().map(|a| a.memory_limit))
            .ok_or_else(|| overflow("memory limits"))?;

        let utilization = match (
            cpu_request.percent_of(total_cpu),
            cpu_limit.percent_of(total_cpu),
            memory_request.percent_of(total_memory),
            memory_limit.percent_of(total_memory),
        ) {
            (Some(cpu_request), Some(cpu_limit), Some(memory_request), Some(memory_limit)) => {
                Some(Utilization {
                    cpu_request,
                    cpu_limit,
                    memory_request,
                    memory_limit,
                })
            }
            _ => None,
        };

        let status = match utilization {
            None if apps.is_empty() => HeadroomStatus::Available,
            None => HeadroomStatus::Undefined,
            Some(u) => HeadroomStatus::from_percent(u.cpu_request.max(u.memory_request)),
        };

        Ok(Self {
            group: group.name.clone(),
            node_count: group.count,
            total_cpu,
            total_memory,
            cpu_request,
            cpu_limit,
            memory_request,
            memory_limit,
            utilization,
            over_capacity: cpu_limit > total_cpu || memory_limit > total_memory,
            status,
            apps,
        })
    }

    /// Returns true when anything is scheduled onto the group.
    #[must_use]
    pub fn has_demand(&self) -> bool {
        !self.apps.is_empty()
    }
}

impl HeadroomStatus {
    /// Classifies a request utilization percentage.
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        if percent > OVER_CAPACITY_PERCENT {
            Self::OverCapacity
        } else if percent > NEAR_CAPACITY_PERCENT {
            Self::NearCapacity
        } else {
            Self::Available
        }
    }
}

impl std::fmt::Display for HeadroomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Available => "available",
            Self::NearCapacity => "near capacity",
            Self::OverCapacity => "over capacity",
            Self::Undefined => "undefined",
        };
        write!(f, "{s}")
    }
}

impl CapacityAnalysis {
    /// Returns true when no errors were found.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true when any group's limits exceed its capacity.
    #[must_use]
    pub fn any_over_capacity(&self) -> bool {
        self.reports.values().any(|r| r.over_capacity)
    }
}
