//! Planning module.
//!
//! This module compares the previously applied snapshot against the freshly
//! translated apps, checks node-group capacity, and turns both into a plan.

mod capacity;
mod diff;
mod plan;

pub use capacity::{
    AppDemand, CapacityAnalysis, CapacityPlanner, CapacityReport, HeadroomStatus,
    NEAR_CAPACITY_PERCENT, OVER_CAPACITY_PERCENT, Utilization,
};
pub use diff::{DiffEngine, DiffEntry, DiffResult, DiffType, changed_fields};
pub use plan::{ActionType, PlanReport, PlanStatus, PlannedAction};
