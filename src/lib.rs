// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Maniforge
//!
//! Turns terse, app-centric declarations into fully resolved Kubernetes
//! manifests for small clusters, with a plan/apply workflow.
//!
//! ## Overview
//!
//! Maniforge lets you:
//!
//! - Declare apps in one `maniforge.yaml` ("this image, this profile, this
//!   network mode, this storage")
//! - Resolve every declaration through named resource profiles, network
//!   templates and node selectors into one merged tree per app
//! - Diff the resolved trees against the last applied snapshot
//! - Check whether each node group can hold everything scheduled onto it
//! - Write a Flux `HelmRelease` and a Kustomize `kustomization.yaml` per app
//!
//! ## Architecture
//!
//! Data flows one way:
//!
//! 1. **Config**: `maniforge.yaml` plus an optional profile file become
//!    [`config::ManiforgeConfig`] and the immutable [`config::Platform`]
//! 2. **Translator**: each declaration becomes a [`translator::ResolvedApp`]
//! 3. **Planner**: resolved apps are diffed against the [`state`] snapshot and
//!    checked against node-group capacity
//! 4. **Generator**: `apply` writes manifests and records the new snapshot
//!
//! ## Modules
//!
//! - [`quantity`]: CPU and memory quantities
//! - [`merge`]: recursive merge of configuration trees
//! - [`config`]: Configuration parsing, validation and lookup tables
//! - [`translator`]: App declaration to resolved tree
//! - [`planner`]: Diff, capacity analysis and plan reports
//! - [`state`]: Applied snapshot storage
//! - [`generator`]: Manifest rendering and writing
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! cluster:
//!   name: firefly
//!   domain: example.com
//!   defaults:
//!     profile: c.small
//!     nodeSelector: pi
//!
//! apps:
//!   homebridge:
//!     image: ghcr.io/homebridge/homebridge:latest
//!     network: host
//!     storage:
//!       config: {type: pvc, mount: /homebridge, size: 1Gi}
//!
//! nodes:
//!   pi: {count: 2, cpu: 4, memory: 16Gi}
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod merge;
pub mod planner;
pub mod quantity;
pub mod state;
pub mod translator;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigHasher, ConfigParser, ConfigValidator, ManiforgeConfig, Platform};
pub use error::{ManiforgeError, Result};
pub use generator::ManifestWriter;
pub use merge::{merge, merge_layers};
pub use planner::{CapacityPlanner, CapacityReport, DiffEngine, DiffEntry, DiffType, PlanReport};
pub use quantity::{CpuQuantity, MemoryQuantity};
pub use state::{ApplyState, LocalStateStore, StateStore};
pub use translator::{ResolvedApp, Translator};
