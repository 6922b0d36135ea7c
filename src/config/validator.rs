//! Configuration validation.
//!
//! Structural checks need nothing beyond the configuration file itself.
//! Reference checks resolve every profile, network type and node selector an
//! app names against the built [`Platform`]. Every problem is collected in
//! one pass.

use crate::error::{ConfigError, ManiforgeError, Result};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use super::platform::{NetworkMode, Platform};
use super::spec::{AppDeclaration, ManiforgeConfig, PortDeclaration};

/// Validator for Maniforge configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a configuration, failing on the first collected error.
    ///
    /// # Errors
    ///
    /// Returns an error if validation finds any problem.
    pub fn validate(&self, config: &ManiforgeConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        match result.errors.first() {
            None => {
                debug!("Configuration validation passed");
                Ok(result)
            }
            Some(first) => Err(ManiforgeError::Config(ConfigError::ValidationError {
                message: first.message.clone(),
                field: Some(first.field.clone()),
            })),
        }
    }

    /// Validates a configuration and returns every error and warning.
    #[must_use]
    pub fn check(&self, config: &ManiforgeConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_cluster(config, &mut result);
        Self::validate_apps(config, &mut result);
        Self::validate_nodes(config, &mut result);

        debug!(
            "Validation finished with {} error(s) and {} warning(s)",
            result.error_count(),
            result.warning_count()
        );
        result
    }

    /// Checks that every profile, network type and node selector an app
    /// uses, directly or through the cluster defaults, exists in `platform`.
    pub fn check_references(
        &self,
        config: &ManiforgeConfig,
        platform: &Platform,
        result: &mut ValidationResult,
    ) {
        let defaults = &config.cluster.defaults;

        for (name, app) in &config.apps {
            let prefix = format!("apps.{name}");

            if let Some(profile) = app.profile.as_deref().or(defaults.profile.as_deref())
                && platform.profile(profile).is_none()
            {
                result.error(
                    format!("{prefix}.profile"),
                    format!("unknown profile '{profile}'"),
                );
            }

            if let Some(network) = app.network.as_deref() {
                let known = network
                    .parse::<NetworkMode>()
                    .is_ok_and(|mode| platform.network(mode).is_some());
                if !known {
                    result.error(
                        format!("{prefix}.network"),
                        format!("unknown network type '{network}'"),
                    );
                }
            }

            if let Some(selector) = app
                .node_selector
                .as_deref()
                .or(defaults.node_selector.as_deref())
                && platform.node_selector(selector).is_none()
            {
                result.error(
                    format!("{prefix}.nodeSelector"),
                    format!("unknown nodeSelector '{selector}' (define it under top-level nodes)"),
                );
            }
        }

        debug!(
            "Reference checks finished with {} error(s) in total",
            result.error_count()
        );
    }

    fn validate_cluster(config: &ManiforgeConfig, result: &mut ValidationResult) {
        let cluster = &config.cluster;

        if !is_valid_name(&cluster.name) {
            result.error(
                "cluster.name",
                format!(
                    "Cluster name '{}' is invalid. Must be lowercase alphanumeric with hyphens.",
                    cluster.name
                ),
            );
        }

        if cluster.domain.as_deref().is_some_and(str::is_empty) {
            result
                .warnings
                .push(String::from("cluster.domain: empty domain, ingress is disabled"));
        }
    }

    fn validate_apps(config: &ManiforgeConfig, result: &mut ValidationResult) {
        if config.apps.is_empty() {
            result.warnings.push(String::from("No apps defined in configuration"));
            return;
        }

        for (name, app) in &config.apps {
            let prefix = format!("apps.{name}");

            if !is_valid_name(name) {
                result.error(
                    &prefix,
                    format!(
                        "App name '{name}' is invalid. Must be lowercase alphanumeric with hyphens."
                    ),
                );
            }

            if let Some(namespace) = &app.namespace
                && !is_valid_name(namespace)
            {
                result.error(
                    format!("{prefix}.namespace"),
                    format!("Namespace '{namespace}' is invalid"),
                );
            }

            Self::validate_image(app, &prefix, result);
            Self::validate_ports(app, &app.ports, &prefix, result);
            Self::validate_storage(app, &prefix, result);
        }
    }

    fn validate_image(app: &AppDeclaration, prefix: &str, result: &mut ValidationResult) {
        match app.image.as_deref().map(str::trim) {
            None | Some("") => {
                result.error(
                    format!("{prefix}.image"),
                    String::from("Container image cannot be empty"),
                );
            }
            Some(image) => {
                let last = image.rsplit('/').next().unwrap_or(image);
                if !last.contains(':') || image.ends_with(":latest") {
                    result.warnings.push(format!(
                        "{prefix}.image: '{image}' resolves to the 'latest' tag"
                    ));
                }
            }
        }
    }

    fn validate_ports(
        app: &AppDeclaration,
        ports: &[PortDeclaration],
        prefix: &str,
        result: &mut ValidationResult,
    ) {
        let mut seen_ports = HashSet::new();
        let mut seen_names = HashSet::new();

        for (i, port) in ports.iter().enumerate() {
            let field = format!("{prefix}.ports[{i}]");

            if port.port == 0 {
                result.error(&field, String::from("Port must be between 1 and 65535"));
            }

            if !seen_ports.insert(port.port) {
                result.error(&field, format!("Duplicate port {}", port.port));
            }

            let name = port.name.clone().unwrap_or_else(|| format!("port-{i}"));
            if !seen_names.insert(name.clone()) {
                result.error(format!("{field}.name"), format!("Duplicate port name: {name}"));
            }

            if port.node_port.is_some() && app.network.as_deref() != Some("nodeport") {
                result.warnings.push(format!(
                    "{field}.nodePort: ignored unless the app uses the nodeport network"
                ));
            }
        }
    }

    fn validate_storage(app: &AppDeclaration, prefix: &str, result: &mut ValidationResult) {
        let mut seen_mounts = HashSet::new();

        for (name, volume) in &app.storage {
            let field = format!("{prefix}.storage.{name}");

            let Value::Object(entry) = volume else {
                result.error(&field, String::from("Volume must be a mapping"));
                continue;
            };

            let Some(mount) = entry.get("mount").and_then(Value::as_str) else {
                continue;
            };

            if !mount.starts_with('/') {
                result.error(
                    format!("{field}.mount"),
                    format!("Mount path must be absolute: {mount}"),
                );
            }

            if !seen_mounts.insert(mount) {
                result.error(
                    format!("{field}.mount"),
                    format!("Duplicate mount path: {mount}"),
                );
            }
        }
    }

    fn validate_nodes(config: &ManiforgeConfig, result: &mut ValidationResult) {
        for (name, node) in &config.nodes {
            if !is_valid_name(name) {
                result.error(
                    format!("nodes.{name}"),
                    format!("Node group name '{name}' is invalid"),
                );
            }

            if node.count == 0 {
                result
                    .warnings
                    .push(format!("nodes.{name}.count: node group has no members"));
            }
        }
    }
}

/// Validates that a name follows the naming convention.
/// Names must be lowercase alphanumeric with hyphens, starting with a letter.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }

    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return false;
    }

    !name.ends_with('-') && !name.contains("--")
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    fn error(&mut self, field: impl Into<String>, message: String) {
        self.errors.push(ValidationError {
            field: field.into(),
            message,
        });
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
