//! Configuration specification types.
//!
//! This module defines the structs that map to `maniforge.yaml` and to the
//! optional resource profile file. They describe the desired state tersely;
//! the translator expands them into full configuration trees.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::quantity::RawQuantity;

/// The root configuration structure (`maniforge.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManiforgeConfig {
    /// Cluster-wide settings and defaults.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Where generated manifests go.
    #[serde(default)]
    pub output: OutputConfig,
    /// Application declarations, keyed by app name.
    #[serde(default)]
    pub apps: BTreeMap<String, AppDeclaration>,
    /// Physical node groups, keyed by group name.
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeGroupSpec>,
    /// Additional or replacement resource profiles.
    #[serde(default)]
    pub resource_profiles: BTreeMap<String, ResourceProfileSpec>,
    /// Overrides for the built-in network type templates.
    #[serde(default)]
    pub network_types: BTreeMap<String, NetworkTemplateSpec>,
    /// Extra node selectors beyond the ones derived from `nodes`.
    #[serde(default)]
    pub node_selectors: BTreeMap<String, NodeSelectorSpec>,
    /// Overrides for ingress defaults.
    #[serde(default)]
    pub ingress_defaults: Option<IngressDefaultsSpec>,
    /// Overrides for the Helm chart reference.
    #[serde(default)]
    pub helm_chart: Option<HelmChartSpec>,
}

/// Cluster-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Cluster name.
    #[serde(default = "default_cluster_name")]
    pub name: String,
    /// Base domain for ingress hosts. No ingress is generated without it.
    #[serde(default)]
    pub domain: Option<String>,
    /// Defaults applied to apps that leave a field unset.
    #[serde(default)]
    pub defaults: ClusterDefaultsSpec,
}

/// Per-app defaults declared at cluster level.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDefaultsSpec {
    /// Default resource profile.
    #[serde(default)]
    pub profile: Option<String>,
    /// Default node selector.
    #[serde(default)]
    pub node_selector: Option<String>,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    /// Directory that receives one sub-directory per app.
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
}

/// One application's terse declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppDeclaration {
    /// Container image reference (`registry/repo:tag`).
    #[serde(default)]
    pub image: Option<String>,
    /// Workload kind (`deployment`, `statefulset`, `daemonset`).
    #[serde(default, rename = "type")]
    pub workload: Option<String>,
    /// Network mode name.
    #[serde(default)]
    pub network: Option<String>,
    /// Resource profile name.
    #[serde(default)]
    pub profile: Option<String>,
    /// Node selector name.
    #[serde(default)]
    pub node_selector: Option<String>,
    /// Target namespace.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Exposed ports, in declaration order.
    #[serde(default)]
    pub ports: Vec<PortDeclaration>,
    /// Volumes keyed by name. Each entry is validated by its `type` tag
    /// during translation.
    #[serde(default)]
    pub storage: BTreeMap<String, Value>,
    /// Environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, Value>,
    /// Ingress toggle; `false` disables the generated ingress.
    #[serde(default)]
    pub ingress: Option<bool>,
}

/// A declared port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PortDeclaration {
    /// Port name; defaults to `port-<index>`.
    #[serde(default)]
    pub name: Option<String>,
    /// Service port.
    pub port: u16,
    /// Container port; defaults to `port`.
    #[serde(default)]
    pub target_port: Option<u16>,
    /// Protocol; defaults to `TCP`.
    #[serde(default)]
    pub protocol: Option<String>,
    /// Fixed node port (NodePort services only).
    #[serde(default)]
    pub node_port: Option<u16>,
}

/// A physical node group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeGroupSpec {
    /// Number of member nodes.
    #[serde(default = "default_node_count")]
    pub count: u32,
    /// Per-node CPU.
    #[serde(default, alias = "cores")]
    pub cpu: Option<RawQuantity>,
    /// Per-node memory.
    #[serde(default, alias = "mem")]
    pub memory: Option<RawQuantity>,
    /// Per-node disk (informational).
    #[serde(default)]
    pub disk: Option<RawQuantity>,
}

/// A resource profile as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceProfileSpec {
    /// CPU requests and limits.
    pub cpu: RequestLimitSpec,
    /// Memory requests and limits.
    pub memory: RequestLimitSpec,
}

/// A request/limit pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestLimitSpec {
    /// Requested amount.
    pub requests: RawQuantity,
    /// Limit.
    pub limits: RawQuantity,
}

/// A network type template override.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkTemplateSpec {
    /// Service settings.
    #[serde(default)]
    pub service: Option<ServiceTemplateSpec>,
    /// Pod-level options (`hostNetwork`, `dnsPolicy`, ...).
    #[serde(default)]
    pub pod_options: BTreeMap<String, Value>,
}

/// Service part of a network template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceTemplateSpec {
    /// Kubernetes service type.
    #[serde(rename = "type")]
    pub service_type: String,
}

/// An explicit node selector.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelectorSpec {
    /// Node labels to select on.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Node group the selected nodes belong to. Defaults to the selector name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_group: Option<String>,
}

/// Ingress default overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngressDefaultsSpec {
    /// Ingress class.
    #[serde(default)]
    pub class_name: Option<String>,
    /// Annotations added to every ingress. Replaces the built-in set when
    /// non-empty.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// Helm chart reference overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelmChartSpec {
    /// Chart name.
    #[serde(default)]
    pub name: Option<String>,
    /// Chart version.
    #[serde(default)]
    pub version: Option<String>,
    /// Chart repository.
    #[serde(default)]
    pub repository: Option<HelmRepositorySpec>,
}

/// Helm repository reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelmRepositorySpec {
    /// `HelmRepository` object name.
    #[serde(default)]
    pub name: Option<String>,
    /// Namespace of the `HelmRepository` object.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// The standalone resource profile file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileFile {
    /// Profiles keyed by `<family>.<size>`.
    #[serde(default)]
    pub profiles: BTreeMap<String, ResourceProfileSpec>,
}

// Default value functions

const fn default_node_count() -> u32 {
    1
}

fn default_cluster_name() -> String {
    String::from("cluster")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("apps")
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: default_cluster_name(),
            domain: None,
            defaults: ClusterDefaultsSpec::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

impl AppDeclaration {
    /// Returns true unless the app explicitly disabled ingress.
    #[must_use]
    pub fn ingress_enabled(&self) -> bool {
        self.ingress.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_app_defaults() {
        let app: AppDeclaration = serde_yaml::from_str("image: nginx").unwrap();
        assert_eq!(app.image.as_deref(), Some("nginx"));
        assert!(app.ports.is_empty());
        assert!(app.ingress_enabled());
    }

    #[test]
    fn test_node_group_aliases() {
        let node: NodeGroupSpec = serde_yaml::from_str("cores: 4\nmem: 8Gi").unwrap();
        assert_eq!(node.count, 1);
        assert_eq!(node.cpu.unwrap().as_str(), "4");
        assert_eq!(node.memory.unwrap().as_str(), "8Gi");
    }

    #[test]
    fn test_node_selector_names_its_group() {
        let selector: NodeSelectorSpec =
            serde_yaml::from_str("labels: {kubernetes.io/arch: arm64}\nnodeGroup: pi").unwrap();
        assert_eq!(selector.node_group.as_deref(), Some("pi"));
        assert_eq!(selector.labels["kubernetes.io/arch"], "arm64");
    }

    #[test]
    fn test_port_declaration_camel_case() {
        let port: PortDeclaration =
            serde_yaml::from_str("port: 80\ntargetPort: 8080\nnodePort: 30080").unwrap();
        assert_eq!(port.target_port, Some(8080));
        assert_eq!(port.node_port, Some(30080));
    }
}
