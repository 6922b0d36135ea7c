//! Platform lookup tables.
//!
//! A [`Platform`] bundles every read-only table the translator and the
//! capacity planner consult: resource profiles, network templates, node
//! selectors, node groups, ingress defaults, the chart reference and the
//! cluster defaults. It is built once from the built-in defaults plus the
//! overrides in `maniforge.yaml` and the profile file, and never mutated
//! afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{ConfigError, QuantityError};
use crate::quantity::{CpuQuantity, MemoryQuantity, RawQuantity};

use super::spec::{
    ClusterConfig, HelmChartSpec, IngressDefaultsSpec, ManiforgeConfig, NetworkTemplateSpec,
    NodeGroupSpec, ProfileFile, ResourceProfileSpec,
};

/// Network modes an app can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NetworkMode {
    /// Cluster-internal service.
    ClusterIp,
    /// Service exposed on every node's port.
    NodePort,
    /// Service exposed through an external load balancer.
    LoadBalancer,
    /// Pod shares the node's network namespace; no service.
    Host,
}

impl NetworkMode {
    /// Every mode, in table order.
    pub const ALL: [Self; 4] = [Self::ClusterIp, Self::NodePort, Self::LoadBalancer, Self::Host];

    /// Returns the configuration name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClusterIp => "clusterip",
            Self::NodePort => "nodeport",
            Self::LoadBalancer => "loadbalancer",
            Self::Host => "host",
        }
    }

    /// Returns true when the mode needs an explicit port list.
    #[must_use]
    pub const fn requires_ports(self) -> bool {
        matches!(self, Self::NodePort | Self::LoadBalancer)
    }
}

impl FromStr for NetworkMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kubernetes service kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// `ClusterIP`.
    #[serde(rename = "ClusterIP")]
    ClusterIp,
    /// `NodePort`.
    NodePort,
    /// `LoadBalancer`.
    LoadBalancer,
}

impl ServiceType {
    /// Returns the Kubernetes spelling of the service type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClusterIp => "ClusterIP",
            Self::NodePort => "NodePort",
            Self::LoadBalancer => "LoadBalancer",
        }
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clusterip" => Ok(Self::ClusterIp),
            "nodeport" => Ok(Self::NodePort),
            "loadbalancer" => Ok(Self::LoadBalancer),
            _ => Err(s.to_string()),
        }
    }
}

/// What a network mode contributes to a resolved app.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkTemplate {
    /// Service kind, or `None` when the mode emits no service.
    pub service: Option<ServiceType>,
    /// Pod-level options merged into `podOptions`.
    pub pod_options: BTreeMap<String, Value>,
}

/// Requests and limits from one resource profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    /// Requested CPU.
    pub cpu_request: CpuQuantity,
    /// CPU limit.
    pub cpu_limit: CpuQuantity,
    /// Requested memory.
    pub memory_request: MemoryQuantity,
    /// Memory limit.
    pub memory_limit: MemoryQuantity,
}

impl ResourceRequirements {
    /// Renders the requirements as a `{requests, limits}` tree.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            "requests": {
                "cpu": self.cpu_request.format(),
                "memory": self.memory_request.format(),
            },
            "limits": {
                "cpu": self.cpu_limit.format(),
                "memory": self.memory_limit.format(),
            },
        })
    }

    fn from_spec(name: &str, spec: &ResourceProfileSpec) -> Result<Self, ConfigError> {
        let field = |path: &str, source: QuantityError| ConfigError::InvalidQuantity {
            field: format!("resourceProfiles.{name}.{path}"),
            source,
        };

        Ok(Self {
            cpu_request: spec.cpu.requests.cpu().map_err(|e| field("cpu.requests", e))?,
            cpu_limit: spec.cpu.limits.cpu().map_err(|e| field("cpu.limits", e))?,
            memory_request: spec
                .memory
                .requests
                .memory()
                .map_err(|e| field("memory.requests", e))?,
            memory_limit: spec
                .memory
                .limits
                .memory()
                .map_err(|e| field("memory.limits", e))?,
        })
    }
}

/// A physical node group with parsed capacities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeGroup {
    /// Group name.
    pub name: String,
    /// Member count.
    pub count: u32,
    /// CPU per node.
    pub cpu: CpuQuantity,
    /// Memory per node.
    pub memory: MemoryQuantity,
    /// Disk per node, informational only.
    pub disk: Option<MemoryQuantity>,
}

impl NodeGroup {
    /// CPU across all members, or `None` on overflow.
    #[must_use]
    pub fn total_cpu(&self) -> Option<CpuQuantity> {
        self.cpu.checked_mul(u64::from(self.count))
    }

    /// Memory across all members, or `None` on overflow.
    #[must_use]
    pub fn total_memory(&self) -> Option<MemoryQuantity> {
        self.memory.checked_mul(u64::from(self.count))
    }

    fn from_spec(name: &str, spec: &NodeGroupSpec) -> Result<Self, ConfigError> {
        let required = |raw: &Option<RawQuantity>, key: &str| {
            raw.clone().ok_or_else(|| {
                ConfigError::validation(
                    format!("node group '{name}' must declare {key}"),
                    format!("nodes.{name}.{key}"),
                )
            })
        };
        let invalid = |key: &str, source| ConfigError::InvalidQuantity {
            field: format!("nodes.{name}.{key}"),
            source,
        };

        Ok(Self {
            name: name.to_string(),
            count: spec.count,
            cpu: required(&spec.cpu, "cpu")?
                .cpu()
                .map_err(|e| invalid("cpu", e))?,
            memory: required(&spec.memory, "memory")?
                .memory()
                .map_err(|e| invalid("memory", e))?,
            disk: spec
                .disk
                .as_ref()
                .map(RawQuantity::memory)
                .transpose()
                .map_err(|e| invalid("disk", e))?,
        })
    }
}

/// Ingress class and annotations applied to every generated ingress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressDefaults {
    /// Ingress class name.
    pub class_name: String,
    /// Annotations.
    pub annotations: BTreeMap<String, String>,
}

/// Labels behind a node selector name and the node group they land on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSelector {
    /// Labels rendered into `podOptions.nodeSelector`.
    pub labels: BTreeMap<String, String>,
    /// Node group whose capacity the app is counted against.
    pub node_group: String,
}

/// The Helm chart every app is rendered against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartReference {
    /// Chart name.
    pub name: String,
    /// Chart version.
    pub version: String,
    /// `HelmRepository` name.
    pub repository: String,
    /// `HelmRepository` namespace.
    pub repository_namespace: String,
}

impl ChartReference {
    /// Renders the reference as a `{name, version, repository}` tree.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "version": self.version,
            "repository": {
                "name": self.repository,
                "namespace": self.repository_namespace,
            },
        })
    }
}

/// Cluster-level defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterDefaults {
    /// Cluster name.
    pub name: String,
    /// Base domain for ingress hosts.
    pub domain: Option<String>,
    /// Default resource profile.
    pub profile: Option<String>,
    /// Default node selector.
    pub node_selector: Option<String>,
}

/// Immutable lookup tables shared by every translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    profiles: BTreeMap<String, ResourceRequirements>,
    networks: BTreeMap<NetworkMode, NetworkTemplate>,
    node_selectors: BTreeMap<String, NodeSelector>,
    node_groups: BTreeMap<String, NodeGroup>,
    ingress: IngressDefaults,
    chart: ChartReference,
    cluster: ClusterDefaults,
}

const BUILTIN_PROFILES: &[(&str, &str, &str, &str, &str)] = &[
    ("c.pico", "100m", "250m", "256Mi", "512Mi"),
    ("c.small", "250m", "500m", "512Mi", "1Gi"),
    ("r.large", "500m", "1000m", "4Gi", "8Gi"),
];

const BUILTIN_ANNOTATIONS: &[(&str, &str)] = &[
    ("traefik.ingress.kubernetes.io/router.entrypoints", "websecure"),
    ("traefik.ingress.kubernetes.io/router.tls", "true"),
    ("cert-manager.io/cluster-issuer", "letsencrypt-dns"),
];

impl Platform {
    /// Returns the built-in tables with no node groups and no domain.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in profile quantity fails to parse.
    pub fn builtin() -> Result<Self, ConfigError> {
        let profiles = BUILTIN_PROFILES
            .iter()
            .map(|(name, cpu_req, cpu_lim, mem_req, mem_lim)| {
                let field = |path: &str, source: QuantityError| ConfigError::InvalidQuantity {
                    field: format!("resourceProfiles.{name}.{path}"),
                    source,
                };
                Ok((
                    (*name).to_string(),
                    ResourceRequirements {
                        cpu_request: CpuQuantity::parse(cpu_req)
                            .map_err(|e| field("cpu.requests", e))?,
                        cpu_limit: CpuQuantity::parse(cpu_lim)
                            .map_err(|e| field("cpu.limits", e))?,
                        memory_request: MemoryQuantity::parse(mem_req)
                            .map_err(|e| field("memory.requests", e))?,
                        memory_limit: MemoryQuantity::parse(mem_lim)
                            .map_err(|e| field("memory.limits", e))?,
                    },
                ))
            })
            .collect::<Result<_, ConfigError>>()?;

        let networks = NetworkMode::ALL
            .into_iter()
            .map(|mode| (mode, builtin_network(mode)))
            .collect();

        Ok(Self {
            profiles,
            networks,
            node_selectors: BTreeMap::new(),
            node_groups: BTreeMap::new(),
            ingress: IngressDefaults {
                class_name: String::from("traefik"),
                annotations: BUILTIN_ANNOTATIONS
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            },
            chart: ChartReference {
                name: String::from("app-template"),
                version: String::from("4.4.0"),
                repository: String::from("bjw-s"),
                repository_namespace: String::from("flux-system"),
            },
            cluster: ClusterDefaults {
                name: String::from("cluster"),
                ..ClusterDefaults::default()
            },
        })
    }

    /// Builds the platform from the built-in tables, the optional profile
    /// file and the overrides in `config`.
    ///
    /// The profile file replaces the built-in profiles outright; the
    /// `resourceProfiles` block then adds or replaces individual entries.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed profile names, unparseable
    /// quantities, node groups without capacities, node selectors whose
    /// node group is not declared, or overrides naming an unknown network
    /// type or service type.
    pub fn from_config(
        config: &ManiforgeConfig,
        profile_file: Option<&ProfileFile>,
    ) -> Result<Self, ConfigError> {
        let mut platform = Self::builtin()?;

        if let Some(file) = profile_file {
            debug!("Replacing built-in profiles with {} from file", file.profiles.len());
            platform.profiles = parse_profiles(&file.profiles)?;
        }
        platform.profiles.extend(parse_profiles(&config.resource_profiles)?);

        for (name, spec) in &config.network_types {
            platform.apply_network_override(name, spec)?;
        }

        for (name, spec) in &config.nodes {
            let group = NodeGroup::from_spec(name, spec)?;
            platform.node_selectors.insert(
                name.clone(),
                NodeSelector {
                    labels: BTreeMap::from([(String::from("type"), name.clone())]),
                    node_group: name.clone(),
                },
            );
            platform.node_groups.insert(name.clone(), group);
        }
        for (name, spec) in &config.node_selectors {
            let node_group = spec.node_group.clone().unwrap_or_else(|| name.clone());
            if !platform.node_groups.contains_key(&node_group) {
                return Err(ConfigError::validation(
                    format!("node selector '{name}' targets unknown node group '{node_group}'"),
                    format!("nodeSelectors.{name}.nodeGroup"),
                ));
            }
            platform.node_selectors.insert(
                name.clone(),
                NodeSelector {
                    labels: spec.labels.clone(),
                    node_group,
                },
            );
        }

        if let Some(ingress) = &config.ingress_defaults {
            platform.apply_ingress_override(ingress);
        }
        if let Some(chart) = &config.helm_chart {
            platform.apply_chart_override(chart);
        }

        platform.cluster = cluster_defaults(&config.cluster);

        debug!(
            "Platform ready: {} profile(s), {} node group(s), {} node selector(s)",
            platform.profiles.len(),
            platform.node_groups.len(),
            platform.node_selectors.len()
        );
        Ok(platform)
    }

    /// Looks up a resource profile.
    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&ResourceRequirements> {
        self.profiles.get(name)
    }

    /// Looks up a network template.
    #[must_use]
    pub fn network(&self, mode: NetworkMode) -> Option<&NetworkTemplate> {
        self.networks.get(&mode)
    }

    /// Looks up a node selector by name.
    #[must_use]
    pub fn node_selector(&self, name: &str) -> Option<&NodeSelector> {
        self.node_selectors.get(name)
    }

    /// Returns the node groups keyed by name.
    #[must_use]
    pub const fn node_groups(&self) -> &BTreeMap<String, NodeGroup> {
        &self.node_groups
    }

    /// Returns the ingress defaults.
    #[must_use]
    pub const fn ingress(&self) -> &IngressDefaults {
        &self.ingress
    }

    /// Returns the chart reference.
    #[must_use]
    pub const fn chart(&self) -> &ChartReference {
        &self.chart
    }

    /// Returns the cluster defaults.
    #[must_use]
    pub const fn cluster(&self) -> &ClusterDefaults {
        &self.cluster
    }

    fn apply_network_override(
        &mut self,
        name: &str,
        spec: &NetworkTemplateSpec,
    ) -> Result<(), ConfigError> {
        let mode: NetworkMode = name.parse().map_err(|name| ConfigError::UnknownNetworkType {
            name,
        })?;
        let mut template = builtin_network(mode);

        if let Some(service) = &spec.service {
            let service_type: ServiceType = service.service_type.parse().map_err(|kind| {
                ConfigError::validation(
                    format!("unknown service type '{kind}'"),
                    format!("networkTypes.{name}.service.type"),
                )
            })?;
            if mode != NetworkMode::Host {
                template.service = Some(service_type);
            }
        }
        template.pod_options.extend(spec.pod_options.clone());

        self.networks.insert(mode, template);
        Ok(())
    }

    fn apply_ingress_override(&mut self, spec: &IngressDefaultsSpec) {
        if let Some(class_name) = &spec.class_name {
            self.ingress.class_name.clone_from(class_name);
        }
        if !spec.annotations.is_empty() {
            self.ingress.annotations.clone_from(&spec.annotations);
        }
    }

    fn apply_chart_override(&mut self, spec: &HelmChartSpec) {
        if let Some(name) = &spec.name {
            self.chart.name.clone_from(name);
        }
        if let Some(version) = &spec.version {
            self.chart.version.clone_from(version);
        }
        if let Some(repo) = &spec.repository {
            if let Some(name) = &repo.name {
                self.chart.repository.clone_from(name);
            }
            if let Some(namespace) = &repo.namespace {
                self.chart.repository_namespace.clone_from(namespace);
            }
        }
    }
}

fn builtin_network(mode: NetworkMode) -> NetworkTemplate {
    match mode {
        NetworkMode::ClusterIp => NetworkTemplate {
            service: Some(ServiceType::ClusterIp),
            pod_options: BTreeMap::new(),
        },
        NetworkMode::NodePort => NetworkTemplate {
            service: Some(ServiceType::NodePort),
            pod_options: BTreeMap::new(),
        },
        NetworkMode::LoadBalancer => NetworkTemplate {
            service: Some(ServiceType::LoadBalancer),
            pod_options: BTreeMap::new(),
        },
        NetworkMode::Host => NetworkTemplate {
            service: None,
            pod_options: BTreeMap::from([
                (String::from("hostNetwork"), Value::Bool(true)),
                (
                    String::from("dnsPolicy"),
                    Value::String(String::from("ClusterFirstWithHostNet")),
                ),
            ]),
        },
    }
}

fn parse_profiles(
    specs: &BTreeMap<String, ResourceProfileSpec>,
) -> Result<BTreeMap<String, ResourceRequirements>, ConfigError> {
    specs
        .iter()
        .map(|(name, spec)| {
            if !is_valid_profile_name(name) {
                return Err(ConfigError::InvalidProfileName { name: name.clone() });
            }
            Ok((name.clone(), ResourceRequirements::from_spec(name, spec)?))
        })
        .collect()
}

fn cluster_defaults(cluster: &ClusterConfig) -> ClusterDefaults {
    ClusterDefaults {
        name: cluster.name.clone(),
        domain: cluster.domain.clone().filter(|d| !d.is_empty()),
        profile: cluster.defaults.profile.clone(),
        node_selector: cluster.defaults.node_selector.clone(),
    }
}

/// Checks the `<family>.<size>` profile naming pattern.
pub(crate) fn is_valid_profile_name(name: &str) -> bool {
    let valid_part = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    };

    name.split_once('.')
        .is_some_and(|(family, size)| valid_part(family) && valid_part(size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> ManiforgeConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_builtin_profiles() {
        let platform = Platform::builtin().unwrap();
        let small = platform.profile("c.small").unwrap();

        assert_eq!(small.cpu_request.format(), "250m");
        assert_eq!(small.cpu_limit.format(), "500m");
        assert_eq!(small.memory_request.format(), "512Mi");
        assert_eq!(small.memory_limit.format(), "1Gi");
        assert_eq!(
            platform.profiles.keys().collect::<Vec<_>>(),
            vec!["c.pico", "c.small", "r.large"]
        );
        assert_eq!(platform.profiles.len(), BUILTIN_PROFILES.len());
    }

    #[test]
    fn test_builtin_host_network() {
        let platform = Platform::builtin().unwrap();
        let host = platform.network(NetworkMode::Host).unwrap();

        assert!(host.service.is_none());
        assert_eq!(host.pod_options["hostNetwork"], Value::Bool(true));
        assert_eq!(
            platform.network(NetworkMode::NodePort).unwrap().service,
            Some(ServiceType::NodePort)
        );
    }

    #[test]
    fn test_nodes_become_selectors_and_groups() {
        let platform = Platform::from_config(
            &config("nodes:\n  pi: {count: 2, cpu: 4, memory: 16Gi}\n"),
            None,
        )
        .unwrap();

        let selector = platform.node_selector("pi").unwrap();
        assert_eq!(selector.labels["type"], "pi");
        assert_eq!(selector.node_group, "pi");

        let group = &platform.node_groups()["pi"];
        assert_eq!(group.total_cpu().unwrap().millis(), 8_000);
        assert_eq!(group.total_memory().unwrap().format(), "32Gi");
    }

    #[test]
    fn test_explicit_node_selector_labels_win() {
        let platform = Platform::from_config(
            &config(
                "nodes:\n  pi: {cpu: 4, memory: 8Gi}\nnodeSelectors:\n  pi:\n    labels: {kubernetes.io/arch: arm64}\n",
            ),
            None,
        )
        .unwrap();

        let selector = platform.node_selector("pi").unwrap();
        assert_eq!(selector.labels.len(), 1);
        assert_eq!(selector.labels["kubernetes.io/arch"], "arm64");
        assert_eq!(selector.node_group, "pi");
    }

    #[test]
    fn test_extra_selector_maps_onto_node_group() {
        let platform = Platform::from_config(
            &config(
                "nodes:\n  pi: {cpu: 4, memory: 8Gi}\nnodeSelectors:\n  arm:\n    labels: {kubernetes.io/arch: arm64}\n    nodeGroup: pi\n",
            ),
            None,
        )
        .unwrap();

        let selector = platform.node_selector("arm").unwrap();
        assert_eq!(selector.node_group, "pi");
        assert_eq!(selector.labels["kubernetes.io/arch"], "arm64");
    }

    #[test]
    fn test_extra_selector_without_node_group_is_rejected() {
        let err = Platform::from_config(
            &config(
                "nodes:\n  pi: {cpu: 4, memory: 8Gi}\nnodeSelectors:\n  gpu:\n    labels: {accelerator: nvidia}\n",
            ),
            None,
        )
        .unwrap_err();

        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field.as_deref(), Some("nodeSelectors.gpu.nodeGroup"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_profile_file_replaces_builtins() {
        let file: ProfileFile = serde_yaml::from_str(
            "profiles:\n  m.tiny:\n    cpu: {requests: 50m, limits: 100m}\n    memory: {requests: 64Mi, limits: 128Mi}\n",
        )
        .unwrap();
        let platform = Platform::from_config(&ManiforgeConfig::default(), Some(&file)).unwrap();

        assert!(platform.profile("c.small").is_none());
        assert_eq!(platform.profile("m.tiny").unwrap().cpu_limit.format(), "100m");
    }

    #[test]
    fn test_config_profiles_extend_table() {
        let platform = Platform::from_config(
            &config(
                "resourceProfiles:\n  c.small:\n    cpu: {requests: 300m, limits: 600m}\n    memory: {requests: 1Gi, limits: 2Gi}\n",
            ),
            None,
        )
        .unwrap();

        assert_eq!(platform.profile("c.small").unwrap().cpu_request.format(), "300m");
        assert!(platform.profile("c.pico").is_some());
    }

    #[test]
    fn test_invalid_profile_name() {
        let err = Platform::from_config(
            &config(
                "resourceProfiles:\n  small:\n    cpu: {requests: 1, limits: 1}\n    memory: {requests: 1Gi, limits: 1Gi}\n",
            ),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProfileName { .. }));
    }

    #[test]
    fn test_invalid_profile_quantity_names_field() {
        let err = Platform::from_config(
            &config(
                "resourceProfiles:\n  c.bad:\n    cpu: {requests: lots, limits: 1}\n    memory: {requests: 1Gi, limits: 1Gi}\n",
            ),
            None,
        )
        .unwrap_err();

        match err {
            ConfigError::InvalidQuantity { field, .. } => {
                assert_eq!(field, "resourceProfiles.c.bad.cpu.requests");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_node_group_requires_capacity() {
        let err = Platform::from_config(&config("nodes:\n  pi: {count: 1, cpu: 4}\n"), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_unknown_network_override() {
        let err = Platform::from_config(
            &config("networkTypes:\n  mesh:\n    service: {type: ClusterIP}\n"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownNetworkType { .. }));
    }

    #[test]
    fn test_overrides_for_ingress_and_chart() {
        let platform = Platform::from_config(
            &config(
                "cluster:\n  name: firefly\n  domain: example.com\ningressDefaults:\n  className: nginx\nhelmChart:\n  version: 4.5.0\n",
            ),
            None,
        )
        .unwrap();

        assert_eq!(platform.ingress().class_name, "nginx");
        assert_eq!(platform.ingress().annotations.len(), 3);
        assert_eq!(platform.chart().version, "4.5.0");
        assert_eq!(platform.chart().name, "app-template");
        assert_eq!(
            platform.chart().to_value(),
            json!({
                "name": "app-template",
                "version": "4.5.0",
                "repository": {"name": "bjw-s", "namespace": "flux-system"},
            })
        );
        assert_eq!(platform.cluster().domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_profile_name_pattern() {
        assert!(is_valid_profile_name("c.small"));
        assert!(is_valid_profile_name("gpu-1.x2"));
        assert!(!is_valid_profile_name("small"));
        assert!(!is_valid_profile_name("c."));
        assert!(!is_valid_profile_name("C.small"));
        assert!(!is_valid_profile_name("a.b.c"));
    }
}
