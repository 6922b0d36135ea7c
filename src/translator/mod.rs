//! Translation engine.
//!
//! Expands a terse [`AppDeclaration`] into a [`ResolvedApp`] by merging
//! layers from lowest to highest precedence:
//!
//! 1. cluster skeleton (`workload`, `namespace`, `env`, `chart`)
//! 2. resource profile
//! 3. node selector
//! 4. network type
//! 5. storage
//! 6. ingress
//! 7. explicit app fields
//!
//! Each layer is merged over the accumulated result with
//! [`merge`](crate::merge::merge). Translation is pure: the same declaration
//! and platform always produce the same tree.

mod image;
mod ingress;
mod network;
mod resolved;
mod storage;

pub use image::{DEFAULT_TAG, ImageRef};
pub use ingress::ingress_layer;
pub use network::{ResolvedPort, network_layer, resolve_ports};
pub use resolved::ResolvedApp;
pub use storage::{Volume, VolumeSource, storage_layer};

use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::{AppDeclaration, ChartReference, NetworkMode, Platform, ResourceRequirements};
use crate::error::{AppError, TranslateError};
use crate::merge::merge_layers;

/// Workload kinds the chart can render.
pub const WORKLOAD_KINDS: &[&str] = &["deployment", "statefulset", "daemonset", "cronjob", "job"];

/// Namespace used when an app names none.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Result of translating every app in a configuration.
#[derive(Debug, Default)]
pub struct TranslationOutcome {
    /// Apps that resolved, keyed by name.
    pub resolved: BTreeMap<String, ResolvedApp>,
    /// Every per-app error, in app name order.
    pub errors: Vec<AppError>,
}

impl TranslationOutcome {
    /// Returns true when every app resolved.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Translates app declarations against a platform.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    platform: &'a Platform,
}

impl<'a> Translator<'a> {
    /// Creates a translator over the given platform tables.
    #[must_use]
    pub const fn new(platform: &'a Platform) -> Self {
        Self { platform }
    }

    /// Translates one app.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, attributed to `name`.
    pub fn translate(&self, name: &str, app: &AppDeclaration) -> Result<ResolvedApp, AppError> {
        self.resolve(name, app).map_err(|e| e.for_app(name))
    }

    /// Translates every app, collecting all errors instead of stopping at
    /// the first.
    #[must_use]
    pub fn translate_all(&self, apps: &BTreeMap<String, AppDeclaration>) -> TranslationOutcome {
        let mut outcome = TranslationOutcome::default();

        for (name, app) in apps {
            match self.translate(name, app) {
                Ok(resolved) => {
                    outcome.resolved.insert(name.clone(), resolved);
                }
                Err(e) => {
                    warn!("{e}");
                    outcome.errors.push(e);
                }
            }
        }

        debug!(
            "Translated {} app(s), {} error(s)",
            outcome.resolved.len(),
            outcome.errors.len()
        );
        outcome
    }

    fn resolve(&self, name: &str, app: &AppDeclaration) -> Result<ResolvedApp, TranslateError> {
        let cluster = self.platform.cluster();

        let image = ImageRef::parse(
            app.image
                .as_deref()
                .ok_or_else(|| TranslateError::missing("image"))?,
        )?;

        let profile_name = app.profile.as_deref().or(cluster.profile.as_deref());
        let resources = profile_name
            .map(|profile| {
                self.platform
                    .profile(profile)
                    .copied()
                    .ok_or_else(|| TranslateError::UnknownProfile {
                        profile: profile.to_string(),
                    })
            })
            .transpose()?;

        let selector = app
            .node_selector
            .as_deref()
            .or(cluster.node_selector.as_deref())
            .map(|selector| {
                self.platform
                    .node_selector(selector)
                    .ok_or_else(|| TranslateError::UnknownNodeSelector {
                        selector: selector.to_string(),
                    })
            })
            .transpose()?;
        let selector_layer =
            selector.map(|s| json!({ "podOptions": { "nodeSelector": s.labels } }));

        let network_name = app.network.as_deref().unwrap_or("clusterip");
        let unknown_network = || TranslateError::UnknownNetworkType {
            network: network_name.to_string(),
        };
        let mode: NetworkMode = network_name.parse().map_err(|_| unknown_network())?;
        let template = self.platform.network(mode).ok_or_else(unknown_network)?;
        let network = network_layer(mode, template, &app.ports)?;

        let storage = storage_layer(&app.storage)?;

        let ingress = cluster
            .domain
            .as_deref()
            .filter(|_| app.ingress_enabled())
            .map(|domain| ingress_layer(name, domain, self.platform.ingress()));

        let explicit = explicit_layer(app, &image)?;

        let values = merge_layers(
            [
                Some(skeleton(self.platform.chart())),
                resources.as_ref().map(resources_layer),
                selector_layer,
                Some(network),
                Some(storage),
                ingress,
                Some(explicit),
            ]
            .into_iter()
            .flatten(),
        );

        debug!("Resolved app '{name}' ({image}, network {mode})");
        Ok(ResolvedApp {
            name: name.to_string(),
            namespace: app
                .namespace
                .clone()
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            node_group: selector.map(|s| s.node_group.clone()),
            resources,
            values,
        })
    }
}

fn skeleton(chart: &ChartReference) -> Value {
    json!({
        "workload": "deployment",
        "namespace": DEFAULT_NAMESPACE,
        "env": {},
        "chart": chart.to_value(),
    })
}

fn resources_layer(resources: &ResourceRequirements) -> Value {
    json!({ "resources": resources.to_value() })
}

fn explicit_layer(app: &AppDeclaration, image: &ImageRef) -> Result<Value, TranslateError> {
    let mut layer = Map::new();
    layer.insert(String::from("image"), image.to_value());

    if let Some(workload) = &app.workload {
        if !WORKLOAD_KINDS.contains(&workload.as_str()) {
            return Err(TranslateError::invalid(
                "type",
                format!("unsupported workload kind '{workload}'"),
            ));
        }
        layer.insert(String::from("workload"), json!(workload));
    }

    if let Some(namespace) = &app.namespace {
        layer.insert(String::from("namespace"), json!(namespace));
    }

    if !app.env.is_empty() {
        layer.insert(String::from("env"), json!(app.env));
    }

    Ok(Value::Object(layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManiforgeConfig;

    const PLATFORM: &str = r"
cluster:
  name: firefly
  domain: example.com
  defaults:
    profile: c.small
    nodeSelector: pi
nodes:
  pi: {count: 2, cpu: 4, memory: 16Gi}
  nuc: {count: 1, cpu: 8, memory: 32Gi}
";

    fn platform(yaml: &str) -> Platform {
        let config: ManiforgeConfig = serde_yaml::from_str(yaml).unwrap();
        Platform::from_config(&config, None).unwrap()
    }

    fn app(yaml: &str) -> AppDeclaration {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_minimal_app_uses_defaults() {
        let platform = platform(PLATFORM);
        let resolved = Translator::new(&platform)
            .translate("web", &app("image: nginx"))
            .unwrap();

        assert_eq!(resolved.namespace, "default");
        assert_eq!(resolved.node_group.as_deref(), Some("pi"));
        assert_eq!(
            resolved.values,
            json!({
                "image": {"repository": "nginx", "tag": "latest"},
                "workload": "deployment",
                "namespace": "default",
                "env": {},
                "chart": {
                    "name": "app-template",
                    "version": "4.4.0",
                    "repository": {"name": "bjw-s", "namespace": "flux-system"},
                },
                "resources": {
                    "requests": {"cpu": "250m", "memory": "512Mi"},
                    "limits": {"cpu": "500m", "memory": "1Gi"},
                },
                "podOptions": {"nodeSelector": {"type": "pi"}},
                "ports": [{"name": "http", "port": 80, "targetPort": 8080, "protocol": "TCP"}],
                "service": {"type": "ClusterIP"},
                "ingress": {
                    "className": "traefik",
                    "annotations": {
                        "cert-manager.io/cluster-issuer": "letsencrypt-dns",
                        "traefik.ingress.kubernetes.io/router.entrypoints": "websecure",
                        "traefik.ingress.kubernetes.io/router.tls": "true",
                    },
                    "host": "web.example.com",
                    "paths": [{"path": "/", "pathType": "Prefix", "port": "http"}],
                    "tls": {"hosts": ["web.example.com"], "secretName": "web-tls"},
                },
            })
        );
    }

    #[test]
    fn test_explicit_fields_win() {
        let platform = platform(PLATFORM);
        let resolved = Translator::new(&platform)
            .translate(
                "db",
                &app("image: postgres:16\ntype: statefulset\nnamespace: data\nprofile: r.large\nnodeSelector: nuc\nenv: {TZ: UTC}\ningress: false"),
            )
            .unwrap();

        assert_eq!(resolved.namespace, "data");
        assert_eq!(resolved.values["workload"], json!("statefulset"));
        assert_eq!(resolved.values["namespace"], json!("data"));
        assert_eq!(resolved.values["env"], json!({"TZ": "UTC"}));
        assert_eq!(resolved.values["resources"]["limits"]["memory"], json!("8Gi"));
        assert_eq!(resolved.values["podOptions"]["nodeSelector"], json!({"type": "nuc"}));
        assert!(resolved.field("ingress").is_none());

        let resources = resolved.resources.unwrap();
        assert_eq!(resources.cpu_request.format(), "500m");
    }

    #[test]
    fn test_host_network_merges_pod_options() {
        let platform = platform(PLATFORM);
        let resolved = Translator::new(&platform)
            .translate("ha", &app("image: homeassistant/home-assistant:2024.6\nnetwork: host"))
            .unwrap();

        assert!(resolved.field("service").is_none());
        assert_eq!(
            resolved.values["podOptions"],
            json!({
                "nodeSelector": {"type": "pi"},
                "hostNetwork": true,
                "dnsPolicy": "ClusterFirstWithHostNet",
            })
        );
        assert_eq!(resolved.values["ports"], json!([]));
    }

    #[test]
    fn test_no_profile_and_no_default_means_no_resources() {
        let platform = platform("nodes: {}");
        let resolved = Translator::new(&platform)
            .translate("web", &app("image: nginx"))
            .unwrap();

        assert!(resolved.resources.is_none());
        assert!(resolved.field("resources").is_none());
        assert!(resolved.field("podOptions").is_none());
        assert!(resolved.field("ingress").is_none());
        assert!(resolved.node_group.is_none());
    }

    #[test]
    fn test_extra_selector_resolves_to_its_node_group() {
        let platform = platform(&format!(
            "{PLATFORM}nodeSelectors:\n  arm:\n    labels: {{kubernetes.io/arch: arm64}}\n    nodeGroup: pi\n"
        ));
        let resolved = Translator::new(&platform)
            .translate("web", &app("image: nginx\nnodeSelector: arm"))
            .unwrap();

        assert_eq!(resolved.node_group.as_deref(), Some("pi"));
        assert_eq!(
            resolved.values["podOptions"]["nodeSelector"],
            json!({"kubernetes.io/arch": "arm64"})
        );
    }

    #[test]
    fn test_storage_is_merged() {
        let platform = platform(PLATFORM);
        let resolved = Translator::new(&platform)
            .translate(
                "web",
                &app("image: nginx\nstorage:\n  data: {type: pvc, mount: /data, size: 1Gi}"),
            )
            .unwrap();

        assert_eq!(resolved.values["volumes"][0]["size"], json!("1Gi"));
    }

    #[test]
    fn test_errors() {
        let platform = platform(PLATFORM);
        let translator = Translator::new(&platform);

        let cases = [
            ("profile: c.small", TranslateError::missing("image")),
            (
                "image: nginx\nprofile: x.huge",
                TranslateError::UnknownProfile {
                    profile: String::from("x.huge"),
                },
            ),
            (
                "image: nginx\nnodeSelector: gpu",
                TranslateError::UnknownNodeSelector {
                    selector: String::from("gpu"),
                },
            ),
            (
                "image: nginx\nnetwork: mesh",
                TranslateError::UnknownNetworkType {
                    network: String::from("mesh"),
                },
            ),
            ("image: nginx\nnetwork: nodeport", TranslateError::missing("ports")),
            (
                "image: nginx\nstorage:\n  x: {type: tmpfs, mount: /x}",
                TranslateError::UnknownStorageType {
                    volume: String::from("x"),
                    storage_type: String::from("tmpfs"),
                },
            ),
        ];

        for (yaml, expected) in cases {
            let err = translator.translate("web", &app(yaml)).unwrap_err();
            assert_eq!(err.app, "web");
            assert_eq!(err.error, expected, "for {yaml}");
        }

        let err = translator
            .translate("web", &app("image: nginx\ntype: pod"))
            .unwrap_err();
        assert!(matches!(err.error, TranslateError::InvalidField { .. }));
    }

    #[test]
    fn test_translate_all_collects_every_error() {
        let platform = platform(PLATFORM);
        let apps: BTreeMap<String, AppDeclaration> = serde_yaml::from_str(
            "a: {image: nginx, profile: x.huge}\nb: {image: nginx}\nc: {network: mesh, image: nginx}\n",
        )
        .unwrap();

        let outcome = Translator::new(&platform).translate_all(&apps);
        assert!(!outcome.is_success());
        assert_eq!(outcome.resolved.keys().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(
            outcome.errors.iter().map(|e| e.app.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
    }

    #[test]
    fn test_translation_is_idempotent() {
        let platform = platform(PLATFORM);
        let translator = Translator::new(&platform);
        let declaration = app(
            "image: ghcr.io/org/app:v1\nports:\n  - {name: http, port: 80}\n  - {name: metrics, port: 9090}\nenv: {B: '2', A: '1'}",
        );

        let first = translator.translate("app", &declaration).unwrap();
        let second = translator.translate("app", &declaration).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.values).unwrap(),
            serde_json::to_string(&second.values).unwrap()
        );
        assert_eq!(first.values["ports"][1]["name"], json!("metrics"));
    }
}
