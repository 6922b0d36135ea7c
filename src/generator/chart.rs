//! `app-template` chart rendering.
//!
//! Maps the resolved tree onto the values layout of the bjw-s `app-template`
//! chart and wraps it in a Flux `HelmRelease` plus a Kustomize
//! `Kustomization`.

use serde_json::{Map, Value, json};

use crate::error::OutputError;
use crate::translator::ResolvedApp;

/// Flux `HelmRelease` API version.
pub const HELM_RELEASE_API_VERSION: &str = "helm.toolkit.fluxcd.io/v2beta2";

/// Kustomize API version.
pub const KUSTOMIZE_API_VERSION: &str = "kustomize.config.k8s.io/v1beta1";

/// Reconcile interval written into every release.
const RELEASE_INTERVAL: &str = "1m";

/// Controller and container identifier used by the chart.
const MAIN: &str = "main";

/// Renders the chart values for one app.
///
/// # Errors
///
/// Returns an error when the tree has no image.
pub fn render_values(app: &ResolvedApp) -> Result<Value, OutputError> {
    let image = app
        .field("image")
        .cloned()
        .ok_or_else(|| render_error(app, "resolved tree has no image"))?;

    let mut container = Map::new();
    container.insert(String::from("image"), image);
    container.insert(
        String::from("env"),
        app.field("env").cloned().unwrap_or_else(|| json!({})),
    );
    if let Some(resources) = app.field("resources") {
        container.insert(String::from("resources"), resources.clone());
    }

    let mut values = Map::new();
    values.insert(
        String::from("controllers"),
        json!({
            MAIN: {
                "type": app.workload(),
                "containers": { MAIN: container },
            }
        }),
    );
    values.insert(
        String::from("defaultPodOptions"),
        app.field("podOptions").cloned().unwrap_or_else(|| json!({})),
    );

    if let Some(service) = app.field("service") {
        values.insert(String::from("service"), render_service(service, app.field("ports")));
    }

    if let Some(Value::Array(volumes)) = app.field("volumes") {
        let persistence: Map<String, Value> = volumes.iter().filter_map(render_volume).collect();
        if !persistence.is_empty() {
            values.insert(String::from("persistence"), Value::Object(persistence));
        }
    }

    if let Some(ingress) = app.field("ingress") {
        values.insert(String::from("ingress"), render_ingress(ingress));
    }

    Ok(Value::Object(values))
}

fn render_service(service: &Value, ports: Option<&Value>) -> Value {
    let ports: Map<String, Value> = ports
        .and_then(Value::as_array)
        .map(|ports| {
            ports
                .iter()
                .filter_map(|port| {
                    let name = port.get("name")?.as_str()?.to_string();
                    let mut entry = Map::new();
                    entry.insert(String::from("enabled"), json!(true));
                    for key in ["port", "targetPort", "protocol", "nodePort"] {
                        if let Some(value) = port.get(key) {
                            entry.insert(key.to_string(), value.clone());
                        }
                    }
                    Some((name, Value::Object(entry)))
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        MAIN: {
            "controller": MAIN,
            "type": service.get("type").cloned().unwrap_or_else(|| json!("ClusterIP")),
            "ports": ports,
        }
    })
}

fn render_volume(volume: &Value) -> Option<(String, Value)> {
    let name = volume.get("name")?.as_str()?.to_string();

    let mut entry = Map::new();
    entry.insert(String::from("enabled"), json!(true));
    entry.insert(String::from("type"), volume.get("type")?.clone());
    entry.insert(
        String::from("globalMounts"),
        json!([{
            "path": volume.get("mount")?,
            "readOnly": volume.get("readOnly").cloned().unwrap_or(json!(false)),
        }]),
    );
    for key in ["hostPath", "size", "accessMode", "storageClass", "server", "path"] {
        if let Some(value) = volume.get(key) {
            entry.insert(key.to_string(), value.clone());
        }
    }

    Some((name, Value::Object(entry)))
}

fn render_ingress(ingress: &Value) -> Value {
    let paths: Vec<Value> = ingress
        .get("paths")
        .and_then(Value::as_array)
        .map(|paths| {
            paths
                .iter()
                .map(|path| {
                    json!({
                        "path": path.get("path").cloned().unwrap_or(json!("/")),
                        "pathType": path.get("pathType").cloned().unwrap_or(json!("Prefix")),
                        "service": {
                            "identifier": MAIN,
                            "port": path.get("port").cloned().unwrap_or(json!("http")),
                        },
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let mut main = Map::new();
    main.insert(String::from("enabled"), json!(true));
    for key in ["className", "annotations"] {
        if let Some(value) = ingress.get(key) {
            main.insert(key.to_string(), value.clone());
        }
    }
    main.insert(
        String::from("hosts"),
        json!([{
            "host": ingress.get("host").cloned().unwrap_or(Value::Null),
            "paths": paths,
        }]),
    );
    if let Some(tls) = ingress.get("tls") {
        main.insert(String::from("tls"), json!([tls]));
    }

    json!({ MAIN: main })
}

/// Renders the Flux `HelmRelease` for one app, against the chart recorded
/// in its resolved tree.
///
/// # Errors
///
/// Returns an error when the tree has no complete chart reference or the
/// chart values cannot be rendered.
pub fn helm_release(app: &ResolvedApp) -> Result<Value, OutputError> {
    let chart = app
        .field("chart")
        .ok_or_else(|| render_error(app, "resolved tree has no chart"))?;
    let chart_field = |pointer: &str| {
        chart
            .pointer(pointer)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                render_error(
                    app,
                    &format!("chart reference has no '{}'", pointer[1..].replace('/', ".")),
                )
            })
    };
    let chart_name = chart_field("/name")?;
    let version = chart_field("/version")?;
    let repository = chart_field("/repository/name")?;
    let repository_namespace = chart_field("/repository/namespace")?;

    Ok(json!({
        "apiVersion": HELM_RELEASE_API_VERSION,
        "kind": "HelmRelease",
        "metadata": {
            "name": app.name,
            "namespace": app.namespace,
        },
        "spec": {
            "interval": RELEASE_INTERVAL,
            "chart": {
                "spec": {
                    "chart": chart_name,
                    "version": version,
                    "sourceRef": {
                        "kind": "HelmRepository",
                        "name": repository,
                        "namespace": repository_namespace,
                    },
                },
            },
            "values": render_values(app)?,
        },
    }))
}

fn render_error(app: &ResolvedApp, message: &str) -> OutputError {
    OutputError::Render {
        app: app.name.clone(),
        message: message.to_string(),
    }
}

/// Renders the Kustomize `Kustomization` that lists the release.
#[must_use]
pub fn kustomization(app: &ResolvedApp, release_file: &str) -> Value {
    json!({
        "apiVersion": KUSTOMIZE_API_VERSION,
        "kind": "Kustomization",
        "namespace": app.namespace,
        "resources": [release_file],
    })
}
