//! Ingress layer.

use serde_json::{Value, json};

use crate::config::IngressDefaults;

/// Builds the ingress layer for `app` under `domain`: one host, one `/`
/// prefix path to the `http` service port, and a TLS secret named after the
/// app.
#[must_use]
pub fn ingress_layer(app: &str, domain: &str, defaults: &IngressDefaults) -> Value {
    let host = format!("{app}.{domain}");

    json!({
        "ingress": {
            "className": defaults.class_name,
            "annotations": defaults.annotations,
            "host": host,
            "paths": [{
                "path": "/",
                "pathType": "Prefix",
                "port": "http",
            }],
            "tls": {
                "hosts": [host],
                "secretName": format!("{app}-tls"),
            },
        }
    })
}
