//! Network layer: ports, service and pod-level network options.

use serde_json::{Map, Value, json};

use crate::config::{NetworkMode, NetworkTemplate, PortDeclaration, ServiceType};
use crate::error::TranslateError;

const PROTOCOLS: &[&str] = &["TCP", "UDP", "SCTP"];

/// A port after defaults are filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPort {
    /// Port name.
    pub name: String,
    /// Service port.
    pub port: u16,
    /// Container port.
    pub target_port: u16,
    /// Protocol.
    pub protocol: String,
    /// Node port, only kept for `NodePort` services.
    pub node_port: Option<u16>,
}

impl ResolvedPort {
    /// The port synthesized for `clusterip` apps that declare none.
    #[must_use]
    pub fn default_http() -> Self {
        Self {
            name: String::from("http"),
            port: 80,
            target_port: 8080,
            protocol: String::from("TCP"),
            node_port: None,
        }
    }

    fn to_value(&self) -> Value {
        let mut port = json!({
            "name": self.name,
            "port": self.port,
            "targetPort": self.target_port,
            "protocol": self.protocol,
        });
        if let (Some(node_port), Value::Object(map)) = (self.node_port, &mut port) {
            map.insert(String::from("nodePort"), json!(node_port));
        }
        port
    }
}

/// Resolves declared ports against a network mode.
///
/// # Errors
///
/// Returns an error when a mode that needs explicit ports has none, or a
/// port names an unsupported protocol.
pub fn resolve_ports(
    mode: NetworkMode,
    service: Option<ServiceType>,
    ports: &[PortDeclaration],
) -> Result<Vec<ResolvedPort>, TranslateError> {
    if ports.is_empty() {
        return match mode {
            NetworkMode::ClusterIp => Ok(vec![ResolvedPort::default_http()]),
            _ if mode.requires_ports() => Err(TranslateError::missing("ports")),
            _ => Ok(Vec::new()),
        };
    }

    ports
        .iter()
        .enumerate()
        .map(|(i, declared)| {
            let protocol = declared
                .protocol
                .as_deref()
                .map_or_else(|| String::from("TCP"), str::to_ascii_uppercase);
            if !PROTOCOLS.contains(&protocol.as_str()) {
                return Err(TranslateError::invalid(
                    format!("ports[{i}].protocol"),
                    format!("unsupported protocol '{protocol}'"),
                ));
            }

            Ok(ResolvedPort {
                name: declared.name.clone().unwrap_or_else(|| format!("port-{i}")),
                port: declared.port,
                target_port: declared.target_port.unwrap_or(declared.port),
                protocol,
                node_port: declared
                    .node_port
                    .filter(|_| service == Some(ServiceType::NodePort)),
            })
        })
        .collect()
}

/// Builds the network layer: `ports`, `service` (absent when the template
/// has no service kind) and `podOptions`.
///
/// # Errors
///
/// Propagates port resolution errors.
pub fn network_layer(
    mode: NetworkMode,
    template: &NetworkTemplate,
    ports: &[PortDeclaration],
) -> Result<Value, TranslateError> {
    let resolved = resolve_ports(mode, template.service, ports)?;

    let mut layer = Map::new();
    layer.insert(
        String::from("ports"),
        Value::Array(resolved.iter().map(ResolvedPort::to_value).collect()),
    );

    if let Some(service) = template.service {
        layer.insert(String::from("service"), json!({ "type": service.as_str() }));
    }

    if !template.pod_options.is_empty() {
        let options: Map<String, Value> = template
            .pod_options
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        layer.insert(String::from("podOptions"), Value::Object(options));
    }

    Ok(Value::Object(layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;

    fn port(yaml: &str) -> PortDeclaration {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn layer(mode: NetworkMode, ports: &[PortDeclaration]) -> Result<Value, TranslateError> {
        let platform = Platform::builtin().unwrap();
        network_layer(mode, platform.network(mode).unwrap(), ports)
    }

    #[test]
    fn test_clusterip_synthesizes_http() {
        let value = layer(NetworkMode::ClusterIp, &[]).unwrap();
        assert_eq!(
            value,
            json!({
                "ports": [{"name": "http", "port": 80, "targetPort": 8080, "protocol": "TCP"}],
                "service": {"type": "ClusterIP"},
            })
        );
    }

    #[test]
    fn test_nodeport_and_loadbalancer_require_ports() {
        for mode in [NetworkMode::NodePort, NetworkMode::LoadBalancer] {
            assert_eq!(layer(mode, &[]).unwrap_err(), TranslateError::missing("ports"));
        }
    }

    #[test]
    fn test_host_network_has_no_service() {
        let value = layer(NetworkMode::Host, &[port("port: 8123")]).unwrap();
        assert!(value.get("service").is_none());
        assert_eq!(value["podOptions"]["hostNetwork"], json!(true));
        assert_eq!(value["podOptions"]["dnsPolicy"], json!("ClusterFirstWithHostNet"));
        assert_eq!(value["ports"][0]["name"], json!("port-0"));
    }

    #[test]
    fn test_port_defaults_and_order() {
        let ports = [port("port: 53\nprotocol: udp"), port("name: web\nport: 80\ntargetPort: 8080")];
        let value = layer(NetworkMode::ClusterIp, &ports).unwrap();

        assert_eq!(
            value["ports"],
            json!([
                {"name": "port-0", "port": 53, "targetPort": 53, "protocol": "UDP"},
                {"name": "web", "port": 80, "targetPort": 8080, "protocol": "TCP"},
            ])
        );
    }

    #[test]
    fn test_node_port_kept_only_for_nodeport_services() {
        let ports = [port("port: 80\nnodePort: 30080")];

        let nodeport = layer(NetworkMode::NodePort, &ports).unwrap();
        assert_eq!(nodeport["ports"][0]["nodePort"], json!(30080));

        let clusterip = layer(NetworkMode::ClusterIp, &ports).unwrap();
        assert!(clusterip["ports"][0].get("nodePort").is_none());
    }

    #[test]
    fn test_unsupported_protocol() {
        let err = layer(NetworkMode::ClusterIp, &[port("port: 80\nprotocol: quic")]).unwrap_err();
        assert!(matches!(err, TranslateError::InvalidField { .. }));
    }
}
