//! The fully resolved form of one application.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ResourceRequirements;

/// One application after translation.
///
/// `values` is the merged configuration tree; the other fields are typed
/// views the capacity planner and the generator read without walking the
/// tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedApp {
    /// Application name.
    pub name: String,
    /// Target namespace.
    pub namespace: String,
    /// Node group the app's selector lands on, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_group: Option<String>,
    /// Requests and limits from the resolved profile, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    /// The merged configuration tree.
    pub values: Value,
}

impl ResolvedApp {
    /// Returns a top-level field of the tree.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the workload kind.
    #[must_use]
    pub fn workload(&self) -> &str {
        self.field("workload")
            .and_then(Value::as_str)
            .unwrap_or("deployment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let app = ResolvedApp {
            name: String::from("web"),
            namespace: String::from("default"),
            node_group: None,
            resources: None,
            values: json!({
                "image": {"repository": "nginx", "tag": "1.27"},
                "workload": "statefulset",
                "env": {},
            }),
        };

        assert_eq!(app.field("image").unwrap()["tag"], json!("1.27"));
        assert_eq!(app.workload(), "statefulset");
        assert!(app.field("service").is_none());

        let bare = ResolvedApp {
            values: json!({}),
            ..app
        };
        assert_eq!(bare.workload(), "deployment");
    }

    #[test]
    fn test_state_round_trip_keeps_typed_fields() {
        let app = ResolvedApp {
            name: String::from("web"),
            namespace: String::from("web"),
            node_group: Some(String::from("pi")),
            resources: crate::config::Platform::builtin().unwrap().profile("c.small").copied(),
            values: json!({"workload": "deployment"}),
        };

        let text = serde_json::to_string(&app).unwrap();
        assert!(text.contains("\"cpuRequest\":\"250m\""));
        assert!(text.contains("\"nodeGroup\":\"pi\""));
        let back: ResolvedApp = serde_json::from_str(&text).unwrap();
        assert_eq!(back, app);
    }
}
