//! Recursive structural merge of configuration trees.
//!
//! Trees are `serde_json::Value`s: null, booleans, numbers, strings, arrays
//! and objects. Objects use a key-sorted map, so equality and serialized
//! output never depend on insertion order.
//!
//! Merge rules:
//! - two objects merge key by key over the union of their keys;
//! - for any other pairing the override replaces the base outright, arrays
//!   included (arrays are never merged element by element);
//! - keys present on only one side pass through untouched.

use serde_json::Value;

/// Merges `overrides` on top of `base` and returns the result.
#[must_use]
pub fn merge(mut base: Value, overrides: Value) -> Value {
    merge_into(&mut base, overrides);
    base
}

/// Merges `overrides` into `base` in place.
pub fn merge_into(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Folds layers left to right: each layer overrides everything before it.
#[must_use]
pub fn merge_layers<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    layers
        .into_iter()
        .fold(Value::Object(serde_json::Map::new()), merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_merge_key_by_key() {
        let base = json!({"podOptions": {"hostNetwork": true, "dnsPolicy": "ClusterFirst"}});
        let overrides = json!({"podOptions": {"nodeSelector": {"type": "pi"}}});

        assert_eq!(
            merge(base, overrides),
            json!({"podOptions": {
                "hostNetwork": true,
                "dnsPolicy": "ClusterFirst",
                "nodeSelector": {"type": "pi"}
            }})
        );
    }

    #[test]
    fn test_arrays_are_replaced_not_merged() {
        let base = json!({"ports": [{"port": 80}, {"port": 443}]});
        let overrides = json!({"ports": [{"port": 8080}]});

        assert_eq!(merge(base, overrides), json!({"ports": [{"port": 8080}]}));
    }

    #[test]
    fn test_scalar_replaces_object_and_back() {
        assert_eq!(merge(json!({"a": {"b": 1}}), json!({"a": 2})), json!({"a": 2}));
        assert_eq!(merge(json!({"a": 2}), json!({"a": {"b": 1}})), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_one_sided_keys_pass_through() {
        let merged = merge(json!({"left": 1}), json!({"right": 2}));
        assert_eq!(merged, json!({"left": 1, "right": 2}));
    }

    #[test]
    fn test_not_commutative() {
        let a = json!({"k": "a"});
        let b = json!({"k": "b"});
        assert_eq!(merge(a.clone(), b.clone()), json!({"k": "b"}));
        assert_eq!(merge(b, a), json!({"k": "a"}));
    }

    #[test]
    fn test_associative_under_fixed_order() {
        let a = json!({"x": {"a": 1}, "y": [1]});
        let b = json!({"x": {"b": 2}, "y": [2]});
        let c = json!({"x": {"a": 3}});

        let left = merge(merge(a.clone(), b.clone()), c.clone());
        let right = merge(a, merge(b, c));
        assert_eq!(left, right);
    }

    #[test]
    fn test_last_layer_wins_regardless_of_earlier_layers() {
        let layers = vec![
            json!({"resources": {"limits": {"cpu": "500m"}}, "workload": "deployment"}),
            json!({"podOptions": {"nodeSelector": {"type": "pi"}}}),
            json!({"podOptions": {"hostNetwork": true}, "workload": "statefulset"}),
            json!({"volumes": {}}),
            json!({"ingress": {"enabled": true}}),
            json!({"workload": "daemonset", "resources": {"limits": {"cpu": "1"}}}),
        ];

        let merged = merge_layers(layers);
        assert_eq!(merged["workload"], json!("daemonset"));
        assert_eq!(merged["resources"]["limits"]["cpu"], json!("1"));
        assert_eq!(merged["podOptions"]["hostNetwork"], json!(true));
    }

    #[test]
    fn test_key_order_is_irrelevant_for_equality() {
        let a: Value = serde_json::from_str(r#"{"a": 1, "b": {"c": 2, "d": 3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b": {"d": 3, "c": 2}, "a": 1}"#).unwrap();
        assert_eq!(a, b);
    }
}
