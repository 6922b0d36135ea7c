//! Configuration hashing for change detection.
//!
//! Trees are hashed through their JSON encoding. Objects are key-sorted, so
//! two trees that compare equal always hash equal.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::spec::ManiforgeConfig;

/// Hasher for computing configuration hashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigHasher;

impl ConfigHasher {
    /// Creates a new configuration hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a hash of the whole configuration file.
    #[must_use]
    pub fn hash_config(&self, config: &ManiforgeConfig) -> String {
        self.hash_serializable(config)
    }

    /// Computes a hash of one resolved tree.
    #[must_use]
    pub fn hash_value(&self, value: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Computes a hash of anything serializable, via its canonical tree.
    #[must_use]
    pub fn hash_serializable<T: Serialize>(&self, item: &T) -> String {
        let value = serde_json::to_value(item).unwrap_or(Value::Null);
        self.hash_value(&value)
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_deterministic() {
        let hasher = ConfigHasher::new();
        let tree = json!({"image": {"repository": "nginx", "tag": "latest"}});

        assert_eq!(hasher.hash_value(&tree), hasher.hash_value(&tree.clone()));
        assert_eq!(hasher.hash_value(&tree).len(), 64);
    }

    #[test]
    fn test_hash_ignores_key_order() {
        let hasher = ConfigHasher::new();
        let a: Value = serde_json::from_str(r#"{"a": 1, "b": [1, 2]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b": [1, 2], "a": 1}"#).unwrap();

        assert_eq!(hasher.hash_value(&a), hasher.hash_value(&b));
    }

    #[test]
    fn test_different_trees_different_hash() {
        let hasher = ConfigHasher::new();
        let a = json!({"ports": [80, 443]});
        let b = json!({"ports": [443, 80]});

        assert_ne!(hasher.hash_value(&a), hasher.hash_value(&b));
    }

    #[test]
    fn test_hash_config_changes_with_apps() {
        let hasher = ConfigHasher::new();
        let empty = ManiforgeConfig::default();
        let one: ManiforgeConfig = serde_yaml::from_str("apps:\n  web:\n    image: nginx\n").unwrap();

        assert_ne!(hasher.hash_config(&empty), hasher.hash_config(&one));
    }

    #[test]
    fn test_short_hash() {
        let hasher = ConfigHasher::new();
        let short = hasher.short_hash("abcdef1234567890abcdef1234567890");

        assert_eq!(short, "abcdef12");
        assert_eq!(short.len(), 8);
    }

    #[test]
    fn test_short_hash_of_short_input() {
        assert_eq!(ConfigHasher::new().short_hash("abc"), "abc");
    }
}
