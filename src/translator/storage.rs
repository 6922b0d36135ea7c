//! Storage layer.
//!
//! Volume entries arrive untyped from configuration. Each one is validated
//! here into a closed [`VolumeSource`] variant chosen by its `type` tag.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use crate::error::TranslateError;
use crate::quantity::{MemoryQuantity, RawQuantity};

const DEFAULT_ACCESS_MODE: &str = "ReadWriteOnce";

/// Where a volume's data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeSource {
    /// A persistent volume claim.
    Pvc {
        /// Requested size.
        size: MemoryQuantity,
        /// Storage class, cluster default when absent.
        storage_class: Option<String>,
        /// Access mode.
        access_mode: String,
    },
    /// A directory on the node.
    HostPath {
        /// Node path.
        path: String,
    },
    /// An NFS export.
    Nfs {
        /// NFS server.
        server: String,
        /// Exported path.
        path: String,
    },
}

/// A validated volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    /// Volume name.
    pub name: String,
    /// Mount path inside the container.
    pub mount: String,
    /// Whether the mount is read-only.
    pub read_only: bool,
    /// Backing storage.
    pub source: VolumeSource,
}

impl Volume {
    /// Validates one storage entry.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing or unknown `type`, missing required
    /// keys, or wrongly typed values.
    pub fn from_entry(name: &str, entry: &Value) -> Result<Self, TranslateError> {
        let entry = Entry::new(name, entry)?;

        let storage_type = entry.required_str("type")?;
        let source = match storage_type {
            "pvc" | "persistentVolumeClaim" => VolumeSource::Pvc {
                size: entry.required_quantity("size")?.memory()?,
                storage_class: entry.optional_str("storageClass")?.map(str::to_string),
                access_mode: entry
                    .optional_str("accessMode")?
                    .unwrap_or(DEFAULT_ACCESS_MODE)
                    .to_string(),
            },
            "hostPath" => VolumeSource::HostPath {
                path: entry.required_str("path")?.to_string(),
            },
            "nfs" => VolumeSource::Nfs {
                server: entry.required_str("server")?.to_string(),
                path: entry.required_str("path")?.to_string(),
            },
            other => {
                return Err(TranslateError::UnknownStorageType {
                    volume: name.to_string(),
                    storage_type: other.to_string(),
                });
            }
        };

        Ok(Self {
            name: name.to_string(),
            mount: entry.required_str("mount")?.to_string(),
            read_only: entry.optional_bool("readonly")?.unwrap_or(false),
            source,
        })
    }

    /// Renders the volume tree.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut volume = Map::new();
        volume.insert(String::from("name"), json!(self.name));
        volume.insert(String::from("mount"), json!(self.mount));
        volume.insert(String::from("readOnly"), json!(self.read_only));

        match &self.source {
            VolumeSource::Pvc {
                size,
                storage_class,
                access_mode,
            } => {
                volume.insert(String::from("type"), json!("persistentVolumeClaim"));
                volume.insert(String::from("size"), json!(size.format()));
                volume.insert(String::from("accessMode"), json!(access_mode));
                if let Some(class) = storage_class {
                    volume.insert(String::from("storageClass"), json!(class));
                }
            }
            VolumeSource::HostPath { path } => {
                volume.insert(String::from("type"), json!("hostPath"));
                volume.insert(String::from("hostPath"), json!(path));
            }
            VolumeSource::Nfs { server, path } => {
                volume.insert(String::from("type"), json!("nfs"));
                volume.insert(String::from("server"), json!(server));
                volume.insert(String::from("path"), json!(path));
            }
        }

        Value::Object(volume)
    }
}

/// Builds the storage layer, volumes in name order. Empty storage yields an
/// empty layer.
///
/// # Errors
///
/// Returns the first invalid volume's error.
pub fn storage_layer(storage: &BTreeMap<String, Value>) -> Result<Value, TranslateError> {
    if storage.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let volumes = storage
        .iter()
        .map(|(name, entry)| Volume::from_entry(name, entry).map(|v| v.to_value()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(json!({ "volumes": volumes }))
}

/// Typed accessors over one storage mapping.
struct Entry<'a> {
    volume: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Entry<'a> {
    fn new(volume: &'a str, entry: &'a Value) -> Result<Self, TranslateError> {
        match entry {
            Value::Object(map) => Ok(Self { volume, map }),
            _ => Err(TranslateError::invalid(
                format!("storage.{volume}"),
                "expected a mapping",
            )),
        }
    }

    fn field(&self, key: &str) -> String {
        format!("storage.{}.{key}", self.volume)
    }

    fn optional_str(&self, key: &str) -> Result<Option<&'a str>, TranslateError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(TranslateError::invalid(self.field(key), "expected a string")),
        }
    }

    fn required_str(&self, key: &str) -> Result<&'a str, TranslateError> {
        self.optional_str(key)?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TranslateError::missing(self.field(key)))
    }

    /// Accepts the same text-or-number forms as node and profile quantities.
    fn required_quantity(&self, key: &str) -> Result<RawQuantity, TranslateError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Err(TranslateError::missing(self.field(key))),
            Some(Value::String(s)) if s.is_empty() => Err(TranslateError::missing(self.field(key))),
            Some(value @ (Value::String(_) | Value::Number(_))) => RawQuantity::deserialize(value)
                .map_err(|e| TranslateError::invalid(self.field(key), e.to_string())),
            Some(_) => Err(TranslateError::invalid(self.field(key), "expected a quantity")),
        }
    }

    fn optional_bool(&self, key: &str) -> Result<Option<bool>, TranslateError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(TranslateError::invalid(self.field(key), "expected a boolean")),
        }
    }
}
