//! Error types for Maniforge.
//!
//! This module provides the error hierarchy for every stage of a run:
//! configuration loading, quantity parsing, translation, capacity analysis,
//! state persistence and manifest output.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Maniforge.
#[derive(Debug, Error)]
pub enum ManiforgeError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource quantity errors.
    #[error("Quantity error: {0}")]
    Quantity(#[from] QuantityError),

    /// Translation errors attributed to an application.
    #[error("Translation error: {0}")]
    Translate(#[from] AppError),

    /// Capacity analysis errors.
    #[error("Capacity error: {0}")]
    Capacity(#[from] CapacityError),

    /// State management errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Manifest output errors.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Planning errors.
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A quantity in the platform tables could not be parsed.
    #[error("Invalid quantity for {field}: {source}")]
    InvalidQuantity {
        /// Dotted path of the offending field.
        field: String,
        /// The underlying parse failure.
        #[source]
        source: QuantityError,
    },

    /// A resource profile key does not follow `<family>.<size>`.
    #[error("Invalid resource profile name '{name}': expected <family>.<size>")]
    InvalidProfileName {
        /// The offending profile key.
        name: String,
    },

    /// A network type override names a mode that does not exist.
    #[error("Unknown network type in overrides: {name}")]
    UnknownNetworkType {
        /// The unknown mode name.
        name: String,
    },

    /// The configuration file already exists (init).
    #[error("Configuration already exists: {path}")]
    AlreadyExists {
        /// Path of the existing file.
        path: PathBuf,
    },
}

/// CPU and memory quantity parse errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuantityError {
    /// The numeric part is empty or not a decimal number.
    #[error("malformed quantity '{value}'")]
    Malformed {
        /// The original text.
        value: String,
    },

    /// The unit suffix is not recognized.
    #[error("unrecognized suffix '{suffix}' in quantity '{value}'")]
    UnknownSuffix {
        /// The original text.
        value: String,
        /// The suffix that was not recognized.
        suffix: String,
    },

    /// Quantities cannot be negative.
    #[error("negative quantity '{value}'")]
    Negative {
        /// The original text.
        value: String,
    },

    /// The value is finer than one milli-core or one byte.
    #[error("quantity '{value}' is more precise than the smallest unit")]
    TooPrecise {
        /// The original text.
        value: String,
    },

    /// The normalized value does not fit the storage unit.
    #[error("quantity '{value}' is out of range")]
    Overflow {
        /// The original text.
        value: String,
    },
}

/// Errors raised while resolving one application.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslateError {
    /// The resource profile is not in the profile table.
    #[error("unknown profile '{profile}'")]
    UnknownProfile {
        /// The declared profile name.
        profile: String,
    },

    /// The network mode is not in the network type table.
    #[error("unknown network type '{network}'")]
    UnknownNetworkType {
        /// The declared network mode.
        network: String,
    },

    /// A volume declares a storage type that does not exist.
    #[error("unknown storage type '{storage_type}' for volume '{volume}'")]
    UnknownStorageType {
        /// Volume name.
        volume: String,
        /// The declared type tag.
        storage_type: String,
    },

    /// The node selector is neither a node group nor a declared selector.
    #[error("unknown nodeSelector '{selector}' (define it under top-level nodes)")]
    UnknownNodeSelector {
        /// The declared selector name.
        selector: String,
    },

    /// A required field is absent.
    #[error("missing required field '{field}'")]
    MissingRequiredField {
        /// Dotted path of the missing field.
        field: String,
    },

    /// A field is present but has the wrong shape.
    #[error("invalid field '{field}': {message}")]
    InvalidField {
        /// Dotted path of the field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// A quantity could not be parsed.
    #[error("{0}")]
    Quantity(#[from] QuantityError),
}

/// A translation error attributed to the application it came from.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("app '{app}': {error}")]
pub struct AppError {
    /// Application name.
    pub app: String,
    /// What went wrong.
    #[source]
    pub error: TranslateError,
}

/// Capacity analysis errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapacityError {
    /// An application targets a node selector that matches no node group.
    #[error("app '{app}': nodeSelector lands on unknown node group '{selector}'")]
    UnknownNodeSelector {
        /// Application name.
        app: String,
        /// The node group its selector resolves to.
        selector: String,
    },

    /// A node group with zero capacity has demand assigned to it.
    #[error("node group '{group}' has zero capacity but {demand} app(s) are scheduled onto it")]
    CapacityUndefined {
        /// Node group name.
        group: String,
        /// Number of applications targeting the group.
        demand: usize,
    },

    /// A node group's capacity or aggregate demand does not fit in a quantity.
    #[error("node group '{group}': {quantity} total overflows")]
    Overflow {
        /// Node group name.
        group: String,
        /// Which total overflowed, e.g. `cpu capacity` or `memory limits`.
        quantity: String,
    },
}

/// State management errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// State is corrupted.
    #[error("State is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// Serialization error.
    #[error("State serialization error: {message}")]
    SerializationError {
        /// Description of the serialization error.
        message: String,
    },

    /// State version mismatch.
    #[error("State version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected state version.
        expected: String,
        /// Found state version.
        found: String,
    },

    /// The state file could not be written.
    #[error("Failed to write state to {path}: {message}")]
    WriteFailed {
        /// Target path.
        path: PathBuf,
        /// Underlying failure.
        message: String,
    },
}

/// Manifest output errors.
#[derive(Debug, Error)]
pub enum OutputError {
    /// A manifest could not be rendered.
    #[error("Failed to render manifests for '{app}': {message}")]
    Render {
        /// Application name.
        app: String,
        /// Underlying failure.
        message: String,
    },

    /// A manifest file could not be written or removed.
    #[error("Failed to write {path}: {message}")]
    WriteFailed {
        /// Target path.
        path: PathBuf,
        /// Underlying failure.
        message: String,
    },
}

/// Planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Some applications failed to resolve; nothing is written.
    #[error("{count} error(s) found while resolving the configuration")]
    ResolutionFailed {
        /// Number of errors.
        count: usize,
    },
}

/// Result type alias for Maniforge operations.
pub type Result<T> = std::result::Result<T, ManiforgeError>;

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a parse error for the given source location.
    #[must_use]
    pub fn parse(message: impl Into<String>, location: Option<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location,
        }
    }
}

impl TranslateError {
    /// Creates a missing-field error.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    /// Creates an invalid-field error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Attributes this error to an application.
    #[must_use]
    pub fn for_app(self, app: impl Into<String>) -> AppError {
        AppError {
            app: app.into(),
            error: self,
        }
    }
}

impl StateError {
    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_names_the_app() {
        let err = TranslateError::UnknownProfile {
            profile: String::from("x.huge"),
        }
        .for_app("web");

        assert_eq!(err.to_string(), "app 'web': unknown profile 'x.huge'");
    }

    #[test]
    fn test_quantity_error_converts_into_translate_error() {
        let err: TranslateError = QuantityError::Negative {
            value: String::from("-1"),
        }
        .into();

        assert!(matches!(err, TranslateError::Quantity(_)));
        assert_eq!(err.to_string(), "negative quantity '-1'");
    }
}
