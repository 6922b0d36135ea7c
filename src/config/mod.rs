//! Configuration module for Maniforge.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `maniforge.yaml` and the resource profile file
//! - Validation of configuration values
//! - Building the immutable platform lookup tables
//! - Computing tree hashes for change detection

mod hash;
mod parser;
mod platform;
mod spec;
mod validator;

pub use hash::ConfigHasher;
pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, DEFAULT_PROFILES_FILE, PROFILES_PATH_ENV,
    find_config_file,
};
pub use platform::{
    ChartReference, ClusterDefaults, IngressDefaults, NetworkMode, NetworkTemplate, NodeGroup,
    NodeSelector, Platform, ResourceRequirements, ServiceType,
};
pub use spec::{
    AppDeclaration, ClusterConfig, ClusterDefaultsSpec, HelmChartSpec, HelmRepositorySpec,
    IngressDefaultsSpec, ManiforgeConfig, NetworkTemplateSpec, NodeGroupSpec, NodeSelectorSpec,
    OutputConfig, PortDeclaration, ProfileFile, RequestLimitSpec, ResourceProfileSpec,
    ServiceTemplateSpec,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
