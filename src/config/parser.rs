//! Configuration parser for loading `maniforge.yaml` and the resource
//! profile file.
//!
//! Values come from the YAML file first, then `MANIFORGE_*` environment
//! variables override individual settings.

use crate::error::{ConfigError, ManiforgeError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::{ManiforgeConfig, ProfileFile};

/// Environment variable naming the resource profile file.
pub const PROFILES_PATH_ENV: &str = "MANIFORGE_RESOURCE_PROFILES_YAML";

/// Profile file used when [`PROFILES_PATH_ENV`] is unset.
pub const DEFAULT_PROFILES_FILE: &str = "resource-profiles.yaml";

/// Configuration parser for loading Maniforge configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ManiforgeConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = read_file(path)?;
        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ManiforgeConfig> {
        debug!("Parsing YAML configuration");

        let config: ManiforgeConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            ConfigError::parse(format!("YAML parse error: {e}"), location)
        })?;

        debug!(
            "Parsed configuration for cluster '{}' with {} app(s)",
            config.cluster.name,
            config.apps.len()
        );
        Ok(config)
    }

    /// Loads configuration with environment variable overrides.
    ///
    /// Recognized variables: `MANIFORGE_CLUSTER_DOMAIN` and
    /// `MANIFORGE_OUTPUT_DIR`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<ManiforgeConfig> {
        let mut config = self.load_file(path)?;
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(config: &mut ManiforgeConfig) {
        if let Ok(domain) = std::env::var("MANIFORGE_CLUSTER_DOMAIN") {
            debug!("Overriding cluster.domain from environment");
            config.cluster.domain = Some(domain).filter(|d| !d.is_empty());
        }

        if let Ok(dir) = std::env::var("MANIFORGE_OUTPUT_DIR") {
            debug!("Overriding output.directory from environment");
            config.output.directory = PathBuf::from(dir);
        }
    }

    /// Resolves the resource profile file path.
    ///
    /// `MANIFORGE_RESOURCE_PROFILES_YAML` wins; otherwise
    /// `resource-profiles.yaml` next to the configuration.
    #[must_use]
    pub fn profiles_path(&self) -> PathBuf {
        self.profiles_path_with(std::env::var(PROFILES_PATH_ENV).ok())
    }

    fn profiles_path_with(&self, env_override: Option<String>) -> PathBuf {
        env_override.map_or_else(|| self.resolve(DEFAULT_PROFILES_FILE), PathBuf::from)
    }

    /// Loads the resource profile file if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_profiles(&self) -> Result<Option<ProfileFile>> {
        Self::load_profiles_from(&self.profiles_path())
    }

    fn load_profiles_from(path: &Path) -> Result<Option<ProfileFile>> {
        if !path.exists() {
            debug!("No resource profile file at: {}", path.display());
            return Ok(None);
        }

        info!("Loading resource profiles from: {}", path.display());
        let content = read_file(path)?;
        let profiles: ProfileFile = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::parse(
                format!("YAML parse error: {e}"),
                Some(path.display().to_string()),
            )
        })?;

        debug!("Loaded {} resource profile(s)", profiles.profiles.len());
        Ok(Some(profiles))
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self.resolve(".env");

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ConfigError::parse(
                    format!("Failed to load .env file: {e}"),
                    Some(env_path.display().to_string()),
                )
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    fn resolve(&self, file: &str) -> PathBuf {
        self.base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(file), |p| p.join(file))
    }
}

fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ManiforgeError::Config(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }));
    }

    std::fs::read_to_string(path).map_err(|e| {
        ManiforgeError::Config(ConfigError::parse(
            format!("Failed to read file: {e}"),
            Some(path.display().to_string()),
        ))
    })
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["maniforge.yaml", "maniforge.yml"];

/// Finds the configuration file in the current directory or parent directories.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ManiforgeError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r"
cluster:
  name: firefly
apps:
  web:
    image: nginx
";
        let config = ConfigParser::new().parse_yaml(yaml, None).unwrap();
        assert_eq!(config.cluster.name, "firefly");
        assert_eq!(config.output.directory, PathBuf::from("apps"));
        assert!(config.nodes.is_empty());
        assert!(config.apps.contains_key("web"));
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r"
cluster:
  name: firefly
  domain: example.com
  defaults:
    profile: c.small
    nodeSelector: pi
output:
  directory: manifests
apps:
  nginx-example:
    image: nginx:latest
    type: deployment
    network: clusterip
    namespace: web
    ports:
      - name: http
        port: 80
        targetPort: 8080
    storage:
      data:
        type: pvc
        mount: /data
        size: 1Gi
    env:
      TZ: UTC
nodes:
  pi:
    count: 2
    cpu: 4
    memory: 16Gi
resourceProfiles:
  m.tiny:
    cpu: {requests: 50m, limits: 100m}
    memory: {requests: 64Mi, limits: 128Mi}
";
        let config = ConfigParser::new().parse_yaml(yaml, None).unwrap();
        assert_eq!(config.cluster.domain.as_deref(), Some("example.com"));
        assert_eq!(config.output.directory, PathBuf::from("manifests"));

        let app = &config.apps["nginx-example"];
        assert_eq!(app.namespace.as_deref(), Some("web"));
        assert_eq!(app.ports[0].target_port, Some(8080));
        assert!(app.storage.contains_key("data"));

        assert_eq!(config.nodes["pi"].count, 2);
        assert!(config.resource_profiles.contains_key("m.tiny"));
    }

    #[test]
    fn test_parse_invalid_yaml_reports_location() {
        let err = ConfigParser::new()
            .parse_yaml("apps: [unterminated", Some(Path::new("maniforge.yaml")))
            .unwrap_err();

        match err {
            ManiforgeError::Config(ConfigError::ParseError { location, .. }) => {
                assert_eq!(location.as_deref(), Some("maniforge.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigParser::new()
            .load_file(dir.path().join("maniforge.yaml"))
            .unwrap_err();
        assert!(matches!(
            err,
            ManiforgeError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("maniforge.yaml"), "apps: {}\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.path().join("maniforge.yaml"));
    }

    #[test]
    fn test_load_profiles_from_base_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_PROFILES_FILE),
            "profiles:\n  c.tiny:\n    cpu: {requests: 50m, limits: 100m}\n    memory: {requests: 64Mi, limits: 128Mi}\n",
        )
        .unwrap();

        let parser = ConfigParser::new().with_base_path(dir.path());
        let path = parser.profiles_path_with(None);
        assert_eq!(path, dir.path().join(DEFAULT_PROFILES_FILE));

        let profiles = ConfigParser::load_profiles_from(&path).unwrap().unwrap();
        assert!(profiles.profiles.contains_key("c.tiny"));
    }

    #[test]
    fn test_profiles_path_override_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let parser = ConfigParser::new().with_base_path(dir.path());
        let elsewhere = dir.path().join("shared").join("profiles.yaml");

        assert_eq!(
            parser.profiles_path_with(Some(elsewhere.display().to_string())),
            elsewhere
        );
        assert!(ConfigParser::load_profiles_from(&elsewhere).unwrap().is_none());
    }
}
