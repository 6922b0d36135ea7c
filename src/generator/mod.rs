//! Manifest generation.
//!
//! Writes one directory per app under the output directory, holding a
//! `helm-release.yaml` and the `kustomization.yaml` that lists it.

mod chart;

pub use chart::{
    HELM_RELEASE_API_VERSION, KUSTOMIZE_API_VERSION, helm_release, kustomization, render_values,
};

use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{OutputError, Result};
use crate::translator::ResolvedApp;

/// Release file name inside an app directory.
pub const HELM_RELEASE_FILE: &str = "helm-release.yaml";

/// Kustomization file name inside an app directory.
pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

/// Writes and prunes per-app manifest directories.
#[derive(Debug)]
pub struct ManifestWriter {
    output_dir: PathBuf,
}

impl ManifestWriter {
    /// Creates a writer rooted at `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory that holds the manifests of `app`.
    #[must_use]
    pub fn app_dir(&self, app: &str) -> PathBuf {
        self.output_dir.join(app)
    }

    /// Renders and writes both manifests of one app.
    ///
    /// Returns the written paths.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub async fn write_app(&self, app: &ResolvedApp) -> Result<Vec<PathBuf>> {
        let dir = self.app_dir(&app.name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| write_failed(&dir, &e))?;

        let release = helm_release(app)?;
        let kustomization = kustomization(app, HELM_RELEASE_FILE);

        let release_path = dir.join(HELM_RELEASE_FILE);
        let kustomization_path = dir.join(KUSTOMIZATION_FILE);
        write_yaml(&app.name, &release_path, &release).await?;
        write_yaml(&app.name, &kustomization_path, &kustomization).await?;

        info!("Wrote manifests for {}", app.name);
        Ok(vec![kustomization_path, release_path])
    }

    /// Removes the manifest directory of a deleted app.
    ///
    /// Missing directories are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub async fn remove_app(&self, name: &str) -> Result<()> {
        let dir = self.app_dir(name);
        if !dir.exists() {
            debug!("Nothing to remove for {name}");
            return Ok(());
        }

        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| write_failed(&dir, &e))?;
        info!("Removed manifests for {name}");
        Ok(())
    }
}

async fn write_yaml(app: &str, path: &Path, value: &Value) -> Result<()> {
    let content = serde_yaml::to_string(value).map_err(|e| OutputError::Render {
        app: app.to_string(),
        message: e.to_string(),
    })?;

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| write_failed(path, &e))?;
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| write_failed(path, &e))?;
    file.sync_all().await.map_err(|e| write_failed(path, &e))?;
    fs::rename(&temp_path, path)
        .await
        .map_err(|e| write_failed(path, &e))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

fn write_failed(path: &Path, error: &std::io::Error) -> OutputError {
    OutputError::WriteFailed {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;
    use serde_json::json;
    use tempfile::TempDir;

    fn app(name: &str) -> ResolvedApp {
        ResolvedApp {
            name: name.to_string(),
            namespace: String::from("media"),
            node_group: None,
            resources: None,
            values: json!({
                "image": {"repository": "jellyfin/jellyfin", "tag": "10.9"},
                "workload": "deployment",
                "env": {"TZ": "UTC"},
                "chart": Platform::builtin().unwrap().chart().to_value(),
            }),
        }
    }

    #[tokio::test]
    async fn test_write_app() {
        let temp = TempDir::new().expect("temp dir");
        let writer = ManifestWriter::new(temp.path());

        let paths = writer.write_app(&app("jellyfin")).await.expect("write failed");
        assert_eq!(paths.len(), 2);

        let release = std::fs::read_to_string(temp.path().join("jellyfin").join(HELM_RELEASE_FILE))
            .expect("read release");
        let parsed: serde_yaml::Value = serde_yaml::from_str(&release).expect("valid yaml");
        assert_eq!(parsed["kind"], serde_yaml::Value::from("HelmRelease"));
        assert_eq!(parsed["metadata"]["namespace"], serde_yaml::Value::from("media"));
        assert_eq!(
            parsed["spec"]["chart"]["spec"]["version"],
            serde_yaml::Value::from("4.4.0")
        );
        assert_eq!(
            parsed["spec"]["values"]["controllers"]["main"]["containers"]["main"]["env"]["TZ"],
            serde_yaml::Value::from("UTC")
        );

        let kustomization =
            std::fs::read_to_string(temp.path().join("jellyfin").join(KUSTOMIZATION_FILE))
                .expect("read kustomization");
        assert!(kustomization.contains("- helm-release.yaml"));
        assert!(!temp.path().join("jellyfin").join("helm-release.tmp").exists());
    }

    #[tokio::test]
    async fn test_remove_app() {
        let temp = TempDir::new().expect("temp dir");
        let writer = ManifestWriter::new(temp.path());

        writer.write_app(&app("old")).await.expect("write failed");
        writer.remove_app("old").await.expect("remove failed");
        assert!(!temp.path().join("old").exists());

        writer.remove_app("never-written").await.expect("missing dir is fine");
    }
}
