use crate::CoreError;
use deckhand_schema::{BundleName, Manifest};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Directory under the project root holding one subdirectory per bundle.
pub const ARTIFACTS_DIR: &str = "bundles";
/// File name of the consolidated manifest inside a bundle directory.
pub const BUILD_META_FILE: &str = "build_meta.json";

/// Paths of build artifacts for a project.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            root: project_root.into(),
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn artifacts_dir(&self) -> PathBuf {
        self.root.join(ARTIFACTS_DIR)
    }

    #[inline]
    pub fn bundle_dir(&self, bundle: &BundleName) -> PathBuf {
        self.artifacts_dir().join(bundle.as_str())
    }

    #[inline]
    pub fn meta_file(&self, bundle: &BundleName) -> PathBuf {
        self.bundle_dir(bundle).join(BUILD_META_FILE)
    }

    /// Write `manifest` as pretty JSON to the bundle's meta file, atomically.
    pub fn write_meta(&self, bundle: &BundleName, manifest: &Manifest) -> Result<PathBuf, CoreError> {
        let bundle_dir = self.bundle_dir(bundle);
        fs::create_dir_all(&bundle_dir)?;
        info!("bundle path: {}", bundle_dir.display());

        let content = manifest.to_json_pretty()?;
        let meta_path = bundle_dir.join(BUILD_META_FILE);
        let mut tmp = NamedTempFile::new_in(&bundle_dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&meta_path).map_err(|e| CoreError::Io(e.error))?;
        debug!("wrote {}", meta_path.display());
        Ok(meta_path)
    }

    pub fn read_meta(&self, bundle: &BundleName) -> Result<Manifest, CoreError> {
        let content = fs::read_to_string(self.meta_file(bundle))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Check that every deployment package named by `manifest` exists under
    /// the artifacts directory.
    pub fn validate_deployment_packages(&self, manifest: &Manifest) -> Result<(), CoreError> {
        let artifacts_dir = self.artifacts_dir();
        let missing: Vec<String> = artifact_paths(manifest)
            .into_iter()
            .map(|p| artifacts_dir.join(p))
            .filter(|p| !p.exists())
            .map(|p| p.display().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingPackages(missing))
        }
    }
}

/// Storage paths of all packaged resources, in manifest order.
pub fn artifact_paths(manifest: &Manifest) -> Vec<&str> {
    manifest
        .iter()
        .filter_map(|(_, entry)| entry.s3_path())
        .collect()
}
