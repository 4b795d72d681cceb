use crate::artifacts::ArtifactLayout;
use crate::discovery::discover;
use crate::merge::merge;
use crate::resolve::resolve;
use crate::CoreError;
use deckhand_schema::{BuildConfig, BundleName, Manifest};
use std::path::PathBuf;
use tracing::{debug, info};

/// Runs the meta-build steps for one project configuration.
///
/// The config is read-only for the lifetime of the builder; every step takes
/// its naming rules and paths from it instead of from process-wide state.
pub struct Builder {
    config: BuildConfig,
    layout: ArtifactLayout,
}

/// Result of writing a bundle's build meta.
pub struct BuildResult {
    pub manifest: Manifest,
    pub meta_path: PathBuf,
}

impl Builder {
    pub fn new(config: BuildConfig) -> Self {
        let layout = ArtifactLayout::new(&config.project_path);
        Self { config, layout }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Discover and merge every descriptor under the project path.
    pub fn create_resource_manifest(&self, bundle: &BundleName) -> Result<Manifest, CoreError> {
        let sources = discover(&self.config.project_path)?;
        merge(sources, bundle)
    }

    /// Build the unresolved manifest and write it to the bundle directory.
    pub fn create_meta(&self, bundle: &BundleName) -> Result<BuildResult, CoreError> {
        info!("creating build meta for bundle '{bundle}'");
        let manifest = self.create_resource_manifest(bundle)?;
        let meta_path = self.layout.write_meta(bundle, &manifest)?;
        Ok(BuildResult {
            manifest,
            meta_path,
        })
    }

    /// Load a previously written build meta.
    pub fn load_meta(&self, bundle: &BundleName) -> Result<Manifest, CoreError> {
        self.layout.read_meta(bundle)
    }

    /// Apply the configured aliases and naming policy.
    pub fn resolve_meta(&self, manifest: Manifest) -> Result<Manifest, CoreError> {
        let resolved = resolve(
            manifest,
            &self.config.naming_rules(),
            &self.config.global_services,
        )?;
        debug!("resolved meta contains {} resources", resolved.len());
        Ok(resolved)
    }

    pub fn validate_packages(&self, manifest: &Manifest) -> Result<(), CoreError> {
        self.layout.validate_deployment_packages(manifest)
    }
}
