//! Meta-build engine for deckhand.
//!
//! This crate walks a project tree for deployment descriptors, merges them
//! into one consolidated `Manifest` (with collision handling and storage-path
//! derivation), checks that every dependency resolves, rewrites resource
//! names by naming policy, and writes the result to the bundle's artifacts
//! directory. `Builder` ties the steps together for a given `BuildConfig`.

pub mod artifacts;
pub mod builder;
pub mod discovery;
pub mod merge;
pub mod resolve;
pub mod storage;

pub use artifacts::{artifact_paths, ArtifactLayout, ARTIFACTS_DIR, BUILD_META_FILE};
pub use builder::{BuildResult, Builder};
pub use discovery::{discover, DescriptorSource, SHARED_RESOURCES_FILE, UNIT_CONFIG_SUFFIX};
pub use merge::{check_dependencies, merge, resolve_collision};
pub use resolve::resolve;
pub use storage::populate_storage_path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("resource '{resource}' must contain '{field}'")]
    MissingField {
        resource: String,
        field: &'static str,
    },
    #[error(
        "resource '{resource}' declares type '{resource_type}', which has no creation rule; \
         add one or use an existing resource type"
    )]
    UnrecognizedResourceType {
        resource: String,
        resource_type: String,
    },
    #[error("lambda '{resource}' has unsupported runtime '{runtime}'")]
    UnsupportedRuntime { resource: String, runtime: String },
    #[error("two equal resource descriptions were found for '{0}'; remove one of them")]
    DuplicateResource(String),
    #[error("two different resources share the name '{0}'; rename one of them")]
    ConflictingResource(String),
    #[error("API '{api}' has duplicated resource '{sub_resource}'; rename or remove one")]
    DuplicateSubResource { api: String, sub_resource: String },
    #[error("API '{0}' has duplicated cluster cache configurations; remove one")]
    DuplicateCacheConfig(String),
    #[error("resource '{name}' is declared as both '{existing}' and '{incoming}'")]
    ResourceTypeMismatch {
        name: String,
        existing: String,
        incoming: String,
    },
    #[error(
        "dependency '{dependency}' of '{resource}' is not described; describe it in a \
         *{unit} file if it is a lambda, or in {shared}",
        unit = UNIT_CONFIG_SUFFIX,
        shared = SHARED_RESOURCES_FILE
    )]
    UnresolvedDependency {
        resource: String,
        dependency: String,
    },
    #[error("cannot rename '{from}' to '{to}': another resource already has that name")]
    RenameCollision { from: String, to: String },
    #[error("invalid descriptor {path}: {reason}")]
    InvalidDescriptor { path: String, reason: String },
    #[error("bundle is not properly configured, nonexistent deployment packages: {}", .0.join(", "))]
    MissingPackages(Vec<String>),
    #[error("config error: {0}")]
    Schema(#[from] deckhand_schema::SchemaError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl CoreError {
    /// True for errors caused by descriptor content rather than the environment.
    pub fn is_manifest_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::UnrecognizedResourceType { .. }
                | Self::UnsupportedRuntime { .. }
                | Self::DuplicateResource(_)
                | Self::ConflictingResource(_)
                | Self::DuplicateSubResource { .. }
                | Self::DuplicateCacheConfig(_)
                | Self::ResourceTypeMismatch { .. }
                | Self::UnresolvedDependency { .. }
                | Self::RenameCollision { .. }
                | Self::InvalidDescriptor { .. }
        )
    }
}
