//! Descriptor model, naming rules, and build configuration for deckhand.
//!
//! This crate defines the schema layer: the open attribute map of a single
//! resource (`ResourceEntry`), the consolidated `Manifest`, the closed set of
//! `ResourceType`s, string rewriting over nested descriptor values, naming
//! policy (`NamingRules`), and TOML build configuration (`BuildConfig`).

pub mod config;
pub mod naming;
pub mod resource;
pub mod types;
pub mod value;

pub use config::{BuildConfig, DEFAULT_CONFIG_FILE};
pub use naming::{alias_token, NamingRules};
pub use resource::{
    Manifest, ResourceEntry, ResourceType, SchemaError, DEPENDENCIES_FIELD,
    DEPENDENCY_NAME_FIELD, RESOURCE_TYPE_FIELD, S3_PATH_FIELD,
};
pub use types::{BundleName, ResourceName};
pub use value::{substitute, substitute_all, Substitutions, REFERENCE_PREFIX};
