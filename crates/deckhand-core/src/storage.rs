//! Derivation of the `s3_path` storage location for packaged resources.

use crate::CoreError;
use deckhand_schema::{BundleName, ResourceEntry, ResourceType, S3_PATH_FIELD};
use tracing::trace;

/// How a lambda runtime's deployment package is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PackageRule {
    /// Package is built from sources and named `{name}-{version}.zip`.
    Interpreted,
    /// Package is a prebuilt artifact named by `deployment_package`.
    Prebuilt,
}

const RUNTIME_RULES: &[(&str, PackageRule)] = &[
    ("python2.7", PackageRule::Interpreted),
    ("python3.8", PackageRule::Interpreted),
    ("python3.9", PackageRule::Interpreted),
    ("python3.10", PackageRule::Interpreted),
    ("python3.11", PackageRule::Interpreted),
    ("python3.12", PackageRule::Interpreted),
    ("java8", PackageRule::Prebuilt),
    ("java11", PackageRule::Prebuilt),
    ("java17", PackageRule::Prebuilt),
    ("java21", PackageRule::Prebuilt),
];

fn runtime_rule(runtime: &str) -> Option<PackageRule> {
    let runtime = runtime.to_lowercase();
    RUNTIME_RULES
        .iter()
        .find(|(name, _)| *name == runtime)
        .map(|(_, rule)| *rule)
}

/// Archive name of a package built from sources.
pub fn packaged_name(name: &str, version: &str) -> String {
    format!("{name}-{version}.zip")
}

fn bundle_path(bundle: &BundleName, tail: &str) -> String {
    format!("{bundle}/{tail}")
}

/// Set `s3_path` on `entry` according to its type.
///
/// Types without a packaging rule (and unknown types) are left untouched.
pub fn populate_storage_path(
    resource: &str,
    entry: &mut ResourceEntry,
    bundle: &BundleName,
) -> Result<(), CoreError> {
    let path = match entry.resource_type() {
        Some(ResourceType::BeanstalkApp) => {
            let package = require(resource, entry, "deployment_package")?;
            bundle_path(bundle, package)
        }
        Some(ResourceType::Lambda) => lambda_path(resource, entry, bundle)?,
        _ => return Ok(()),
    };
    trace!("{resource}: {S3_PATH_FIELD} = {path}");
    entry.insert(S3_PATH_FIELD, path);
    Ok(())
}

fn lambda_path(
    resource: &str,
    entry: &ResourceEntry,
    bundle: &BundleName,
) -> Result<String, CoreError> {
    let runtime = require(resource, entry, "runtime")?;
    match runtime_rule(runtime) {
        Some(PackageRule::Interpreted) => {
            let name = require(resource, entry, "name")?;
            let version = require(resource, entry, "version")?;
            Ok(bundle_path(bundle, &packaged_name(name, version)))
        }
        Some(PackageRule::Prebuilt) => {
            let package = require(resource, entry, "deployment_package")?;
            Ok(bundle_path(bundle, package))
        }
        None => Err(CoreError::UnsupportedRuntime {
            resource: resource.to_owned(),
            runtime: runtime.to_owned(),
        }),
    }
}

fn require<'a>(
    resource: &str,
    entry: &'a ResourceEntry,
    field: &'static str,
) -> Result<&'a str, CoreError> {
    entry.get_str(field).ok_or_else(|| CoreError::MissingField {
        resource: resource.to_owned(),
        field,
    })
}
