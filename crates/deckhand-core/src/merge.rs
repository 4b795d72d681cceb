use crate::discovery::DescriptorSource;
use crate::storage::populate_storage_path;
use crate::CoreError;
use deckhand_schema::{
    BundleName, Manifest, ResourceEntry, ResourceName, ResourceType, DEPENDENCIES_FIELD,
    DEPENDENCY_NAME_FIELD, RESOURCE_TYPE_FIELD,
};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, info};

const RESOURCES_FIELD: &str = "resources";
const CACHE_CONFIG_FIELD: &str = "cluster_cache_configuration";
const DEPLOY_STAGE_FIELD: &str = "deploy_stage";
const APPLY_CHANGES_FIELD: &str = "apply_changes";
const UNIT_NAME_FIELD: &str = "name";

/// Assemble descriptor sources into one conflict-free manifest.
///
/// Sources are consumed in order; for a name seen twice, the earlier entry is
/// "existing" and the later one "incoming" (see [`resolve_collision`]). Every
/// dependency must name a resource of the final manifest.
pub fn merge(sources: Vec<DescriptorSource>, bundle: &BundleName) -> Result<Manifest, CoreError> {
    let mut manifest = Manifest::new();

    for source in sources {
        match source {
            DescriptorSource::Unit { path, entry } => {
                let name = entry.get_str(UNIT_NAME_FIELD).ok_or_else(|| {
                    CoreError::MissingField {
                        resource: path.display().to_string(),
                        field: UNIT_NAME_FIELD,
                    }
                })?;
                let name = ResourceName::new(name);
                debug!("found unit '{name}' in {}", path.display());
                if entry.resource_type_str().is_none() {
                    return Err(CoreError::MissingField {
                        resource: name.into_inner(),
                        field: RESOURCE_TYPE_FIELD,
                    });
                }
                add_resource(&mut manifest, name, entry, bundle)?;
            }
            DescriptorSource::Shared { path, entries } => {
                debug!("found {} resources in {}", entries.len(), path.display());
                for (name, entry) in entries {
                    check_resource_type(&name, &entry)?;
                    add_resource(&mut manifest, name, entry, bundle)?;
                }
            }
        }
    }

    check_dependencies(&manifest)?;
    info!("assembled manifest with {} resources", manifest.len());
    Ok(manifest)
}

fn check_resource_type(name: &ResourceName, entry: &ResourceEntry) -> Result<(), CoreError> {
    let Some(declared) = entry.resource_type_str() else {
        return Err(CoreError::MissingField {
            resource: name.to_string(),
            field: RESOURCE_TYPE_FIELD,
        });
    };
    if declared.parse::<ResourceType>().is_err() {
        return Err(CoreError::UnrecognizedResourceType {
            resource: name.to_string(),
            resource_type: declared.to_owned(),
        });
    }
    Ok(())
}

fn add_resource(
    manifest: &mut Manifest,
    name: ResourceName,
    mut entry: ResourceEntry,
    bundle: &BundleName,
) -> Result<(), CoreError> {
    populate_storage_path(&name, &mut entry, bundle)?;

    let entry = match manifest.remove(&name) {
        None => entry,
        Some(existing) => {
            let existing_type = existing.resource_type_str().unwrap_or_default().to_owned();
            let incoming_type = entry.resource_type_str().unwrap_or_default().to_owned();
            resolve_collision(&name, existing, entry)?.ok_or_else(|| {
                CoreError::ResourceTypeMismatch {
                    name: name.to_string(),
                    existing: existing_type,
                    incoming: incoming_type,
                }
            })?
        }
    };
    manifest.insert(name, entry);
    Ok(())
}

/// Decide what to do with two entries declaring the same name.
///
/// Two `api_gateway` entries merge into `incoming`. Any other same-type pair
/// is fatal. `Ok(None)` means the types differ and no merge rule applies.
pub fn resolve_collision(
    name: &str,
    existing: ResourceEntry,
    incoming: ResourceEntry,
) -> Result<Option<ResourceEntry>, CoreError> {
    let existing_type = existing.resource_type_str();
    if existing_type.is_none() || existing_type != incoming.resource_type_str() {
        return Ok(None);
    }
    if incoming.resource_type().is_some_and(ResourceType::is_composite) {
        return merge_composite(name, existing, incoming).map(Some);
    }
    if existing == incoming {
        Err(CoreError::DuplicateResource(name.to_owned()))
    } else {
        Err(CoreError::ConflictingResource(name.to_owned()))
    }
}

fn merge_composite(
    name: &str,
    mut existing: ResourceEntry,
    mut incoming: ResourceEntry,
) -> Result<ResourceEntry, CoreError> {
    let existing_resources = take_object(&mut existing, RESOURCES_FIELD);
    let mut resources = take_object(&mut incoming, RESOURCES_FIELD);
    if let Some(clash) = existing_resources.keys().find(|k| resources.contains_key(*k)) {
        return Err(CoreError::DuplicateSubResource {
            api: name.to_owned(),
            sub_resource: clash.clone(),
        });
    }

    let existing_cache = existing.remove(CACHE_CONFIG_FIELD).filter(is_set);
    if let Some(cache) = existing_cache {
        if incoming.get(CACHE_CONFIG_FIELD).is_some_and(is_set) {
            return Err(CoreError::DuplicateCacheConfig(name.to_owned()));
        }
        incoming.insert(CACHE_CONFIG_FIELD, cache);
    }

    let mut dependencies = take_array(&mut incoming, DEPENDENCIES_FIELD);
    let known: BTreeSet<String> = dependencies
        .iter()
        .filter_map(dependency_name)
        .map(str::to_owned)
        .collect();
    dependencies.extend(
        take_array(&mut existing, DEPENDENCIES_FIELD)
            .into_iter()
            .filter(|dep| dependency_name(dep).map_or(true, |n| !known.contains(n))),
    );
    incoming.insert(DEPENDENCIES_FIELD, dependencies);

    resources.extend(existing_resources);
    incoming.insert(RESOURCES_FIELD, resources);

    if let Some(stage) = existing.remove(DEPLOY_STAGE_FIELD).filter(is_set) {
        incoming.insert(DEPLOY_STAGE_FIELD, stage);
    }

    let mut apply_changes = take_array(&mut existing, APPLY_CHANGES_FIELD);
    apply_changes.extend(take_array(&mut incoming, APPLY_CHANGES_FIELD));
    incoming.insert(APPLY_CHANGES_FIELD, apply_changes);

    debug!("merged API description '{name}'");
    Ok(incoming)
}

/// Fail on the first dependency that names no resource of `manifest`.
///
/// `dependencies` must be an array whose elements each carry a string
/// `resource_name`.
pub fn check_dependencies(manifest: &Manifest) -> Result<(), CoreError> {
    for (name, entry) in manifest.iter() {
        let deps = match entry.get(DEPENDENCIES_FIELD) {
            None => continue,
            Some(Value::Array(deps)) => deps,
            Some(_) => {
                return Err(CoreError::InvalidDescriptor {
                    path: name.to_string(),
                    reason: format!("'{DEPENDENCIES_FIELD}' must be an array"),
                });
            }
        };
        for dep in deps {
            let dependency = dependency_name(dep).ok_or_else(|| CoreError::MissingField {
                resource: format!("{name} (dependency)"),
                field: DEPENDENCY_NAME_FIELD,
            })?;
            if !manifest.contains(dependency) {
                return Err(CoreError::UnresolvedDependency {
                    resource: name.to_string(),
                    dependency: dependency.to_owned(),
                });
            }
        }
    }
    Ok(())
}

fn dependency_name(dep: &Value) -> Option<&str> {
    dep.get(DEPENDENCY_NAME_FIELD).and_then(Value::as_str)
}

fn take_object(entry: &mut ResourceEntry, field: &str) -> Map<String, Value> {
    match entry.remove(field) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn take_array(entry: &mut ResourceEntry, field: &str) -> Vec<Value> {
    match entry.remove(field) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Null, empty, and `false` values count as not configured.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}
