use crate::CoreError;
use deckhand_schema::{Manifest, NamingRules, ResourceName, ResourceType, Substitutions};
use std::collections::BTreeSet;
use tracing::debug;

/// Apply aliases and naming policy to a merged manifest.
///
/// Alias tokens are substituted first, one alias at a time. Entries whose type
/// is in `eligible` are then renamed to `suffix(prefix(name))`, and every
/// literal reference to an old name is rewritten to the new one in a single
/// pass, so a new name that happens to equal another old name is not renamed
/// twice.
pub fn resolve(
    manifest: Manifest,
    rules: &NamingRules,
    eligible: &BTreeSet<ResourceType>,
) -> Result<Manifest, CoreError> {
    let mut manifest = manifest;
    for (token, value) in rules.alias_tokens() {
        let mut subs = Substitutions::new();
        subs.insert(token, value.to_owned());
        manifest = manifest.substitute_all(&subs);
    }
    debug!("resolved aliases in {} resources", manifest.len());

    let renames: Substitutions = manifest
        .iter()
        .filter(|(_, entry)| entry.resource_type().is_some_and(|t| eligible.contains(&t)))
        .filter_map(|(name, _)| {
            let resolved = rules.resolve_name(name);
            (resolved != name.as_str()).then(|| (name.to_string(), resolved))
        })
        .collect();
    if renames.is_empty() {
        return Ok(manifest);
    }
    debug!("resolved names mapping: {renames:?}");

    let mut renamed = Manifest::new();
    for (name, entry) in manifest {
        let key = match renames.get(name.as_str()) {
            Some(new_name) => ResourceName::new(new_name.clone()),
            None => name,
        };
        if renamed.contains(&key) {
            let from = renames
                .iter()
                .find(|(_, to)| to.as_str() == key.as_str())
                .map_or_else(|| key.to_string(), |(from, _)| from.clone());
            return Err(CoreError::RenameCollision {
                from,
                to: key.into_inner(),
            });
        }
        renamed.insert(key, entry.substitute_all(&renames));
    }
    Ok(renamed)
}
