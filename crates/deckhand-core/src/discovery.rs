use crate::CoreError;
use deckhand_schema::{ResourceEntry, ResourceName};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// File name suffix of single-unit descriptors, e.g. `lambda_config.json`.
pub const UNIT_CONFIG_SUFFIX: &str = "lambda_config.json";
/// Exact file name of shared descriptor files.
pub const SHARED_RESOURCES_FILE: &str = "deployment_resources.json";

/// A parsed descriptor file, in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorSource {
    /// Describes exactly one resource, named by its own `name` attribute.
    Unit { path: PathBuf, entry: ResourceEntry },
    /// Describes zero or more named resources, ordered by name.
    Shared {
        path: PathBuf,
        entries: Vec<(ResourceName, ResourceEntry)>,
    },
}

impl DescriptorSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Unit { path, .. } | Self::Shared { path, .. } => path,
        }
    }

    /// Parse a unit descriptor's content.
    pub fn parse_unit(path: impl Into<PathBuf>, content: &str) -> Result<Self, CoreError> {
        let path = path.into();
        let value = parse_json(&path, content)?;
        let entry = ResourceEntry::from_value(value).map_err(|e| invalid(&path, e))?;
        Ok(Self::Unit { path, entry })
    }

    /// Parse a shared descriptor's content: a JSON object of name to entry.
    pub fn parse_shared(path: impl Into<PathBuf>, content: &str) -> Result<Self, CoreError> {
        let path = path.into();
        let Value::Object(map) = parse_json(&path, content)? else {
            return Err(CoreError::InvalidDescriptor {
                path: path.display().to_string(),
                reason: "expected a JSON object of named resources".to_owned(),
            });
        };
        let mut entries = Vec::with_capacity(map.len());
        for (name, value) in map {
            let entry = ResourceEntry::from_value(value)
                .map_err(|e| invalid(&path, format!("resource '{name}': {e}")))?;
            entries.push((ResourceName::new(name), entry));
        }
        Ok(Self::Shared { path, entries })
    }
}

/// Walk `root` and parse every descriptor file found.
///
/// The walk is depth-first with directory entries sorted by file name, so the
/// result order (and therefore collision precedence) is stable across runs.
/// Symlinked directories are not descended into; a symlink to a file is read
/// like a regular file.
pub fn discover(root: &Path) -> Result<Vec<DescriptorSource>, CoreError> {
    debug!("scanning {} for descriptors", root.display());
    let mut sources = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let is_file = entry.file_type().is_file() || (entry.path_is_symlink() && path.is_file());
        if !is_file {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();

        if file_name.ends_with(UNIT_CONFIG_SUFFIX) {
            debug!("processing unit descriptor {}", path.display());
            let content = fs::read_to_string(path)?;
            sources.push(DescriptorSource::parse_unit(path, &content)?);
        } else if file_name == SHARED_RESOURCES_FILE {
            debug!("processing shared descriptor {}", path.display());
            let content = fs::read_to_string(path)?;
            sources.push(DescriptorSource::parse_shared(path, &content)?);
        } else {
            trace!("skipping {}", path.display());
        }
    }

    debug!("found {} descriptor files", sources.len());
    Ok(sources)
}

fn parse_json(path: &Path, content: &str) -> Result<Value, CoreError> {
    serde_json::from_str(content).map_err(|e| invalid(path, e))
}

fn invalid(path: &Path, reason: impl std::fmt::Display) -> CoreError {
    CoreError::InvalidDescriptor {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn parse_unit_reads_object() {
        let src = DescriptorSource::parse_unit(
            "a/lambda_config.json",
            r#"{"name": "svc", "resource_type": "lambda"}"#,
        )
        .unwrap();
        let DescriptorSource::Unit { entry, .. } = src else {
            panic!("expected unit");
        };
        assert_eq!(entry.get_str("name"), Some("svc"));
    }

    #[test]
    fn parse_unit_rejects_array() {
        let err = DescriptorSource::parse_unit("lambda_config.json", "[1]").unwrap_err();
        assert!(matches!(err, CoreError::InvalidDescriptor { .. }));
    }

    #[test]
    fn parse_shared_rejects_malformed_json() {
        let err = DescriptorSource::parse_shared(SHARED_RESOURCES_FILE, "{").unwrap_err();
        assert!(err.to_string().contains(SHARED_RESOURCES_FILE));
    }

    #[test]
    fn parse_shared_orders_entries_by_name() {
        let src = DescriptorSource::parse_shared(
            SHARED_RESOURCES_FILE,
            r#"{"zeta": {"resource_type": "sqs_queue"}, "alpha": {"resource_type": "sns_topic"}}"#,
        )
        .unwrap();
        let DescriptorSource::Shared { entries, .. } = src else {
            panic!("expected shared");
        };
        let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn discover_finds_both_kinds_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b/lambda_config.json", r#"{"name": "b"}"#);
        write(dir.path(), "a/lambda_config.json", r#"{"name": "a"}"#);
        write(dir.path(), "a/deployment_resources.json", "{}");
        write(dir.path(), "a/readme.md", "ignored");
        write(dir.path(), "c/other_lambda_config.json", r#"{"name": "c"}"#);

        let sources = discover(dir.path()).unwrap();
        let rel: Vec<_> = sources
            .iter()
            .map(|s| {
                s.path()
                    .strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(
            rel,
            vec![
                "a/deployment_resources.json",
                "a/lambda_config.json",
                "b/lambda_config.json",
                "c/other_lambda_config.json",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn discover_reads_symlinked_descriptor_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "shared/svc.json",
            r#"{"name": "svc", "resource_type": "lambda"}"#,
        );
        fs::create_dir_all(dir.path().join("svc")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("shared/svc.json"),
            dir.path().join("svc/lambda_config.json"),
        )
        .unwrap();

        let sources = discover(dir.path()).unwrap();
        assert_eq!(sources.len(), 1);
        let DescriptorSource::Unit { entry, path } = &sources[0] else {
            panic!("expected unit");
        };
        assert!(path.ends_with("svc/lambda_config.json"));
        assert_eq!(entry.get_str("name"), Some("svc"));
    }

    #[cfg(unix)]
    #[test]
    fn discover_does_not_descend_into_symlinked_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        write(outside.path(), "fn/lambda_config.json", r#"{"name": "fn"}"#);
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();

        assert!(discover(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn discover_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, CoreError::Walk(_)));
    }
}
