use crate::naming::NamingRules;
use crate::resource::{ResourceType, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "deckhand.toml";

/// Read-only build settings: where the project lives and how to name things.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    pub project_path: PathBuf,
    #[serde(default)]
    pub resources_prefix: Option<String>,
    #[serde(default)]
    pub resources_suffix: Option<String>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Resource types whose names get the prefix/suffix policy applied.
    #[serde(default = "default_global_services")]
    pub global_services: BTreeSet<ResourceType>,
}

fn default_global_services() -> BTreeSet<ResourceType> {
    [
        ResourceType::IamPolicy,
        ResourceType::IamRole,
        ResourceType::S3Bucket,
    ]
    .into_iter()
    .collect()
}

impl BuildConfig {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            resources_prefix: None,
            resources_suffix: None,
            aliases: BTreeMap::new(),
            global_services: default_global_services(),
        }
    }

    pub fn parse_str(input: &str) -> Result<Self, SchemaError> {
        Ok(toml::from_str(input)?)
    }

    /// Load from a TOML file. A relative `project_path` is taken relative
    /// to the directory containing the config file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::parse_str(&content)?;
        if config.project_path.is_relative() {
            if let Some(parent) = path.parent() {
                config.project_path = parent.join(&config.project_path);
            }
        }
        Ok(config)
    }

    pub fn naming_rules(&self) -> NamingRules {
        NamingRules {
            prefix: self.resources_prefix.clone(),
            suffix: self.resources_suffix.clone(),
            aliases: self.aliases.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let input = r#"
project_path = "/srv/project"
resources_prefix = "dev-"
resources_suffix = "-${region}"
global_services = ["s3_bucket", "sqs_queue"]

[aliases]
region = "eu-west-1"
account_id = "123456789012"
"#;
        let config = BuildConfig::parse_str(input).expect("should parse");
        assert_eq!(config.project_path, PathBuf::from("/srv/project"));
        assert_eq!(config.resources_prefix.as_deref(), Some("dev-"));
        assert_eq!(config.aliases.len(), 2);
        assert!(config.global_services.contains(&ResourceType::SqsQueue));
        assert!(!config.global_services.contains(&ResourceType::IamRole));
        assert_eq!(config.naming_rules().resolve_name("q"), "dev-q-eu-west-1");
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = BuildConfig::parse_str("project_path = \".\"\n").expect("should parse");
        assert!(config.resources_prefix.is_none());
        assert!(config.aliases.is_empty());
        assert_eq!(config.global_services, default_global_services());
    }

    #[test]
    fn rejects_unknown_fields() {
        let input = "project_path = \".\"\nregion = \"eu-west-1\"\n";
        assert!(BuildConfig::parse_str(input).is_err());
    }

    #[test]
    fn rejects_unknown_global_service() {
        let input = "project_path = \".\"\nglobal_services = [\"mainframe\"]\n";
        assert!(BuildConfig::parse_str(input).is_err());
    }

    #[test]
    fn load_resolves_relative_project_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "project_path = \"app\"\n").unwrap();
        let config = BuildConfig::load(&path).unwrap();
        assert_eq!(config.project_path, dir.path().join("app"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BuildConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, SchemaError::Io(_)));
    }
}
