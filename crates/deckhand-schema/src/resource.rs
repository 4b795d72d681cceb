use crate::types::ResourceName;
use crate::value::{substitute_all, Substitutions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Attribute holding an entry's type tag.
pub const RESOURCE_TYPE_FIELD: &str = "resource_type";
/// Attribute holding the ordered list of `{resource_name, ...}` dependencies.
pub const DEPENDENCIES_FIELD: &str = "dependencies";
/// Key naming the target inside a dependency object.
pub const DEPENDENCY_NAME_FIELD: &str = "resource_name";
/// Derived storage location of an entry's deployment package.
pub const S3_PATH_FIELD: &str = "s3_path";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("failed to parse descriptor: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("unknown resource type '{0}'")]
    UnknownResourceType(String),
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
}

/// Every resource kind the provisioning engine knows how to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// API-like aggregate of named sub-resources; the only mergeable type.
    ApiGateway,
    /// Generic package deployment.
    BeanstalkApp,
    CloudwatchAlarm,
    CloudwatchRule,
    CognitoFederatedPool,
    DynamodbTable,
    Ec2Instance,
    IamPolicy,
    IamRole,
    KinesisStream,
    Lambda,
    S3Bucket,
    SnsApplication,
    SnsTopic,
    SqsQueue,
    SfnActivity,
    StepFunctions,
}

impl ResourceType {
    pub const ALL: &'static [ResourceType] = &[
        Self::ApiGateway,
        Self::BeanstalkApp,
        Self::CloudwatchAlarm,
        Self::CloudwatchRule,
        Self::CognitoFederatedPool,
        Self::DynamodbTable,
        Self::Ec2Instance,
        Self::IamPolicy,
        Self::IamRole,
        Self::KinesisStream,
        Self::Lambda,
        Self::S3Bucket,
        Self::SnsApplication,
        Self::SnsTopic,
        Self::SqsQueue,
        Self::SfnActivity,
        Self::StepFunctions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiGateway => "api_gateway",
            Self::BeanstalkApp => "beanstalk_app",
            Self::CloudwatchAlarm => "cloudwatch_alarm",
            Self::CloudwatchRule => "cloudwatch_rule",
            Self::CognitoFederatedPool => "cognito_federated_pool",
            Self::DynamodbTable => "dynamodb_table",
            Self::Ec2Instance => "ec2_instance",
            Self::IamPolicy => "iam_policy",
            Self::IamRole => "iam_role",
            Self::KinesisStream => "kinesis_stream",
            Self::Lambda => "lambda",
            Self::S3Bucket => "s3_bucket",
            Self::SnsApplication => "sns_application",
            Self::SnsTopic => "sns_topic",
            Self::SqsQueue => "sqs_queue",
            Self::SfnActivity => "sfn_activity",
            Self::StepFunctions => "step_functions",
        }
    }

    /// Whether two same-named entries of this type may be merged by union.
    pub fn is_composite(self) -> bool {
        self == Self::ApiGateway
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownResourceType(s.to_owned()))
    }
}

/// One deployable unit's descriptor: an open attribute map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceEntry(Map<String, Value>);

impl ResourceEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed JSON value; anything but an object is rejected.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(SchemaError::InvalidDescriptor(format!(
                "expected a JSON object, found {}",
                value_kind(&other)
            ))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// String attribute; empty strings count as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn resource_type_str(&self) -> Option<&str> {
        self.get_str(RESOURCE_TYPE_FIELD)
    }

    /// Parsed type tag, `None` when the attribute is missing or unknown.
    pub fn resource_type(&self) -> Option<ResourceType> {
        self.resource_type_str().and_then(|s| s.parse().ok())
    }

    /// Names referenced by the `dependencies` list, in declaration order.
    pub fn dependency_names(&self) -> Vec<&str> {
        self.0
            .get(DEPENDENCIES_FIELD)
            .and_then(Value::as_array)
            .map(|deps| {
                deps.iter()
                    .filter_map(|d| d.get(DEPENDENCY_NAME_FIELD).and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn s3_path(&self) -> Option<&str> {
        self.get_str(S3_PATH_FIELD)
    }

    /// Rewrite string values throughout the entry; attribute names are kept.
    #[must_use]
    pub fn substitute_all(self, subs: &Substitutions) -> Self {
        if subs.is_empty() {
            return self;
        }
        Self(
            self.0
                .into_iter()
                .map(|(key, value)| (key, substitute_all(value, subs)))
                .collect(),
        )
    }
}

impl From<Map<String, Value>> for ResourceEntry {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Consolidated mapping of resource name to descriptor, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<ResourceName, ResourceEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_str(input: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn get(&self, name: &str) -> Option<&ResourceEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn insert(&mut self, name: ResourceName, entry: ResourceEntry) -> Option<ResourceEntry> {
        self.entries.insert(name, entry)
    }

    pub fn remove(&mut self, name: &str) -> Option<ResourceEntry> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &ResourceName> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceName, &ResourceEntry)> {
        self.entries.iter()
    }

    /// Rewrite string values in every entry; resource names are kept.
    #[must_use]
    pub fn substitute_all(self, subs: &Substitutions) -> Self {
        self.into_iter()
            .map(|(name, entry)| (name, entry.substitute_all(subs)))
            .collect()
    }
}

impl IntoIterator for Manifest {
    type Item = (ResourceName, ResourceEntry);
    type IntoIter = std::collections::btree_map::IntoIter<ResourceName, ResourceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(ResourceName, ResourceEntry)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (ResourceName, ResourceEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
