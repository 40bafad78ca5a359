//! Errors raised while loading and compiling schemas.

use crate::name::QualifiedName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to parse YAML schema definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON schema definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown grouping '{grouping}' used in module {module}")]
    UnknownGrouping { module: String, grouping: String },

    #[error("Grouping '{grouping}' in module {module} uses itself")]
    RecursiveGrouping { module: String, grouping: String },

    #[error("Augment target '{target}' of module {module} is not a container, list or case")]
    InvalidAugmentTarget { module: String, target: String },

    #[error("Key '{key}' of list {list} is not a leaf of the list")]
    InvalidKey { list: QualifiedName, key: String },

    #[error("Mount point '{label}' on {node} has no mounted schema")]
    UnknownMount { label: String, node: QualifiedName },
}
