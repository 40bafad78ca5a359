//! Core type definitions for edit-config aggregation.

use std::fmt;
use thiserror::Error;
use yang_schema::{QualifiedName, SchemaPath};

/// Namespace of the NETCONF base protocol, which owns the `operation` attribute.
pub const NETCONF_BASE_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// A NETCONF edit operation, as carried by the `operation` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOperation {
    /// Merge the node into existing configuration.
    Merge,
    /// Create the node; it must not exist yet.
    Create,
    /// Delete the node; it must exist.
    Delete,
    /// Replace the node and everything below it.
    Replace,
    /// Delete the node if it exists.
    Remove,
}

impl EditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditOperation::Merge => "merge",
            EditOperation::Create => "create",
            EditOperation::Delete => "delete",
            EditOperation::Replace => "replace",
            EditOperation::Remove => "remove",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "merge" => Some(EditOperation::Merge),
            "create" => Some(EditOperation::Create),
            "delete" => Some(EditOperation::Delete),
            "replace" => Some(EditOperation::Replace),
            "remove" => Some(EditOperation::Remove),
            _ => None,
        }
    }

    /// Whether the node ends up absent from the datastore.
    pub fn is_deletion(&self) -> bool {
        matches!(self, EditOperation::Delete | EditOperation::Remove)
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for aggregation.
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Maximum element nesting depth (default: 256).
    ///
    /// Aggregation fails with `AggregationError::NestingTooDeep` when a
    /// payload nests deeper than this.
    pub max_depth: usize,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// Errors that abort an aggregation.
///
/// Every variant is fatal; no partial result is produced.
#[derive(Debug, Clone, Error)]
pub enum AggregationError {
    /// Two payloads set operations on the same node that cannot be combined.
    #[error("Incompatible operations found in edit-configs : <{first}>X<{second}> on node : {node}")]
    IncompatibleOperations {
        first: EditOperation,
        second: EditOperation,
        node: QualifiedName,
    },

    /// A node's operation contradicts the operation of an ancestor in the same payload.
    #[error("Specified operation <{operation}> is forbidden inside parent operation <{parent}> on node : {node}")]
    ForbiddenNestedOperation {
        operation: EditOperation,
        parent: EditOperation,
        node: QualifiedName,
    },

    /// A list entry lacks one of its key leaves.
    #[error("Could not find the key element {key} for the node {list}")]
    MissingKey {
        key: QualifiedName,
        list: QualifiedName,
    },

    /// A list key element holds child elements instead of a value.
    #[error("Key element {key} of node {list} must hold text only")]
    InvalidKeyValue {
        key: QualifiedName,
        list: QualifiedName,
    },

    /// An element does not correspond to any data node of the schema.
    #[error("Could not find the node {node} in the YANG schema.")]
    NodeNotFound {
        node: QualifiedName,
        /// The schema context that was searched.
        context: SchemaPath,
    },

    /// Values of one leaf-list arrived in more than one payload.
    #[error("Cannot merge leaf-lists from more than one edit-config, found multiple leaf-lists of type: {node}")]
    LeafListSplit { node: QualifiedName },

    /// The `operation` attribute holds an unknown value.
    #[error("Invalid operation attribute value '{value}' on node : {node}")]
    InvalidOperation { value: String, node: QualifiedName },

    /// Payloads nest deeper than `AggregatorOptions::max_depth`.
    #[error("Edit-config nesting too deep (max depth: {max_depth}) at node : {node}")]
    NestingTooDeep {
        max_depth: usize,
        node: QualifiedName,
    },

    /// The aggregated request wrapper is not shaped as expected.
    #[error("Malformed aggregated edit-config: {message}")]
    MalformedRequest { message: String },

    #[error(transparent)]
    Xml(#[from] netconf_xml::Error),
}

pub type Result<T> = std::result::Result<T, AggregationError>;
