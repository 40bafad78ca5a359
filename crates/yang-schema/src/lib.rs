//! Compiled YANG schema trees for NETCONF edit processing.
//!
//! This crate provides the schema side of edit-config handling: qualified
//! names, data paths, and a [`SchemaResolver`] that tells callers whether an
//! element names a container, list, leaf or leaf-list under a given parent.
//!
//! # Architecture
//!
//! - [`SchemaDefinition`]: serde-deserializable description of modules,
//!   groupings, augments and mounted schemas
//! - [`SchemaContext`]: the compiled, immutable schema
//! - [`SchemaResolver`]: the lookup interface; [`SchemaContext`] implements it,
//!   and tests can supply their own
//!
//! Choice and case nodes are resolved transparently and never appear in a
//! [`SchemaPath`]. A container declared as a mount point also exposes the
//! top-level nodes of the schema mounted under its label.
//!
//! # Example
//!
//! ```rust
//! use yang_schema::{NodeKind, SchemaContext, SchemaPath, SchemaResolver};
//!
//! let schema = SchemaContext::from_yaml_str(r#"
//! modules:
//!   - name: example
//!     namespace: urn:example
//!     revision: 2019-02-14
//!     nodes:
//!       - kind: list
//!         name: entry
//!         keys: [id]
//!         children:
//!           - { kind: leaf, name: id }
//! "#).unwrap();
//!
//! let entry = schema
//!     .resolve(&SchemaPath::root(), Some("urn:example"), "entry")
//!     .unwrap();
//! assert!(matches!(entry.kind, NodeKind::List { ref keys } if keys.len() == 1));
//! assert_eq!(entry.name.to_string(), "(urn:example?revision=2019-02-14)entry");
//! ```

mod context;
mod definition;
mod error;
mod name;
mod resolver;

pub use context::{ModuleInfo, SchemaCase, SchemaContext, SchemaNode, SchemaNodeKind};
pub use definition::{
    AugmentDefinition, CaseDefinition, ModuleDefinition, NodeDefinition, SchemaDefinition,
};
pub use error::SchemaError;
pub use name::{QualifiedName, SchemaPath};
pub use resolver::{NodeKind, ResolvedNode, SchemaResolver};
