//! Declarative schema definitions.
//!
//! A [`SchemaDefinition`] is the serialized form of a schema: the modules
//! it contains plus any schemas mounted inside it. It deserializes from
//! YAML or JSON and is compiled into a [`SchemaContext`](crate::SchemaContext).
//!
//! ```yaml
//! modules:
//!   - name: example
//!     namespace: urn:example
//!     revision: 2019-02-14
//!     groupings:
//!       names:
//!         - { kind: leaf, name: name3 }
//!     nodes:
//!       - kind: container
//!         name: top
//!         children:
//!           - kind: list
//!             name: entry
//!             keys: [name1]
//!             children:
//!               - { kind: leaf, name: name1 }
//!               - { kind: uses, grouping: names }
//!     augments:
//!       - target: /top
//!         nodes:
//!           - { kind: leaf-list, name: tags }
//! mounts:
//!   device:
//!     modules: []
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

/// A set of modules and the schemas mounted under them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub modules: Vec<ModuleDefinition>,

    /// Mounted schemas, keyed by the mount-point label that exposes them.
    #[serde(default)]
    pub mounts: IndexMap<String, SchemaDefinition>,
}

/// One YANG module.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDefinition {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub revision: Option<String>,

    /// Top-level data nodes.
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,

    /// Reusable node sets, expanded wherever `uses` names them.
    #[serde(default)]
    pub groupings: IndexMap<String, Vec<NodeDefinition>>,

    /// Nodes this module adds under nodes of any module in the same schema.
    #[serde(default)]
    pub augments: Vec<AugmentDefinition>,
}

/// A schema node as written in a definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NodeDefinition {
    Container {
        name: String,
        #[serde(default)]
        children: Vec<NodeDefinition>,
        /// Label of the schema mounted at this container, if any.
        #[serde(default, rename = "mount-point")]
        mount_point: Option<String>,
    },
    List {
        name: String,
        keys: Vec<String>,
        #[serde(default)]
        children: Vec<NodeDefinition>,
    },
    Leaf {
        name: String,
    },
    LeafList {
        name: String,
    },
    Choice {
        name: String,
        cases: Vec<CaseDefinition>,
    },
    Uses {
        grouping: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaseDefinition {
    pub name: String,
    #[serde(default)]
    pub children: Vec<NodeDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AugmentDefinition {
    /// Slash-separated path of local names, e.g. `/top/choice/case`.
    ///
    /// Segments may carry a `prefix:` which is ignored.
    pub target: String,
    pub nodes: Vec<NodeDefinition>,
}

impl SchemaDefinition {
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}
