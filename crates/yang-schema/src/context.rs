//! Compiled schema trees.
//!
//! Compilation turns a [`SchemaDefinition`] into an immutable
//! [`SchemaContext`]: groupings are expanded in place, augments are grafted
//! onto their targets, list keys are checked, and every node gets the
//! qualified name of the module that defines it. Mounted schemas are
//! compiled recursively and stay attached to the context that mounts them.

use crate::definition::{ModuleDefinition, NodeDefinition, SchemaDefinition};
use crate::error::SchemaError;
use crate::name::QualifiedName;
use indexmap::IndexMap;

/// Identity of a compiled module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub namespace: String,
    pub revision: Option<String>,
}

/// A compiled, immutable schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    modules: Vec<ModuleInfo>,
    nodes: Vec<SchemaNode>,
    mounts: IndexMap<String, SchemaContext>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub name: QualifiedName,
    pub kind: SchemaNodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNodeKind {
    Container {
        children: Vec<SchemaNode>,
        mount_point: Option<String>,
    },
    List {
        keys: Vec<QualifiedName>,
        children: Vec<SchemaNode>,
    },
    Leaf,
    LeafList,
    Choice {
        cases: Vec<SchemaCase>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaCase {
    pub name: QualifiedName,
    pub children: Vec<SchemaNode>,
}

impl SchemaContext {
    /// Compile a definition into a schema.
    pub fn compile(definition: SchemaDefinition) -> Result<Self, SchemaError> {
        let mut modules = Vec::with_capacity(definition.modules.len());
        let mut nodes = Vec::new();

        for module in &definition.modules {
            let info = ModuleInfo {
                name: module.name.clone(),
                namespace: module.namespace.clone(),
                revision: module.revision.clone(),
            };
            let mut builder = NodeBuilder::new(module, &info);
            nodes.extend(builder.build_all(&module.nodes)?);
            modules.push(info);
        }

        for (module, info) in definition.modules.iter().zip(&modules) {
            for augment in &module.augments {
                let segments: Vec<&str> = augment
                    .target
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(|s| s.rsplit(':').next().unwrap_or(s))
                    .collect();
                let invalid_target = || SchemaError::InvalidAugmentTarget {
                    module: module.name.clone(),
                    target: augment.target.clone(),
                };

                let mut builder = NodeBuilder::new(module, info);
                let added = builder.build_all(&augment.nodes)?;
                let target = augment_target(&mut nodes, &segments).ok_or_else(invalid_target)?;
                target.extend(added);
            }
        }

        let mut mounts = IndexMap::with_capacity(definition.mounts.len());
        for (label, mounted) in definition.mounts {
            mounts.insert(label, SchemaContext::compile(mounted)?);
        }

        check_mount_points(&nodes, &mounts)?;

        tracing::debug!(
            modules = modules.len(),
            top_level_nodes = nodes.len(),
            mounts = mounts.len(),
            "Compiled schema"
        );

        Ok(Self {
            modules,
            nodes,
            mounts,
        })
    }

    /// Load and compile a YAML schema definition.
    pub fn from_yaml_str(content: &str) -> Result<Self, SchemaError> {
        Self::compile(SchemaDefinition::from_yaml_str(content)?)
    }

    /// Load and compile a JSON schema definition.
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        Self::compile(SchemaDefinition::from_json_str(content)?)
    }

    pub fn modules(&self) -> &[ModuleInfo] {
        &self.modules
    }

    /// Top-level data nodes of all modules, in definition order.
    pub fn nodes(&self) -> &[SchemaNode] {
        &self.nodes
    }

    /// The schema mounted under `label`.
    pub fn mounted(&self, label: &str) -> Option<&SchemaContext> {
        self.mounts.get(label)
    }

    /// Find a module by namespace, searching mounted schemas too.
    pub fn module_by_namespace(&self, namespace: &str) -> Option<&ModuleInfo> {
        self.modules
            .iter()
            .find(|m| m.namespace == namespace)
            .or_else(|| {
                self.mounts
                    .values()
                    .find_map(|mounted| mounted.module_by_namespace(namespace))
            })
    }
}

impl SchemaNode {
    /// Children that hold data directly (containers and lists).
    pub fn data_children(&self) -> Option<&[SchemaNode]> {
        match &self.kind {
            SchemaNodeKind::Container { children, .. } | SchemaNodeKind::List { children, .. } => {
                Some(children)
            }
            _ => None,
        }
    }

    pub fn mount_point(&self) -> Option<&str> {
        match &self.kind {
            SchemaNodeKind::Container { mount_point, .. } => mount_point.as_deref(),
            _ => None,
        }
    }
}

/// Expands node definitions of one module.
struct NodeBuilder<'a> {
    module: &'a ModuleDefinition,
    info: &'a ModuleInfo,
    /// Groupings currently being expanded, to detect self-use.
    expanding: Vec<&'a str>,
}

impl<'a> NodeBuilder<'a> {
    fn new(module: &'a ModuleDefinition, info: &'a ModuleInfo) -> Self {
        Self {
            module,
            info,
            expanding: Vec::new(),
        }
    }

    fn name(&self, local_name: &str) -> QualifiedName {
        QualifiedName::new(
            self.info.namespace.as_str(),
            self.info.revision.as_deref(),
            local_name,
        )
    }

    fn build_all(&mut self, definitions: &'a [NodeDefinition]) -> Result<Vec<SchemaNode>, SchemaError> {
        let mut nodes = Vec::with_capacity(definitions.len());
        for definition in definitions {
            self.build(definition, &mut nodes)?;
        }
        Ok(nodes)
    }

    fn build(
        &mut self,
        definition: &'a NodeDefinition,
        out: &mut Vec<SchemaNode>,
    ) -> Result<(), SchemaError> {
        let node = match definition {
            NodeDefinition::Container {
                name,
                children,
                mount_point,
            } => SchemaNode {
                name: self.name(name),
                kind: SchemaNodeKind::Container {
                    children: self.build_all(children)?,
                    mount_point: mount_point.clone(),
                },
            },
            NodeDefinition::List {
                name,
                keys,
                children,
            } => {
                let list_name = self.name(name);
                let children = self.build_all(children)?;
                let mut key_names = Vec::with_capacity(keys.len());
                for key in keys {
                    let is_leaf = children.iter().any(|c| {
                        c.name.local_name == *key && matches!(c.kind, SchemaNodeKind::Leaf)
                    });
                    if !is_leaf {
                        return Err(SchemaError::InvalidKey {
                            list: list_name,
                            key: key.clone(),
                        });
                    }
                    key_names.push(self.name(key));
                }
                SchemaNode {
                    name: list_name,
                    kind: SchemaNodeKind::List {
                        keys: key_names,
                        children,
                    },
                }
            }
            NodeDefinition::Leaf { name } => SchemaNode {
                name: self.name(name),
                kind: SchemaNodeKind::Leaf,
            },
            NodeDefinition::LeafList { name } => SchemaNode {
                name: self.name(name),
                kind: SchemaNodeKind::LeafList,
            },
            NodeDefinition::Choice { name, cases } => {
                let mut compiled = Vec::with_capacity(cases.len());
                for case in cases {
                    compiled.push(SchemaCase {
                        name: self.name(&case.name),
                        children: self.build_all(&case.children)?,
                    });
                }
                SchemaNode {
                    name: self.name(name),
                    kind: SchemaNodeKind::Choice { cases: compiled },
                }
            }
            NodeDefinition::Uses { grouping } => {
                let module = self.module;
                let (key, definitions) = module
                    .groupings
                    .get_key_value(grouping)
                    .ok_or_else(|| SchemaError::UnknownGrouping {
                        module: self.module.name.clone(),
                        grouping: grouping.clone(),
                    })?;
                if self.expanding.contains(&key.as_str()) {
                    return Err(SchemaError::RecursiveGrouping {
                        module: self.module.name.clone(),
                        grouping: grouping.clone(),
                    });
                }
                self.expanding.push(key.as_str());
                let expanded = self.build_all(definitions)?;
                self.expanding.pop();
                out.extend(expanded);
                return Ok(());
            }
        };
        out.push(node);
        Ok(())
    }
}

/// Locate the child list an augment adds its nodes to.
fn augment_target<'n>(
    nodes: &'n mut [SchemaNode],
    segments: &[&str],
) -> Option<&'n mut Vec<SchemaNode>> {
    let (first, rest) = segments.split_first()?;
    let node = nodes.iter_mut().find(|n| n.name.local_name == *first)?;
    match &mut node.kind {
        SchemaNodeKind::Container { children, .. } | SchemaNodeKind::List { children, .. } => {
            if rest.is_empty() {
                Some(children)
            } else {
                augment_target(children, rest)
            }
        }
        SchemaNodeKind::Choice { cases } => {
            let (case_name, rest) = rest.split_first()?;
            let case = cases.iter_mut().find(|c| c.name.local_name == *case_name)?;
            if rest.is_empty() {
                Some(&mut case.children)
            } else {
                augment_target(&mut case.children, rest)
            }
        }
        SchemaNodeKind::Leaf | SchemaNodeKind::LeafList => None,
    }
}

fn check_mount_points(
    nodes: &[SchemaNode],
    mounts: &IndexMap<String, SchemaContext>,
) -> Result<(), SchemaError> {
    for node in nodes {
        if let Some(label) = node.mount_point()
            && !mounts.contains_key(label)
        {
            return Err(SchemaError::UnknownMount {
                label: label.to_string(),
                node: node.name.clone(),
            });
        }
        match &node.kind {
            SchemaNodeKind::Container { children, .. } | SchemaNodeKind::List { children, .. } => {
                check_mount_points(children, mounts)?
            }
            SchemaNodeKind::Choice { cases } => {
                for case in cases {
                    check_mount_points(&case.children, mounts)?;
                }
            }
            SchemaNodeKind::Leaf | SchemaNodeKind::LeafList => {}
        }
    }
    Ok(())
}
