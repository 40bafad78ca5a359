//! Data-node resolution against a schema.
//!
//! [`SchemaResolver`] is the seam between the edit-config aggregator and the
//! schema. Given the data path of a parent and the XML name of a child, it
//! answers what kind of node the child is, or that no such node exists.
//! Choice and case nodes never surface: their children resolve as if they
//! were children of the choice's parent.

use crate::context::{SchemaContext, SchemaNode, SchemaNodeKind};
use crate::name::{QualifiedName, SchemaPath};

/// Kind of a data node, as far as edit aggregation cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    /// A list; `keys` are in the order the schema declares them.
    List { keys: Vec<QualifiedName> },
    Leaf,
    LeafList,
}

/// A successfully resolved data node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    pub name: QualifiedName,
    pub kind: NodeKind,
}

/// Resolves XML element names to schema data nodes.
///
/// Implementations must be pure lookups: the same inputs always produce the
/// same answer, and no state is kept between calls.
pub trait SchemaResolver {
    /// Resolve a child of the node at `parent`.
    ///
    /// Returns `None` when the parent path does not lead to a node that can
    /// hold children, or when the child does not exist under it.
    fn resolve(
        &self,
        parent: &SchemaPath,
        namespace: Option<&str>,
        local_name: &str,
    ) -> Option<ResolvedNode>;

    /// Build the qualified name of an element, filling in the module
    /// revision when the namespace is known.
    fn qualify(&self, namespace: Option<&str>, local_name: &str) -> QualifiedName;
}

impl SchemaResolver for SchemaContext {
    fn resolve(
        &self,
        parent: &SchemaPath,
        namespace: Option<&str>,
        local_name: &str,
    ) -> Option<ResolvedNode> {
        let mut scope = Scope::root(self);
        for step in parent.steps() {
            let (context, node) = scope.find(Some(step.namespace.as_str()), &step.local_name)?;
            scope = Scope::children_of(context, node)?;
        }

        let (_, node) = scope.find(namespace, local_name)?;
        let kind = match &node.kind {
            SchemaNodeKind::Container { .. } => NodeKind::Container,
            SchemaNodeKind::List { keys, .. } => NodeKind::List { keys: keys.clone() },
            SchemaNodeKind::Leaf => NodeKind::Leaf,
            SchemaNodeKind::LeafList => NodeKind::LeafList,
            // find_data_node descends into choices, it never returns one
            SchemaNodeKind::Choice { .. } => return None,
        };

        Some(ResolvedNode {
            name: node.name.clone(),
            kind,
        })
    }

    fn qualify(&self, namespace: Option<&str>, local_name: &str) -> QualifiedName {
        let namespace = namespace.unwrap_or_default();
        let revision = self
            .module_by_namespace(namespace)
            .and_then(|module| module.revision.as_deref());
        QualifiedName::new(namespace, revision, local_name)
    }
}

/// The nodes visible as children at one point of a path walk.
struct Scope<'a> {
    context: &'a SchemaContext,
    nodes: &'a [SchemaNode],
    /// Schema mounted at the current node, whose top-level nodes are
    /// children here as well.
    mounted: Option<&'a SchemaContext>,
}

impl<'a> Scope<'a> {
    fn root(context: &'a SchemaContext) -> Self {
        Self {
            context,
            nodes: context.nodes(),
            mounted: None,
        }
    }

    fn children_of(context: &'a SchemaContext, node: &'a SchemaNode) -> Option<Self> {
        let nodes = node.data_children()?;
        let mounted = node.mount_point().and_then(|label| context.mounted(label));
        Some(Self {
            context,
            nodes,
            mounted,
        })
    }

    fn find(
        &self,
        namespace: Option<&str>,
        local_name: &str,
    ) -> Option<(&'a SchemaContext, &'a SchemaNode)> {
        if let Some(node) = find_data_node(self.nodes, namespace, local_name) {
            return Some((self.context, node));
        }
        let mounted = self.mounted?;
        find_data_node(mounted.nodes(), namespace, local_name).map(|node| (mounted, node))
    }
}

fn find_data_node<'a>(
    nodes: &'a [SchemaNode],
    namespace: Option<&str>,
    local_name: &str,
) -> Option<&'a SchemaNode> {
    for node in nodes {
        match &node.kind {
            SchemaNodeKind::Choice { cases } => {
                let found = cases
                    .iter()
                    .find_map(|case| find_data_node(&case.children, namespace, local_name));
                if found.is_some() {
                    return found;
                }
            }
            _ if node.name.matches(namespace, local_name) => return Some(node),
            _ => {}
        }
    }
    None
}
