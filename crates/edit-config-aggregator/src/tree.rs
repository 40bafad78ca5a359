//! The aggregated tree.
//!
//! An [`AggregatedTree`] is built from the first edit payload and then grows
//! as further payloads are folded in with [`AggregatedTree::add`]. Every
//! element is resolved against the schema on the way in, so the tree only
//! ever holds data nodes: choice and case levels never appear, and list
//! entries are told apart by their key values.
//!
//! Folding is all-or-nothing. A payload that violates an operation rule
//! leaves the tree exactly as it was before the call.

use crate::operation::{allowed_inside, combine, parse_operation};
use crate::payload::EditPayload;
use crate::render::render;
use crate::types::{AggregationError, AggregatorOptions, EditOperation, NETCONF_BASE_NS, Result};
use indexmap::IndexMap;
use indexmap::map::Entry;
use netconf_xml::XmlElement;
use yang_schema::{NodeKind, QualifiedName, SchemaPath, SchemaResolver};

/// Identity of a child among its siblings.
///
/// List entries are identified by name and key values; every other node by
/// name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    pub name: QualifiedName,
    pub keys: Vec<String>,
}

impl NodeIdentity {
    fn new(name: QualifiedName, keys: Vec<String>) -> Self {
        Self { name, keys }
    }
}

/// One value of a leaf-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafListValue {
    pub value: String,
    pub operation: Option<EditOperation>,
}

/// What an aggregated node holds besides its children.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregatedNodeKind {
    /// The synthetic node above all payload roots.
    Root,
    Container,
    /// One entry of a list. `keys` are the schema key names in declaration
    /// order, `values` the matching key values.
    ListEntry {
        keys: Vec<QualifiedName>,
        values: Vec<String>,
    },
    Leaf { value: Option<String> },
    /// A leaf-list and the index of the payload that contributed its values.
    LeafList {
        values: Vec<LeafListValue>,
        payload: usize,
    },
}

/// A node of the aggregated tree.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTreeNode {
    name: QualifiedName,
    kind: AggregatedNodeKind,
    operation: Option<EditOperation>,
    children: IndexMap<NodeIdentity, AggregatedTreeNode>,
}

impl AggregatedTreeNode {
    fn new(name: QualifiedName, kind: AggregatedNodeKind, operation: Option<EditOperation>) -> Self {
        Self {
            name,
            kind,
            operation,
            children: IndexMap::new(),
        }
    }

    fn root() -> Self {
        Self::new(
            QualifiedName::new(NETCONF_BASE_NS, None, "config"),
            AggregatedNodeKind::Root,
            None,
        )
    }

    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub fn kind(&self) -> &AggregatedNodeKind {
        &self.kind
    }

    /// The explicit operation in effect on this node, if any was ever set.
    ///
    /// Always `None` for leaf-lists, whose operations live on the values.
    pub fn operation(&self) -> Option<EditOperation> {
        self.operation
    }

    /// Children in first-insertion order.
    pub fn children(&self) -> impl Iterator<Item = &AggregatedTreeNode> {
        self.children.values()
    }

    /// First child with the given local name.
    pub fn child(&self, local_name: &str) -> Option<&AggregatedTreeNode> {
        self.children().find(|c| c.name.local_name == local_name)
    }

    /// The list entry with the given local name and key values.
    pub fn entry(&self, local_name: &str, keys: &[&str]) -> Option<&AggregatedTreeNode> {
        self.children.iter().find_map(|(identity, child)| {
            (identity.name.local_name == local_name && identity.keys == keys).then_some(child)
        })
    }

    /// Text of a leaf.
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            AggregatedNodeKind::Leaf { value } => value.as_deref(),
            _ => None,
        }
    }

    /// Whether `name` is a key leaf of this list entry.
    pub(crate) fn is_key_child(&self, name: &QualifiedName) -> bool {
        match &self.kind {
            AggregatedNodeKind::ListEntry { keys, .. } => keys.contains(name),
            _ => false,
        }
    }

    /// Drop everything but list keys.
    fn clear_content(&mut self) {
        let keys = match &self.kind {
            AggregatedNodeKind::ListEntry { keys, .. } => keys.clone(),
            _ => Vec::new(),
        };
        self.children.retain(|identity, _| keys.contains(&identity.name));
        if let AggregatedNodeKind::Leaf { value } = &mut self.kind {
            *value = None;
        }
    }
}

/// A merged view of a sequence of edit payloads.
pub struct AggregatedTree<'r, R: SchemaResolver + ?Sized> {
    resolver: &'r R,
    options: AggregatorOptions,
    root: AggregatedTreeNode,
    payloads: usize,
}

impl<'r, R: SchemaResolver + ?Sized> AggregatedTree<'r, R> {
    /// Build a tree from the first payload.
    ///
    /// All root elements of the payload become children of one synthetic
    /// root node.
    pub fn construct(initial: &EditPayload, resolver: &'r R) -> Result<Self> {
        Self::construct_with_options(initial, resolver, AggregatorOptions::default())
    }

    pub fn construct_with_options(
        initial: &EditPayload,
        resolver: &'r R,
        options: AggregatorOptions,
    ) -> Result<Self> {
        let mut tree = Self {
            resolver,
            options,
            root: AggregatedTreeNode::root(),
            payloads: 0,
        };
        tree.add(initial)?;
        Ok(tree)
    }

    /// Fold one more payload into the tree.
    ///
    /// On error the tree is left unchanged.
    pub fn add(&mut self, payload: &EditPayload) -> Result<()> {
        let folder = Folder {
            resolver: self.resolver,
            options: &self.options,
            payload: self.payloads,
        };

        let mut root = self.root.clone();
        for element in payload.roots() {
            folder.fold(&mut root, &SchemaPath::root(), element, None, 1)?;
        }

        tracing::debug!(
            payload = self.payloads,
            roots = payload.roots().len(),
            "Folded edit-config payload"
        );
        self.root = root;
        self.payloads += 1;
        Ok(())
    }

    /// Render the tree as a NETCONF `config` element.
    pub fn to_dom(&self) -> XmlElement {
        let config = render(&self.root);
        tracing::debug!(
            roots = self.root.children.len(),
            payloads = self.payloads,
            "Rendered aggregated tree"
        );
        config
    }

    pub fn root(&self) -> &AggregatedTreeNode {
        &self.root
    }

    /// Number of payloads folded so far.
    pub fn payload_count(&self) -> usize {
        self.payloads
    }
}

struct Folder<'a, R: ?Sized> {
    resolver: &'a R,
    options: &'a AggregatorOptions,
    payload: usize,
}

impl<R: SchemaResolver + ?Sized> Folder<'_, R> {
    /// Fold `element` into `parent`, whose data path is `path`.
    ///
    /// `inherited` is the nearest explicit operation among the element's
    /// ancestors in the current payload.
    fn fold(
        &self,
        parent: &mut AggregatedTreeNode,
        path: &SchemaPath,
        element: &XmlElement,
        inherited: Option<EditOperation>,
        depth: usize,
    ) -> Result<()> {
        let namespace = element.namespace.as_deref();
        let Some(resolved) = self.resolver.resolve(path, namespace, &element.name) else {
            return Err(AggregationError::NodeNotFound {
                node: self.resolver.qualify(namespace, &element.name),
                context: path.clone(),
            });
        };
        let name = resolved.name;

        if depth > self.options.max_depth {
            return Err(AggregationError::NestingTooDeep {
                max_depth: self.options.max_depth,
                node: name,
            });
        }

        let operation = parse_operation(element, &name)?;
        if let Some(parent_operation) = inherited
            && let Some(operation) = operation
            && !allowed_inside(parent_operation, operation)
        {
            return Err(AggregationError::ForbiddenNestedOperation {
                operation,
                parent: parent_operation,
                node: name,
            });
        }

        let kind = match resolved.kind {
            NodeKind::LeafList => return self.fold_leaf_list(parent, name, element, operation),
            NodeKind::Container => AggregatedNodeKind::Container,
            NodeKind::Leaf => AggregatedNodeKind::Leaf { value: None },
            NodeKind::List { keys } => {
                let values = key_values(element, &name, &keys)?;
                AggregatedNodeKind::ListEntry { keys, values }
            }
        };
        let identity = match &kind {
            AggregatedNodeKind::ListEntry { values, .. } => {
                NodeIdentity::new(name.clone(), values.clone())
            }
            _ => NodeIdentity::new(name.clone(), Vec::new()),
        };

        let node = match parent.children.entry(identity) {
            Entry::Occupied(entry) => {
                tracing::trace!(node = %name, ?operation, "Merging into existing node");
                let node = entry.into_mut();
                let combined = combine(node.operation, operation).map_err(|(first, second)| {
                    AggregationError::IncompatibleOperations {
                        first,
                        second,
                        node: name.clone(),
                    }
                })?;
                node.operation = combined.operation;
                if combined.discard_existing {
                    node.clear_content();
                }
                node
            }
            Entry::Vacant(entry) => {
                tracing::trace!(node = %name, ?operation, "Creating node");
                entry.insert(AggregatedTreeNode::new(name.clone(), kind, operation))
            }
        };

        if let AggregatedNodeKind::Leaf { value } = &mut node.kind
            && let Some(text) = element.text()
        {
            *value = Some(text.to_string());
        }

        let child_path = path.child(name);
        let effective = operation.or(inherited);
        for child in element.all_children() {
            self.fold(node, &child_path, child, effective, depth + 1)?;
        }

        if node.operation.is_some_and(|op| op.is_deletion()) {
            node.clear_content();
        }
        Ok(())
    }

    /// Fold one leaf-list value.
    ///
    /// Values of a leaf-list may only come from a single payload. Within it,
    /// a repeated value keeps its first position.
    fn fold_leaf_list(
        &self,
        parent: &mut AggregatedTreeNode,
        name: QualifiedName,
        element: &XmlElement,
        operation: Option<EditOperation>,
    ) -> Result<()> {
        let node = parent
            .children
            .entry(NodeIdentity::new(name.clone(), Vec::new()))
            .or_insert_with(|| {
                AggregatedTreeNode::new(
                    name.clone(),
                    AggregatedNodeKind::LeafList {
                        values: Vec::new(),
                        payload: self.payload,
                    },
                    None,
                )
            });

        let AggregatedNodeKind::LeafList { values, payload } = &mut node.kind else {
            return Ok(());
        };
        if *payload != self.payload {
            return Err(AggregationError::LeafListSplit { node: name });
        }

        let value = element.text().unwrap_or_default();
        match values.iter_mut().find(|v| v.value == value) {
            Some(existing) => {
                let combined = combine(existing.operation, operation).map_err(|(first, second)| {
                    AggregationError::IncompatibleOperations {
                        first,
                        second,
                        node: name,
                    }
                })?;
                existing.operation = combined.operation;
            }
            None => values.push(LeafListValue {
                value: value.to_string(),
                operation,
            }),
        }
        Ok(())
    }
}

/// Read the key values of a list entry, in schema key order.
///
/// An empty key element yields an empty value.
fn key_values(
    element: &XmlElement,
    list: &QualifiedName,
    keys: &[QualifiedName],
) -> Result<Vec<String>> {
    keys.iter()
        .map(|key| {
            element
                .all_children()
                .into_iter()
                .find(|child| key.matches(child.namespace.as_deref(), &child.name))
                .ok_or_else(|| AggregationError::MissingKey {
                    key: key.clone(),
                    list: list.clone(),
                })
                .and_then(|child| match child.text() {
                    Some(text) => Ok(text.to_string()),
                    None if child.has_elements() => Err(AggregationError::InvalidKeyValue {
                        key: key.clone(),
                        list: list.clone(),
                    }),
                    None => Ok(String::new()),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yang_schema::SchemaContext;

    const SCHEMA: &str = r#"
modules:
  - name: test
    namespace: urn:t
    revision: 2019-02-14
    nodes:
      - kind: container
        name: top
        children:
          - { kind: leaf, name: a }
          - { kind: leaf, name: b }
          - { kind: leaf-list, name: tags }
          - kind: container
            name: inner
            children:
              - { kind: leaf, name: c }
          - kind: list
            name: entry
            keys: [id]
            children:
              - { kind: leaf, name: id }
              - { kind: leaf, name: v }
"#;

    fn schema() -> SchemaContext {
        SchemaContext::from_yaml_str(SCHEMA).unwrap()
    }

    fn payload(body: &str) -> EditPayload {
        let xml = format!(
            r#"<config xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" xmlns:nc="urn:ietf:params:xml:ns:netconf:base:1.0">{body}</config>"#
        );
        let document = netconf_xml::parse(&xml).unwrap();
        EditPayload::from_config(&document.root).unwrap()
    }

    fn top<'a>(tree: &'a AggregatedTree<'_, SchemaContext>) -> &'a AggregatedTreeNode {
        tree.root().child("top").unwrap()
    }

    #[test]
    fn test_construct_resolves_nodes() {
        let schema = schema();
        let tree = AggregatedTree::construct(
            &payload(r#"<top xmlns="urn:t"><a>1</a><entry><id>x</id><v>2</v></entry></top>"#),
            &schema,
        )
        .unwrap();

        assert_eq!(tree.payload_count(), 1);
        let top = top(&tree);
        assert_eq!(top.kind(), &AggregatedNodeKind::Container);
        assert_eq!(top.name().to_string(), "(urn:t?revision=2019-02-14)top");
        assert_eq!(top.child("a").unwrap().value(), Some("1"));

        let entry = top.entry("entry", &["x"]).unwrap();
        assert_eq!(entry.child("v").unwrap().value(), Some("2"));
    }

    #[test]
    fn test_leaf_last_write_wins() {
        let schema = schema();
        let mut tree =
            AggregatedTree::construct(&payload(r#"<top xmlns="urn:t"><a>1</a><b>1</b></top>"#), &schema)
                .unwrap();
        tree.add(&payload(r#"<top xmlns="urn:t"><a>2</a><b/></top>"#))
            .unwrap();

        let top = top(&tree);
        assert_eq!(top.child("a").unwrap().value(), Some("2"));
        // No text means no overwrite
        assert_eq!(top.child("b").unwrap().value(), Some("1"));
    }

    #[test]
    fn test_list_entries_by_key() {
        let schema = schema();
        let mut tree = AggregatedTree::construct(
            &payload(r#"<top xmlns="urn:t"><entry><id>1</id></entry></top>"#),
            &schema,
        )
        .unwrap();
        tree.add(&payload(
            r#"<top xmlns="urn:t"><entry><id>2</id></entry><entry><id>1</id><v>v</v></entry></top>"#,
        ))
        .unwrap();

        let keys: Vec<_> = top(&tree)
            .children()
            .map(|c| match c.kind() {
                AggregatedNodeKind::ListEntry { values, .. } => values.clone(),
                _ => Vec::new(),
            })
            .collect();
        assert_eq!(keys, vec![vec!["1".to_string()], vec!["2".to_string()]]);
        assert_eq!(
            top(&tree).entry("entry", &["1"]).unwrap().child("v").unwrap().value(),
            Some("v")
        );
    }

    #[test]
    fn test_split_key_text_keeps_entries_apart() {
        let schema = schema();
        let mut tree = AggregatedTree::construct(
            &payload(r#"<top xmlns="urn:t"><entry><id>a<![CDATA[1]]></id><v>x</v></entry></top>"#),
            &schema,
        )
        .unwrap();
        tree.add(&payload(
            r#"<top xmlns="urn:t"><entry><id>b<!-- note -->2</id><v>y</v></entry></top>"#,
        ))
        .unwrap();

        let top = top(&tree);
        assert_eq!(top.children().count(), 2);
        assert_eq!(top.entry("entry", &["a1"]).unwrap().child("v").unwrap().value(), Some("x"));
        assert_eq!(top.entry("entry", &["b2"]).unwrap().child("v").unwrap().value(), Some("y"));
    }

    #[test]
    fn test_split_leaf_text_overwrites() {
        let schema = schema();
        let mut tree =
            AggregatedTree::construct(&payload(r#"<top xmlns="urn:t"><a>old</a></top>"#), &schema)
                .unwrap();
        tree.add(&payload(r#"<top xmlns="urn:t"><a>ne<!-- c -->w</a></top>"#))
            .unwrap();

        assert_eq!(top(&tree).child("a").unwrap().value(), Some("new"));
    }

    #[test]
    fn test_key_with_element_content_is_rejected() {
        let schema = schema();
        let err = AggregatedTree::construct(
            &payload(r#"<top xmlns="urn:t"><entry><id>1<v/></id></entry></top>"#),
            &schema,
        )
        .err()
        .unwrap();
        assert_eq!(
            err.to_string(),
            "Key element (urn:t?revision=2019-02-14)id of node (urn:t?revision=2019-02-14)entry must hold text only"
        );
    }

    #[test]
    fn test_failed_add_leaves_tree_unchanged() {
        let schema = schema();
        let mut tree = AggregatedTree::construct(
            &payload(r#"<top xmlns="urn:t" nc:operation="create"><a>1</a></top>"#),
            &schema,
        )
        .unwrap();
        let before = tree.root().clone();

        let err = tree
            .add(&payload(r#"<top xmlns="urn:t"><a>2</a><inner nc:operation="create"/></top><top xmlns="urn:t" nc:operation="delete"/>"#))
            .unwrap_err();
        assert!(matches!(err, AggregationError::IncompatibleOperations { .. }));
        assert_eq!(tree.root(), &before);
        assert_eq!(tree.payload_count(), 1);
    }

    #[test]
    fn test_remove_drops_content_but_keeps_keys() {
        let schema = schema();
        let mut tree = AggregatedTree::construct(
            &payload(r#"<top xmlns="urn:t"><entry><id>1</id><v>x</v></entry><a>1</a></top>"#),
            &schema,
        )
        .unwrap();
        tree.add(&payload(
            r#"<top xmlns="urn:t"><entry nc:operation="remove"><id>1</id></entry><a nc:operation="remove"/></top>"#,
        ))
        .unwrap();

        let top = top(&tree);
        let entry = top.entry("entry", &["1"]).unwrap();
        assert_eq!(entry.operation(), Some(EditOperation::Remove));
        let children: Vec<_> = entry.children().map(|c| c.name().local_name.as_str()).collect();
        assert_eq!(children, vec!["id"]);

        let a = top.child("a").unwrap();
        assert_eq!(a.operation(), Some(EditOperation::Remove));
        assert_eq!(a.value(), None);
    }

    #[test]
    fn test_replace_discards_earlier_content() {
        let schema = schema();
        let mut tree = AggregatedTree::construct(
            &payload(r#"<top xmlns="urn:t"><inner><c>1</c></inner><a>1</a></top>"#),
            &schema,
        )
        .unwrap();
        tree.add(&payload(r#"<top xmlns="urn:t" nc:operation="replace"><b>2</b></top>"#))
            .unwrap();

        let top = top(&tree);
        assert_eq!(top.operation(), Some(EditOperation::Replace));
        let children: Vec<_> = top.children().map(|c| c.name().local_name.as_str()).collect();
        assert_eq!(children, vec!["b"]);
    }

    #[test]
    fn test_leaf_list_values_in_one_payload() {
        let schema = schema();
        let tree = AggregatedTree::construct(
            &payload(
                r#"<top xmlns="urn:t"><tags>x</tags><tags>y</tags><tags nc:operation="merge">x</tags></top>"#,
            ),
            &schema,
        )
        .unwrap();

        let tags = top(&tree).child("tags").unwrap();
        assert_eq!(tags.operation(), None);
        assert_eq!(
            tags.kind(),
            &AggregatedNodeKind::LeafList {
                values: vec![
                    LeafListValue {
                        value: "x".to_string(),
                        operation: Some(EditOperation::Merge),
                    },
                    LeafListValue {
                        value: "y".to_string(),
                        operation: None,
                    },
                ],
                payload: 0,
            }
        );
    }

    #[test]
    fn test_leaf_list_split_across_payloads() {
        let schema = schema();
        let mut tree =
            AggregatedTree::construct(&payload(r#"<top xmlns="urn:t"><tags>x</tags></top>"#), &schema)
                .unwrap();
        let err = tree
            .add(&payload(r#"<top xmlns="urn:t"><tags>y</tags></top>"#))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot merge leaf-lists from more than one edit-config, found multiple leaf-lists of type: (urn:t?revision=2019-02-14)tags"
        );
    }

    #[test]
    fn test_unknown_node_reports_context() {
        let schema = schema();
        let err = AggregatedTree::construct(
            &payload(r#"<top xmlns="urn:t"><inner><zzz/></inner></top>"#),
            &schema,
        )
        .err()
        .unwrap();
        match err {
            AggregationError::NodeNotFound { node, context } => {
                assert_eq!(node.to_string(), "(urn:t?revision=2019-02-14)zzz");
                assert_eq!(
                    context.to_string(),
                    "/(urn:t?revision=2019-02-14)top/(urn:t?revision=2019-02-14)inner"
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_max_depth() {
        let schema = schema();
        let options = AggregatorOptions { max_depth: 2 };
        let shallow = payload(r#"<top xmlns="urn:t"><a>1</a></top>"#);
        assert!(AggregatedTree::construct_with_options(&shallow, &schema, options.clone()).is_ok());

        let deep = payload(r#"<top xmlns="urn:t"><inner><c>1</c></inner></top>"#);
        let err = AggregatedTree::construct_with_options(&deep, &schema, options)
            .err()
            .unwrap();
        assert!(matches!(err, AggregationError::NestingTooDeep { max_depth: 2, .. }));
    }
}
