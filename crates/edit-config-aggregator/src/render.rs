//! Rendering an aggregated tree back into XML.

use crate::tree::{AggregatedNodeKind, AggregatedTreeNode};
use crate::types::{EditOperation, NETCONF_BASE_NS};
use netconf_xml::{XmlAttribute, XmlElement};
use yang_schema::QualifiedName;

/// Render the root node as a `config` element.
///
/// Operations appear as NETCONF `operation` attributes exactly on the nodes
/// that carry one. List entries lead with their keys in schema order.
pub(crate) fn render(root: &AggregatedTreeNode) -> XmlElement {
    let mut config = XmlElement::new("config", Some(NETCONF_BASE_NS));
    for child in root.children() {
        render_node(child, &mut config);
    }
    config
}

fn render_node(node: &AggregatedTreeNode, parent: &mut XmlElement) {
    match node.kind() {
        AggregatedNodeKind::LeafList { values, .. } => {
            for value in values {
                let mut element = element_for(node.name(), value.operation);
                element.set_text(value.value.as_str());
                parent.push_element(element);
            }
        }
        AggregatedNodeKind::Leaf { value } => {
            let mut element = element_for(node.name(), node.operation());
            if let Some(value) = value
                && !value.is_empty()
            {
                element.set_text(value.as_str());
            }
            parent.push_element(element);
        }
        AggregatedNodeKind::ListEntry { keys, .. } => {
            let mut element = element_for(node.name(), node.operation());
            for key in keys {
                if let Some(leaf) = node.children().find(|c| c.name() == key) {
                    render_node(leaf, &mut element);
                }
            }
            for child in node.children().filter(|c| !node.is_key_child(c.name())) {
                render_node(child, &mut element);
            }
            parent.push_element(element);
        }
        AggregatedNodeKind::Container | AggregatedNodeKind::Root => {
            let mut element = element_for(node.name(), node.operation());
            for child in node.children() {
                render_node(child, &mut element);
            }
            parent.push_element(element);
        }
    }
}

fn element_for(name: &QualifiedName, operation: Option<EditOperation>) -> XmlElement {
    let namespace = (!name.namespace.is_empty()).then_some(name.namespace.as_str());
    let element = XmlElement::new(name.local_name.as_str(), namespace);
    match operation {
        Some(operation) => element.with_attribute(XmlAttribute::new(
            "operation",
            Some(NETCONF_BASE_NS),
            operation.as_str(),
        )),
        None => element,
    }
}
