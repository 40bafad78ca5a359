//! Aggregation of NETCONF edit-config payloads.
//!
//! Several independently written edit-config payloads are merged into one
//! equivalent payload, so that a datastore can apply them in a single
//! transaction. Each payload is resolved against a YANG schema and folded
//! into an [`AggregatedTree`]; the first conflicting instruction aborts the
//! whole aggregation.
//!
//! # Rules
//!
//! - Nodes are matched by qualified name, and list entries additionally by
//!   their key values.
//! - Explicit operations seen on the same node in different payloads must be
//!   compatible (see [`operation`]).
//! - An operation inside a subtree must not contradict the nearest explicit
//!   operation above it in the same payload.
//! - The values of one leaf-list must all come from one payload.
//! - Later payloads overwrite leaf values; the first payload to introduce a
//!   node fixes its position.
//!
//! # Example
//!
//! ```rust
//! use edit_config_aggregator::aggregate_edit_configs;
//! use yang_schema::SchemaContext;
//!
//! let schema = SchemaContext::from_yaml_str(r#"
//! modules:
//!   - name: example
//!     namespace: urn:example
//!     nodes:
//!       - kind: container
//!         name: system
//!         children:
//!           - { kind: leaf, name: hostname }
//!           - { kind: leaf, name: location }
//! "#).unwrap();
//!
//! let merged = aggregate_edit_configs(r#"
//! <aggregated-edit-config>
//!   <edit-config-payload>
//!     <config><system xmlns="urn:example"><hostname>a</hostname></system></config>
//!   </edit-config-payload>
//!   <edit-config-payload>
//!     <config><system xmlns="urn:example"><location>lab</location></system></config>
//!   </edit-config-payload>
//! </aggregated-edit-config>
//! "#, &schema).unwrap();
//!
//! assert_eq!(
//!     netconf_xml::to_string(&merged).unwrap(),
//!     r#"<config xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><system xmlns="urn:example"><hostname>a</hostname><location>lab</location></system></config>"#
//! );
//! ```

pub mod operation;
mod payload;
mod render;
mod tree;
mod types;

pub use payload::{EditPayload, parse_aggregated_edit_config, payloads_from_element};
pub use tree::{AggregatedNodeKind, AggregatedTree, AggregatedTreeNode, LeafListValue, NodeIdentity};
pub use types::{AggregationError, AggregatorOptions, EditOperation, NETCONF_BASE_NS, Result};

use netconf_xml::XmlElement;
use yang_schema::SchemaResolver;

/// Merge every payload of an `aggregated-edit-config` document.
///
/// Returns the merged `config` element.
pub fn aggregate_edit_configs<R: SchemaResolver + ?Sized>(
    xml: &str,
    resolver: &R,
) -> Result<XmlElement> {
    let payloads = parse_aggregated_edit_config(xml)?;
    aggregate_payloads(&payloads, resolver, AggregatorOptions::default())
}

/// Merge payloads in submission order.
pub fn aggregate_payloads<R: SchemaResolver + ?Sized>(
    payloads: &[EditPayload],
    resolver: &R,
    options: AggregatorOptions,
) -> Result<XmlElement> {
    let result = fold_payloads(payloads, resolver, options);
    match &result {
        Ok(_) => tracing::debug!(payloads = payloads.len(), "Aggregated edit-configs"),
        Err(err) => tracing::debug!(
            payloads = payloads.len(),
            error = %err,
            "Edit-config aggregation failed"
        ),
    }
    result
}

fn fold_payloads<R: SchemaResolver + ?Sized>(
    payloads: &[EditPayload],
    resolver: &R,
    options: AggregatorOptions,
) -> Result<XmlElement> {
    let Some((first, rest)) = payloads.split_first() else {
        return Err(AggregationError::MalformedRequest {
            message: "no edit-config payloads to aggregate".to_string(),
        });
    };

    let mut tree = AggregatedTree::construct_with_options(first, resolver, options)?;
    for payload in rest {
        tree.add(payload)?;
    }
    Ok(tree.to_dom())
}
