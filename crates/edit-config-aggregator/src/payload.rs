//! Edit payloads and the aggregated request wrapper.
//!
//! An aggregated request batches independent edit-config submissions:
//!
//! ```xml
//! <aggregated-edit-config>
//!   <edit-config-payload>
//!     <config> ... </config>
//!   </edit-config-payload>
//!   <edit-config-payload>
//!     <config> ... </config>
//!   </edit-config-payload>
//! </aggregated-edit-config>
//! ```
//!
//! The wrapper is a local convention rather than a NETCONF operation, so its
//! elements are matched by local name in any namespace.

use crate::types::{AggregationError, Result};
use netconf_xml::XmlElement;

const WRAPPER: &str = "aggregated-edit-config";
const PAYLOAD: &str = "edit-config-payload";
const CONFIG: &str = "config";

/// The configuration roots of one edit-config submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditPayload {
    roots: Vec<XmlElement>,
}

impl EditPayload {
    pub fn new(roots: Vec<XmlElement>) -> Self {
        Self { roots }
    }

    /// Build a payload from a `config` element; its children are the roots.
    pub fn from_config(config: &XmlElement) -> Result<Self> {
        if config.name != CONFIG {
            return Err(AggregationError::MalformedRequest {
                message: format!("expected <{}>, found <{}>", CONFIG, config.name),
            });
        }
        Ok(Self::new(config.all_children().into_iter().cloned().collect()))
    }

    /// Root configuration elements, in document order.
    pub fn roots(&self) -> &[XmlElement] {
        &self.roots
    }
}

/// Parse an `aggregated-edit-config` document into its payloads.
pub fn parse_aggregated_edit_config(xml: &str) -> Result<Vec<EditPayload>> {
    let document = netconf_xml::parse(xml)?;
    payloads_from_element(&document.root)
}

/// Extract the payloads of an already parsed `aggregated-edit-config` element.
pub fn payloads_from_element(wrapper: &XmlElement) -> Result<Vec<EditPayload>> {
    if wrapper.name != WRAPPER {
        return Err(AggregationError::MalformedRequest {
            message: format!("expected <{}>, found <{}>", WRAPPER, wrapper.name),
        });
    }

    let mut payloads = Vec::new();
    for (index, element) in wrapper.all_children().into_iter().enumerate() {
        if element.name != PAYLOAD {
            return Err(AggregationError::MalformedRequest {
                message: format!(
                    "unexpected <{}> at position {} of <{}>",
                    element.name, index, WRAPPER
                ),
            });
        }
        let config = element.child(None, CONFIG).ok_or_else(|| {
            AggregationError::MalformedRequest {
                message: format!("<{}> at position {} has no <{}>", PAYLOAD, index, CONFIG),
            }
        })?;
        payloads.push(EditPayload::from_config(config)?);
    }

    if payloads.is_empty() {
        return Err(AggregationError::MalformedRequest {
            message: format!("<{}> contains no <{}>", WRAPPER, PAYLOAD),
        });
    }

    Ok(payloads)
}
