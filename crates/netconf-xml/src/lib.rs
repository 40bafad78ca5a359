//! Namespace-aware XML element trees for NETCONF payloads.
//!
//! This crate wraps [`quick-xml`] to provide an owned tree of [`XmlElement`]s
//! in which every element and attribute carries its resolved namespace URI.
//! It is the document layer used by the edit-config aggregator: payloads are
//! parsed into element trees, and the aggregated result is built as an element
//! tree and serialized back to text.
//!
//! # Overview
//!
//! [`parse`] returns an [`XmlDocument`] holding one root [`XmlElement`].
//! Elements and [`XmlAttribute`]s keep their local name, the prefix seen in
//! the source and the namespace that prefix resolved to. Element content is
//! an [`XmlChildren`]; whitespace between elements is dropped.
//!
//! # Example
//!
//! ```rust
//! use netconf_xml::parse;
//!
//! let xml = parse(r#"<config xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
//!   <interfaces xmlns="urn:example:if">
//!     <name>eth0</name>
//!   </interfaces>
//! </config>"#).unwrap();
//!
//! assert_eq!(xml.root.name, "config");
//! let interfaces = xml.root.all_children();
//! assert_eq!(interfaces[0].namespace.as_deref(), Some("urn:example:if"));
//! assert_eq!(interfaces[0].child(None, "name").unwrap().text(), Some("eth0"));
//! ```
//!
//! # Serialization
//!
//! [`to_string`] and [`to_pretty_string`] write an element tree back out. The
//! writer never reuses the prefixes of the source document: element namespaces
//! are expressed through default-namespace declarations, and namespaced
//! attributes get generated `ns0`, `ns1`, ... prefixes.
//!
//! ```rust
//! use netconf_xml::{XmlAttribute, XmlElement, to_string};
//!
//! let mut leaf = XmlElement::new("enabled", Some("urn:example:if"));
//! leaf.set_text("true");
//! let mut top = XmlElement::new("interfaces", Some("urn:example:if"));
//! top.push_element(leaf);
//! let top = top.with_attribute(XmlAttribute::new(
//!     "operation",
//!     Some("urn:ietf:params:xml:ns:netconf:base:1.0"),
//!     "merge",
//! ));
//!
//! assert_eq!(
//!     to_string(&top).unwrap(),
//!     r#"<interfaces xmlns="urn:example:if" xmlns:ns0="urn:ietf:params:xml:ns:netconf:base:1.0" ns0:operation="merge"><enabled>true</enabled></interfaces>"#
//! );
//! ```

pub mod error;
pub mod parser;
pub mod types;
pub mod writer;

pub use error::{Error, Result};
pub use parser::parse;
pub use types::{Span, XmlAttribute, XmlChild, XmlChildren, XmlDocument, XmlElement};
pub use writer::{to_pretty_string, to_string};
