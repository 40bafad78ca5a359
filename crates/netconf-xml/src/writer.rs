//! Serialization of element trees back to XML text.
//!
//! Prefixes from the source document are not reused. Every element is
//! written unprefixed, with an `xmlns` declaration wherever its namespace
//! differs from the inherited default. Namespaced attributes get generated
//! prefixes (`ns0`, `ns1`, ...) declared on the first element that needs them.

use crate::{Error, Result, XmlChild, XmlChildren, XmlElement};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::fmt;

/// Serialize an element tree without any added whitespace.
pub fn to_string(element: &XmlElement) -> Result<String> {
    write_document(Writer::new(Vec::new()), element)
}

/// Serialize an element tree with two-space indentation.
pub fn to_pretty_string(element: &XmlElement) -> Result<String> {
    write_document(Writer::new_with_indent(Vec::new(), b' ', 2), element)
}

fn write_document(mut writer: Writer<Vec<u8>>, element: &XmlElement) -> Result<String> {
    write_element(&mut writer, element, &NamespaceScope::default())?;
    String::from_utf8(writer.into_inner()).map_err(write_error)
}

/// Namespace bindings visible at a point in the output.
#[derive(Debug, Clone, Default)]
struct NamespaceScope {
    default_namespace: Option<String>,
    /// (namespace URI, prefix) pairs declared by ancestors.
    prefixes: Vec<(String, String)>,
    next_prefix: usize,
}

impl NamespaceScope {
    fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .rev()
            .find(|(ns, _)| ns == namespace)
            .map(|(_, prefix)| prefix.as_str())
    }

    /// Bind a fresh prefix to `namespace`, returning it.
    fn declare(&mut self, namespace: &str) -> String {
        let prefix = format!("ns{}", self.next_prefix);
        self.next_prefix += 1;
        self.prefixes.push((namespace.to_string(), prefix.clone()));
        prefix
    }
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &XmlElement,
    parent_scope: &NamespaceScope,
) -> Result<()> {
    let mut scope = parent_scope.clone();
    let mut start = BytesStart::new(element.name.as_str());

    if element.namespace != scope.default_namespace {
        start.push_attribute(("xmlns", element.namespace.as_deref().unwrap_or("")));
        scope.default_namespace = element.namespace.clone();
    }

    // Declarations must precede the attributes that use them
    let mut qualified_attributes = Vec::with_capacity(element.attributes.len());
    for attribute in &element.attributes {
        let key = match attribute.namespace.as_deref() {
            Some(namespace) => {
                let prefix = match scope.prefix_for(namespace) {
                    Some(prefix) => prefix.to_string(),
                    None => {
                        let prefix = scope.declare(namespace);
                        start.push_attribute((format!("xmlns:{}", prefix).as_str(), namespace));
                        prefix
                    }
                };
                format!("{}:{}", prefix, attribute.name)
            }
            None => attribute.name.clone(),
        };
        qualified_attributes.push((key, attribute.value.as_str()));
    }
    for (key, value) in &qualified_attributes {
        start.push_attribute((key.as_str(), *value));
    }

    match &element.children {
        XmlChildren::Empty => {
            writer.write_event(Event::Empty(start)).map_err(write_error)?;
        }
        XmlChildren::Text(text) => {
            writer.write_event(Event::Start(start)).map_err(write_error)?;
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
            write_end(writer, element)?;
        }
        XmlChildren::Elements(children) => {
            writer.write_event(Event::Start(start)).map_err(write_error)?;
            for child in children {
                write_element(writer, child, &scope)?;
            }
            write_end(writer, element)?;
        }
        XmlChildren::Mixed(children) => {
            writer.write_event(Event::Start(start)).map_err(write_error)?;
            for child in children {
                match child {
                    XmlChild::Element(child) => write_element(writer, child, &scope)?,
                    XmlChild::Text(text) => writer
                        .write_event(Event::Text(BytesText::new(text)))
                        .map_err(write_error)?,
                }
            }
            write_end(writer, element)?;
        }
    }

    Ok(())
}

fn write_end(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_error)
}

fn write_error(err: impl fmt::Display) -> Error {
    Error::Write {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{XmlAttribute, parse};

    const NC: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

    fn leaf(name: &str, namespace: &str, text: &str) -> XmlElement {
        let mut element = XmlElement::new(name, Some(namespace));
        element.set_text(text);
        element
    }

    #[test]
    fn test_write_default_namespaces() {
        let mut config = XmlElement::new("config", Some(NC));
        let mut top = XmlElement::new("top", Some("urn:a"));
        top.push_element(leaf("name", "urn:a", "x<y"));
        top.push_element(XmlElement::new("flag", Some("urn:b")));
        config.push_element(top);

        insta::assert_snapshot!(
            to_string(&config).unwrap(),
            @r#"<config xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><top xmlns="urn:a"><name>x&lt;y</name><flag xmlns="urn:b"/></top></config>"#
        );
    }

    #[test]
    fn test_operation_prefix_declared_once_per_scope() {
        let mut top = XmlElement::new("top", Some("urn:a"))
            .with_attribute(XmlAttribute::new("operation", Some(NC), "merge"));
        top.push_element(
            XmlElement::new("inner", Some("urn:a"))
                .with_attribute(XmlAttribute::new("operation", Some(NC), "remove")),
        );

        insta::assert_snapshot!(
            to_string(&top).unwrap(),
            @r#"<top xmlns="urn:a" xmlns:ns0="urn:ietf:params:xml:ns:netconf:base:1.0" ns0:operation="merge"><inner ns0:operation="remove"/></top>"#
        );
    }

    #[test]
    fn test_no_namespace_under_default_resets() {
        let mut top = XmlElement::new("top", Some("urn:a"));
        top.push_element(XmlElement::new("bare", None));

        assert_eq!(
            to_string(&top).unwrap(),
            r#"<top xmlns="urn:a"><bare xmlns=""/></top>"#
        );
    }

    #[test]
    fn test_reparse_preserves_structure() {
        let source = r#"<nc:config xmlns:nc="urn:ietf:params:xml:ns:netconf:base:1.0">
  <t:top xmlns:t="urn:a" nc:operation="replace">
    <t:name>value</t:name>
  </t:top>
</nc:config>"#;
        let first = parse(source).unwrap().root;
        let written = to_string(&first).unwrap();
        let second = parse(&written).unwrap().root;

        assert_eq!(to_string(&second).unwrap(), written);
        let top = second.child(Some("urn:a"), "top").unwrap();
        assert_eq!(top.get_attribute_ns(NC, "operation"), Some("replace"));
        assert_eq!(top.child(Some("urn:a"), "name").unwrap().text(), Some("value"));
    }

    #[test]
    fn test_pretty_output_is_indented() {
        let mut top = XmlElement::new("top", Some("urn:a"));
        top.push_element(XmlElement::new("a", Some("urn:a")));
        let pretty = to_pretty_string(&top).unwrap();

        assert!(pretty.contains("\n  <a/>"), "got {pretty}");
        assert_eq!(
            to_string(&parse(&pretty).unwrap().root).unwrap(),
            to_string(&top).unwrap()
        );
    }
}
