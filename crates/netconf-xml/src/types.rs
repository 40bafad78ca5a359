//! Core types for namespace-aware XML trees.

/// Byte range of a node in the source text.
///
/// Elements built programmatically carry the default (empty) span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    /// Offset of the first byte (the `<` of the start tag).
    pub start: usize,
    /// Offset one past the last byte.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A parsed XML document.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub root: XmlElement,

    /// From the first byte of the root start tag to the end of input.
    pub span: Span,
}

/// An XML element with its resolved namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Local name, prefix stripped.
    pub name: String,

    /// Namespace prefix used in the source, if any.
    ///
    /// Informational only; the writer does not reuse it.
    pub prefix: Option<String>,

    /// Resolved namespace URI, `None` when the element is in no namespace.
    pub namespace: Option<String>,

    /// Attributes of this element, excluding namespace declarations.
    pub attributes: Vec<XmlAttribute>,

    pub children: XmlChildren,

    /// Location in the source, from `<` to the end of the closing tag.
    pub span: Span,
}

/// An XML attribute with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Local name, prefix stripped.
    pub name: String,

    /// Namespace prefix used in the source, if any.
    pub prefix: Option<String>,

    /// Resolved namespace URI. Unprefixed attributes are in no namespace.
    pub namespace: Option<String>,

    /// Unescaped value.
    pub value: String,
}

/// Content of an element.
///
/// NETCONF payloads are almost always element-only or text-only; mixed
/// content is preserved but never produced by the aggregator.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum XmlChildren {
    Elements(Vec<XmlElement>),

    /// Unescaped text and nothing else.
    Text(String),

    /// Text interleaved with elements.
    Mixed(Vec<XmlChild>),

    #[default]
    Empty,
}

/// One item of mixed content.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlChild {
    Element(XmlElement),

    Text(String),
}

impl XmlDocument {
    pub fn new(root: XmlElement, span: Span) -> Self {
        Self { root, span }
    }
}

impl XmlElement {
    /// An element with no attributes or content.
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            children: XmlChildren::Empty,
            span: Span::default(),
        }
    }

    /// Add an attribute, returning the element.
    pub fn with_attribute(mut self, attribute: XmlAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Append a child element.
    ///
    /// Text content, if any, is turned into mixed content.
    pub fn push_element(&mut self, child: XmlElement) {
        match &mut self.children {
            XmlChildren::Elements(elements) => elements.push(child),
            XmlChildren::Empty => self.children = XmlChildren::Elements(vec![child]),
            XmlChildren::Text(text) => {
                let text = std::mem::take(text);
                self.children =
                    XmlChildren::Mixed(vec![XmlChild::Text(text), XmlChild::Element(child)]);
            }
            XmlChildren::Mixed(children) => children.push(XmlChild::Element(child)),
        }
    }

    /// Replace the content of this element with text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = XmlChildren::Text(text.into());
    }

    /// Attribute value by namespace and local name.
    pub fn get_attribute_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == Some(namespace))
            .map(|a| a.value.as_str())
    }

    pub fn has_elements(&self) -> bool {
        match &self.children {
            XmlChildren::Elements(e) => !e.is_empty(),
            XmlChildren::Mixed(c) => c.iter().any(|c| matches!(c, XmlChild::Element(_))),
            _ => false,
        }
    }

    /// The text of a text-only element.
    pub fn text(&self) -> Option<&str> {
        match &self.children {
            XmlChildren::Text(content) => Some(content),
            _ => None,
        }
    }

    /// Find the first child element with the given namespace and local name.
    ///
    /// A `None` namespace matches children in any namespace.
    pub fn child(&self, namespace: Option<&str>, name: &str) -> Option<&XmlElement> {
        self.all_children().into_iter().find(|e| {
            e.name == name && (namespace.is_none() || e.namespace.as_deref() == namespace)
        })
    }

    /// Child elements in document order; text in mixed content is skipped.
    pub fn all_children(&self) -> Vec<&XmlElement> {
        match &self.children {
            XmlChildren::Elements(elements) => elements.iter().collect(),
            XmlChildren::Mixed(children) => children
                .iter()
                .filter_map(|c| match c {
                    XmlChild::Element(e) => Some(e),
                    XmlChild::Text(_) => None,
                })
                .collect(),
            _ => vec![],
        }
    }
}

impl XmlAttribute {
    pub fn new(name: impl Into<String>, namespace: Option<&str>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            namespace: namespace.map(str::to_string),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup() {
        let element = XmlElement::new("test", None)
            .with_attribute(XmlAttribute::new("name", None, "value"))
            .with_attribute(XmlAttribute::new("operation", Some("urn:nc"), "merge"));

        assert!(element.get_attribute_ns("urn:nc", "name").is_none());
        assert_eq!(element.get_attribute_ns("urn:nc", "operation"), Some("merge"));
        assert_eq!(element.get_attribute_ns("urn:other", "operation"), None);
    }

    #[test]
    fn test_child_lookup_by_namespace() {
        let mut parent = XmlElement::new("parent", Some("urn:a"));
        parent.push_element(XmlElement::new("child", Some("urn:a")));
        parent.push_element(XmlElement::new("child", Some("urn:b")));

        assert!(parent.text().is_none() && parent.has_elements());
        assert_eq!(parent.all_children().len(), 2);
        assert_eq!(
            parent.child(Some("urn:b"), "child").unwrap().namespace.as_deref(),
            Some("urn:b")
        );
        assert!(parent.child(Some("urn:c"), "child").is_none());
    }

    #[test]
    fn test_text_content() {
        let mut element = XmlElement::new("text", None);
        assert_eq!(element.children, XmlChildren::Empty);
        element.set_text("eth0");

        assert!(!element.has_elements());
        assert_eq!(element.text(), Some("eth0"));
    }

    #[test]
    fn test_push_element_onto_text_becomes_mixed() {
        let mut element = XmlElement::new("p", None);
        element.set_text("lead");
        element.push_element(XmlElement::new("b", None));

        assert!(matches!(element.children, XmlChildren::Mixed(ref c) if c.len() == 2));
        assert_eq!(element.all_children().len(), 1);
        assert_eq!(element.text(), None);
    }
}
