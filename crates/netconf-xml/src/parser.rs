//! XML parser that builds namespace-resolved element trees.

use crate::{Error, Result, Span, XmlAttribute, XmlChild, XmlChildren, XmlDocument, XmlElement};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

/// Parse XML from a string, producing an [`XmlDocument`].
///
/// Namespace prefixes are resolved against the `xmlns` declarations in
/// scope; declarations themselves are not kept as attributes. Comments,
/// processing instructions and the XML declaration are skipped, and
/// whitespace-only text is dropped.
///
/// # Example
///
/// ```rust
/// use netconf_xml::parse;
///
/// let xml = parse(r#"<nc:config xmlns:nc="urn:ietf:params:xml:ns:netconf:base:1.0"/>"#).unwrap();
/// assert_eq!(xml.root.name, "config");
/// assert_eq!(xml.root.prefix.as_deref(), Some("nc"));
/// assert_eq!(
///     xml.root.namespace.as_deref(),
///     Some("urn:ietf:params:xml:ns:netconf:base:1.0")
/// );
/// ```
///
/// # Errors
///
/// Returns an error if the XML is malformed or uses an unbound prefix.
pub fn parse(content: &str) -> Result<XmlDocument> {
    let mut parser = XmlParser::new(content);
    parser.parse()
}

struct XmlParser<'a> {
    source: &'a str,
    reader: NsReader<&'a [u8]>,

    /// Open elements, innermost last.
    stack: Vec<BuildNode>,
}

/// An element whose end tag has not been seen yet.
struct BuildNode {
    name: String,
    prefix: Option<String>,
    namespace: Option<String>,
    attributes: Vec<XmlAttribute>,

    /// Offset of the opening `<`.
    start_offset: usize,

    /// Content read so far, in document order.
    children: Vec<XmlChild>,
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str) -> Self {
        let mut reader = NsReader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            source,
            reader,
            stack: Vec::new(),
        }
    }

    fn parse(&mut self) -> Result<XmlDocument> {
        let mut root: Option<XmlElement> = None;

        loop {
            // Offset of the `<` that opens the next event
            let event_start = self.reader.buffer_position() as usize;

            // The resolved namespace borrows the reader, so own it right away
            let read = self
                .reader
                .read_resolved_event()
                .map(|(resolved, event)| (owned_namespace(resolved, event_start), event));
            let (namespace, event) = match read {
                Ok(pair) => pair,
                Err(e) => {
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        position: Some(self.reader.buffer_position() as u64),
                    });
                }
            };

            match event {
                Event::Start(e) => {
                    self.handle_start(e, namespace?, event_start)?;
                }
                Event::End(e) => {
                    let element = self.handle_end(e)?;
                    self.attach(element, &mut root)?;
                }
                Event::Empty(e) => {
                    let element = self.handle_empty(e, namespace?, event_start)?;
                    self.attach(element, &mut root)?;
                }
                Event::Text(e) => {
                    self.handle_text(e, event_start)?;
                }
                Event::CData(e) => {
                    self.handle_cdata(e);
                }
                Event::Eof => break,
                // Comments, processing instructions, declarations, DOCTYPE
                _ => {}
            }
        }

        if let Some(node) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", node.name),
                location: Some(Span::new(node.start_offset, self.source.len())),
            });
        }

        let root = root.ok_or(Error::EmptyDocument)?;
        Ok(XmlDocument::new(root, Span::new(0, self.source.len())))
    }

    /// Hand a completed element to its parent, or make it the document root.
    fn attach(&mut self, element: XmlElement, root: &mut Option<XmlElement>) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(XmlChild::Element(element));
                Ok(())
            }
            None if root.is_some() => Err(Error::MultipleRoots {
                location: Some(element.span),
            }),
            None => {
                *root = Some(element);
                Ok(())
            }
        }
    }

    fn handle_start(
        &mut self,
        e: BytesStart<'_>,
        namespace: Option<String>,
        event_start: usize,
    ) -> Result<()> {
        let (name, prefix) = split_name(e.name().as_ref());
        let attributes = self.parse_attributes(&e, event_start)?;

        self.stack.push(BuildNode {
            name,
            prefix,
            namespace,
            attributes,
            start_offset: event_start,
            children: Vec::new(),
        });

        Ok(())
    }

    fn handle_end(&mut self, e: BytesEnd<'_>) -> Result<XmlElement> {
        let (end_local_name, _) = split_name(e.name().as_ref());

        let node = self.stack.pop().ok_or_else(|| Error::InvalidStructure {
            message: format!("Unexpected closing tag </{}>", end_local_name),
            location: None,
        })?;

        let end_offset = self.reader.buffer_position() as usize;
        let span = Span::new(node.start_offset, end_offset);

        if node.name != end_local_name {
            return Err(Error::MismatchedEndTag {
                expected: node.name,
                found: end_local_name,
                location: Some(span),
            });
        }

        Ok(XmlElement {
            name: node.name,
            prefix: node.prefix,
            namespace: node.namespace,
            attributes: node.attributes,
            children: finalize_children(node.children),
            span,
        })
    }

    fn handle_empty(
        &mut self,
        e: BytesStart<'_>,
        namespace: Option<String>,
        event_start: usize,
    ) -> Result<XmlElement> {
        let (name, prefix) = split_name(e.name().as_ref());
        let attributes = self.parse_attributes(&e, event_start)?;
        let end_offset = self.reader.buffer_position() as usize;

        Ok(XmlElement {
            name,
            prefix,
            namespace,
            attributes,
            children: XmlChildren::Empty,
            span: Span::new(event_start, end_offset),
        })
    }

    fn handle_text(&mut self, e: BytesText<'_>, event_start: usize) -> Result<()> {
        let text = e.unescape().map_err(|err| Error::XmlSyntax {
            message: format!("bad text: {}", err),
            position: Some(event_start as u64),
        })?;

        if let Some(node) = self.stack.last_mut() {
            node.children.push(XmlChild::Text(text.into_owned()));
        }
        Ok(())
    }

    fn handle_cdata(&mut self, e: BytesCData<'_>) {
        let text = String::from_utf8_lossy(e.as_ref()).to_string();
        if let Some(node) = self.stack.last_mut() {
            node.children.push(XmlChild::Text(text));
        }
    }

    fn parse_attributes(&self, e: &BytesStart<'_>, tag_start: usize) -> Result<Vec<XmlAttribute>> {
        let mut attributes = Vec::new();

        for attr_result in e.attributes() {
            let attr = attr_result?;

            // xmlns and xmlns:prefix are declarations, not data
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }

            let (resolved, _) = self.reader.resolve_attribute(attr.key);
            let namespace = owned_namespace(resolved, tag_start)?;
            let (name, prefix) = split_name(attr.key.as_ref());

            let value = attr.unescape_value().map_err(|err| Error::XmlSyntax {
                message: format!("bad attribute value: {}", err),
                position: Some(tag_start as u64),
            })?;

            attributes.push(XmlAttribute {
                name,
                prefix,
                namespace,
                value: value.into_owned(),
            });
        }

        Ok(attributes)
    }
}

/// Split a raw `prefix:local` name into its local part and optional prefix.
fn split_name(raw: &[u8]) -> (String, Option<String>) {
    let full_name = String::from_utf8_lossy(raw);
    match full_name.split_once(':') {
        Some((prefix, local)) => (local.to_string(), Some(prefix.to_string())),
        None => (full_name.into_owned(), None),
    }
}

fn owned_namespace(resolved: ResolveResult<'_>, offset: usize) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(Error::UnboundPrefix {
            prefix: String::from_utf8_lossy(&prefix).into_owned(),
            location: Some(Span::new(offset, offset)),
        }),
    }
}

/// Collapse accumulated children into the tightest `XmlChildren` form.
///
/// Adjacent text pieces (split by comments or CDATA sections) are joined
/// first. Whitespace-only text is indentation and is dropped, both between
/// child elements and as the sole content of an element.
fn finalize_children(children: Vec<XmlChild>) -> XmlChildren {
    let mut joined: Vec<XmlChild> = Vec::with_capacity(children.len());
    for child in children {
        if let XmlChild::Text(text) = &child
            && let Some(XmlChild::Text(run)) = joined.last_mut()
        {
            run.push_str(text);
            continue;
        }
        joined.push(child);
    }

    let mut children: Vec<XmlChild> = joined
        .into_iter()
        .filter(|c| !matches!(c, XmlChild::Text(t) if t.trim().is_empty()))
        .collect();

    if children.is_empty() {
        return XmlChildren::Empty;
    }

    let all_elements = children.iter().all(|c| matches!(c, XmlChild::Element(_)));

    if all_elements {
        let elements = children
            .into_iter()
            .filter_map(|c| match c {
                XmlChild::Element(e) => Some(e),
                XmlChild::Text(_) => None,
            })
            .collect();
        XmlChildren::Elements(elements)
    } else if children.len() == 1 {
        match children.pop() {
            Some(XmlChild::Text(content)) => XmlChildren::Text(content),
            Some(element) => XmlChildren::Mixed(vec![element]),
            None => XmlChildren::Empty,
        }
    } else {
        XmlChildren::Mixed(children)
    }
}
