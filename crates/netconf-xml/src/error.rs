//! Error types for XML parsing and serialization.

use crate::types::Span;
use quick_xml::events::attributes::AttrError;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Rejected by the tokenizer.
    XmlSyntax {
        message: String,
        position: Option<u64>,
    },

    /// Input ended inside an open element.
    UnexpectedEof {
        expected: String,
        location: Option<Span>,
    },

    MismatchedEndTag {
        expected: String,
        found: String,
        location: Option<Span>,
    },

    /// Well-formed tokens in an impossible arrangement.
    InvalidStructure {
        message: String,
        location: Option<Span>,
    },

    /// A prefix was used without a matching `xmlns:` declaration in scope.
    UnboundPrefix {
        prefix: String,
        location: Option<Span>,
    },

    EmptyDocument,

    /// Content after the root element closed.
    MultipleRoots { location: Option<Span> },

    /// The serializer failed to emit an event.
    Write { message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::XmlSyntax {
                message,
                position: Some(pos),
            } => write!(f, "Malformed XML: {} (offset {})", message, pos),
            Error::XmlSyntax {
                message,
                position: None,
            } => write!(f, "Malformed XML: {}", message),
            Error::UnexpectedEof { expected, .. } => {
                write!(f, "XML input ended early, expected {}", expected)
            }
            Error::MismatchedEndTag {
                expected, found, ..
            } => {
                write!(
                    f,
                    "Closing tag </{}> does not match <{}>",
                    found, expected
                )
            }
            Error::InvalidStructure { message, .. } => {
                write!(f, "Unexpected XML structure: {}", message)
            }
            Error::UnboundPrefix { prefix, .. } => {
                write!(f, "Namespace prefix '{}' is not bound", prefix)
            }
            Error::EmptyDocument => {
                write!(f, "XML document has no root element")
            }
            Error::MultipleRoots { .. } => {
                write!(f, "XML document has more than one root element")
            }
            Error::Write { message } => {
                write!(f, "Failed to write XML: {}", message)
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Source location of the error, when one is known.
    pub fn location(&self) -> Option<Span> {
        match self {
            Error::UnexpectedEof { location, .. }
            | Error::MismatchedEndTag { location, .. }
            | Error::InvalidStructure { location, .. }
            | Error::UnboundPrefix { location, .. }
            | Error::MultipleRoots { location } => *location,
            Error::XmlSyntax { .. } | Error::EmptyDocument | Error::Write { .. } => None,
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlSyntax {
            message: err.to_string(),
            position: None,
        }
    }
}

impl From<AttrError> for Error {
    fn from(err: AttrError) -> Self {
        Error::XmlSyntax {
            message: format!("bad attribute: {}", err),
            position: None,
        }
    }
}
