//! Qualified names and schema paths.

use std::fmt;

/// Namespace-qualified name of a YANG schema node.
///
/// Formats as `(<namespace>?revision=<revision>)<local-name>`, or
/// `(<namespace>)<local-name>` when the module has no revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub namespace: String,
    pub revision: Option<String>,
    pub local_name: String,
}

impl QualifiedName {
    pub fn new(
        namespace: impl Into<String>,
        revision: Option<&str>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            revision: revision.map(str::to_string),
            local_name: local_name.into(),
        }
    }

    /// A name in the same module as `self`.
    pub fn sibling(&self, local_name: impl Into<String>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            revision: self.revision.clone(),
            local_name: local_name.into(),
        }
    }

    /// Check whether an XML element name refers to this node.
    ///
    /// An element without a namespace matches on the local name alone.
    pub fn matches(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.local_name == local_name && namespace.is_none_or(|ns| ns == self.namespace)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            return write!(f, "{}", self.local_name);
        }
        match &self.revision {
            Some(revision) => write!(
                f,
                "({}?revision={}){}",
                self.namespace, revision, self.local_name
            ),
            None => write!(f, "({}){}", self.namespace, self.local_name),
        }
    }
}

/// Data path of a schema context, from the schema root downwards.
///
/// Choice and case nodes never appear in a path; they are transparent
/// for data-node resolution. The root path is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SchemaPath {
    steps: Vec<QualifiedName>,
}

impl SchemaPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// The path of a child of this context.
    pub fn child(&self, name: QualifiedName) -> Self {
        let mut steps = self.steps.clone();
        steps.push(name);
        Self { steps }
    }

    pub fn steps(&self) -> &[QualifiedName] {
        &self.steps
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "/");
        }
        for step in &self.steps {
            write!(f, "/{}", step)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_display() {
        let with_revision = QualifiedName::new("urn:a", Some("2019-02-14"), "top");
        assert_eq!(with_revision.to_string(), "(urn:a?revision=2019-02-14)top");

        let without_revision = QualifiedName::new("urn:a", None, "top");
        assert_eq!(without_revision.to_string(), "(urn:a)top");

        let bare = QualifiedName::new("", None, "top");
        assert_eq!(bare.to_string(), "top");
    }

    #[test]
    fn test_qualified_name_matches() {
        let name = QualifiedName::new("urn:a", None, "top");
        assert!(name.matches(Some("urn:a"), "top"));
        assert!(name.matches(None, "top"));
        assert!(!name.matches(Some("urn:b"), "top"));
        assert!(!name.matches(Some("urn:a"), "other"));
    }

    #[test]
    fn test_schema_path() {
        let root = SchemaPath::root();
        assert!(root.steps().is_empty());
        assert_eq!(root.to_string(), "/");

        let top = QualifiedName::new("urn:a", None, "top");
        let path = root.child(top.clone()).child(top.sibling("list"));
        let names: Vec<&str> = path.steps().iter().map(|n| n.local_name.as_str()).collect();
        assert_eq!(names, vec!["top", "list"]);
        assert_eq!(path.to_string(), "/(urn:a)top/(urn:a)list");
    }
}
