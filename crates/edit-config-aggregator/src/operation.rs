//! Edit operation rules.
//!
//! Two independent rules govern operations during aggregation:
//!
//! - **Across payloads** ([`combine`]): when a node that already carries an
//!   explicit operation is seen again with another explicit operation, the
//!   pair must be compatible. The check is order sensitive.
//! - **Within a payload** ([`allowed_inside`]): an explicit operation on a
//!   node must make sense beneath the nearest explicit operation of its
//!   ancestors in the same payload.
//!
//! | first \ new | merge | create | delete | replace | remove |
//! |-------------|-------|--------|--------|---------|--------|
//! | merge       | ok    | -      | -      | -       | ok     |
//! | create      | -     | -      | -      | -       | -      |
//! | delete      | -     | -      | -      | -       | -      |
//! | replace     | -     | -      | -      | ok      | ok     |
//! | remove      | ok    | -      | -      | -       | ok     |

use crate::types::{AggregationError, EditOperation, NETCONF_BASE_NS, Result};
use netconf_xml::XmlElement;
use yang_schema::QualifiedName;

/// Outcome of folding a newly seen operation into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combined {
    /// The operation the node carries afterwards.
    pub operation: Option<EditOperation>,
    /// Whether content contributed by earlier payloads must be discarded
    /// before the new content is folded in.
    pub discard_existing: bool,
}

/// Read the NETCONF `operation` attribute of an element.
pub fn parse_operation(element: &XmlElement, node: &QualifiedName) -> Result<Option<EditOperation>> {
    match element.get_attribute_ns(NETCONF_BASE_NS, "operation") {
        None => Ok(None),
        Some(value) => EditOperation::parse(value)
            .map(Some)
            .ok_or_else(|| AggregationError::InvalidOperation {
                value: value.to_string(),
                node: node.clone(),
            }),
    }
}

/// Combine the operation already recorded on a node with a newly seen one.
///
/// Returns `Err((first, second))` when the pair is incompatible.
pub fn combine(
    existing: Option<EditOperation>,
    incoming: Option<EditOperation>,
) -> std::result::Result<Combined, (EditOperation, EditOperation)> {
    use EditOperation::*;

    let Some(incoming) = incoming else {
        return Ok(Combined {
            operation: existing,
            discard_existing: false,
        });
    };
    let Some(existing) = existing else {
        return Ok(Combined {
            operation: Some(incoming),
            discard_existing: incoming == Replace,
        });
    };

    match (existing, incoming) {
        (Merge, Merge) | (Remove, Remove) | (Merge, Remove) | (Replace, Remove) | (Remove, Merge) => {
            Ok(Combined {
                operation: Some(incoming),
                discard_existing: false,
            })
        }
        (Replace, Replace) => Ok(Combined {
            operation: Some(Replace),
            discard_existing: true,
        }),
        (first, second) => Err((first, second)),
    }
}

/// Check that `operation` may appear beneath an ancestor carrying `parent`.
pub fn allowed_inside(parent: EditOperation, operation: EditOperation) -> bool {
    use EditOperation::*;

    match parent {
        Merge => true,
        Replace => operation != Merge,
        Create => matches!(operation, Create | Merge),
        Delete | Remove => operation.is_deletion(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netconf_xml::XmlAttribute;
    use EditOperation::*;

    const ALL: [EditOperation; 5] = [Merge, Create, Delete, Replace, Remove];

    fn node() -> QualifiedName {
        QualifiedName::new("urn:a", None, "top")
    }

    #[test]
    fn test_parse_operation() {
        let plain = XmlElement::new("top", Some("urn:a"));
        assert_eq!(parse_operation(&plain, &node()).unwrap(), None);

        let with_op = XmlElement::new("top", Some("urn:a"))
            .with_attribute(XmlAttribute::new("operation", Some(NETCONF_BASE_NS), "replace"));
        assert_eq!(parse_operation(&with_op, &node()).unwrap(), Some(Replace));

        // Only the NETCONF namespace counts
        let foreign = XmlElement::new("top", Some("urn:a"))
            .with_attribute(XmlAttribute::new("operation", None, "replace"));
        assert_eq!(parse_operation(&foreign, &node()).unwrap(), None);

        let invalid = XmlElement::new("top", Some("urn:a"))
            .with_attribute(XmlAttribute::new("operation", Some(NETCONF_BASE_NS), "upsert"));
        let err = parse_operation(&invalid, &node()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid operation attribute value 'upsert' on node : (urn:a)top"
        );
    }

    #[test]
    fn test_combine_without_prior_operation() {
        for op in ALL {
            let combined = combine(None, Some(op)).unwrap();
            assert_eq!(combined.operation, Some(op));
            assert_eq!(combined.discard_existing, op == Replace);
        }
        assert_eq!(
            combine(Some(Create), None).unwrap(),
            Combined {
                operation: Some(Create),
                discard_existing: false
            }
        );
    }

    #[test]
    fn test_combine_table() {
        let accepted = [
            (Merge, Merge),
            (Merge, Remove),
            (Replace, Replace),
            (Replace, Remove),
            (Remove, Remove),
            (Remove, Merge),
        ];
        for first in ALL {
            for second in ALL {
                let result = combine(Some(first), Some(second));
                if accepted.contains(&(first, second)) {
                    assert_eq!(result.unwrap().operation, Some(second));
                } else {
                    assert_eq!(result, Err((first, second)), "{first} then {second}");
                }
            }
        }
    }

    #[test]
    fn test_second_replace_discards() {
        assert!(combine(Some(Replace), Some(Replace)).unwrap().discard_existing);
        assert!(!combine(Some(Merge), Some(Remove)).unwrap().discard_existing);
    }

    #[test]
    fn test_allowed_inside() {
        assert!(ALL.iter().all(|op| allowed_inside(Merge, *op)));

        assert!(!allowed_inside(Replace, Merge));
        assert!(allowed_inside(Replace, Replace));
        assert!(allowed_inside(Replace, Remove));

        assert!(allowed_inside(Create, Merge));
        assert!(!allowed_inside(Create, Delete));
        assert!(!allowed_inside(Create, Replace));

        assert!(allowed_inside(Remove, Delete));
        assert!(!allowed_inside(Delete, Merge));
        assert!(!allowed_inside(Remove, Create));
    }
}
