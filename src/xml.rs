//! Small helpers over the `roxmltree` parse tree.
//!
//! The generic tree parser is an external collaborator; these wrappers only
//! add typed attribute access with schema-flavored error messages.

use std::str::FromStr;

use roxmltree::Node;

use crate::error::MapError;

/// First child element with the given tag name.
pub(crate) fn child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

/// All child elements with the given tag name, in document order.
pub(crate) fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == tag)
}

pub(crate) fn required_attr<'a>(node: Node<'a, '_>, attr: &str) -> Result<&'a str, MapError> {
    node.attribute(attr).ok_or_else(|| MapError::Schema {
        element: node.tag_name().name().to_string(),
        message: format!("missing required attribute '{attr}'"),
    })
}

pub(crate) fn parse_attr<T: FromStr>(node: Node<'_, '_>, attr: &str) -> Result<T, MapError> {
    let raw = required_attr(node, attr)?;
    raw.trim().parse::<T>().map_err(|_| MapError::Schema {
        element: node.tag_name().name().to_string(),
        message: format!(
            "invalid '{attr}' value '{raw}'; expected {}",
            std::any::type_name::<T>()
        ),
    })
}

/// Parse an optional attribute, falling back to a default when absent.
pub(crate) fn parse_attr_or<T: FromStr>(
    node: Node<'_, '_>,
    attr: &str,
    default: T,
) -> Result<T, MapError> {
    match node.attribute(attr) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| MapError::Schema {
            element: node.tag_name().name().to_string(),
            message: format!(
                "invalid '{attr}' value '{raw}'; expected {}",
                std::any::type_name::<T>()
            ),
        }),
    }
}

/// Accepts the spellings Tiled has used for booleans over the years.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "t" => Some(true),
        "0" | "false" | "no" | "n" | "f" | "" => Some(false),
        _ => None,
    }
}

/// Parse an optional boolean attribute such as `visible`.
pub(crate) fn bool_attr_or(node: Node<'_, '_>, attr: &str, default: bool) -> Result<bool, MapError> {
    match node.attribute(attr) {
        None => Ok(default),
        Some(raw) => parse_bool(raw).ok_or_else(|| MapError::Schema {
            element: node.tag_name().name().to_string(),
            message: format!("invalid '{attr}' value '{raw}'; expected a boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_spellings() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn missing_required_attr_names_the_element() {
        let doc = roxmltree::Document::parse("<tileset/>").expect("parse");
        let err = required_attr(doc.root_element(), "firstgid").unwrap_err();
        match err {
            MapError::Schema { element, message } => {
                assert_eq!(element, "tileset");
                assert!(message.contains("firstgid"));
            }
            other => panic!("expected Schema, got {other:?}"),
        }
    }
}
