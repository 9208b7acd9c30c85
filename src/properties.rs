//! User properties and the reserved-name policy.
//!
//! Every schema object kind carries a fixed set of attribute names that a
//! user property may not shadow. The sets are distinct per kind and mirror
//! the TMX schema; shadowing is fatal unless duplicate names are explicitly
//! allowed in [`LoadOptions`](crate::LoadOptions).

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use roxmltree::Node;
use tracing::warn;

use crate::error::MapError;
use crate::xml::{child_elements, parse_bool, required_attr};

/// A typed user property value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Color(String),
    File(PathBuf),
}

impl PropertyValue {
    /// String contents, for `String`, `Color`, and `File` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) | PropertyValue::Color(s) => Some(s),
            PropertyValue::File(p) => p.to_str(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// An ordered name → value mapping of user properties.
pub type PropertyBag = IndexMap<String, PropertyValue>;

/// The schema object kinds that may carry user properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Map,
    Tileset,
    Tile,
    Layer,
    ObjectGroup,
    Object,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Map => "map",
            ElementKind::Tileset => "tileset",
            ElementKind::Tile => "tile",
            ElementKind::Layer => "layer",
            ElementKind::ObjectGroup => "objectgroup",
            ElementKind::Object => "object",
        }
    }

    /// Attribute names of this kind that user properties may not shadow.
    fn reserved_names(self) -> &'static [&'static str] {
        match self {
            ElementKind::Map => &[
                "version",
                "tiledversion",
                "orientation",
                "renderorder",
                "width",
                "height",
                "tilewidth",
                "tileheight",
                "hexsidelength",
                "staggeraxis",
                "staggerindex",
                "backgroundcolor",
                "infinite",
                "nextlayerid",
                "nextobjectid",
            ],
            ElementKind::Tileset => &[
                "firstgid",
                "source",
                "name",
                "tilewidth",
                "tileheight",
                "spacing",
                "margin",
                "tilecount",
                "columns",
            ],
            ElementKind::Tile => &[
                "id",
                "type",
                "terrain",
                "probability",
                "width",
                "height",
                "source",
                "trans",
            ],
            ElementKind::Layer => &[
                "id", "name", "x", "y", "width", "height", "opacity", "visible", "offsetx",
                "offsety",
            ],
            ElementKind::ObjectGroup => &[
                "id",
                "name",
                "color",
                "x",
                "y",
                "width",
                "height",
                "opacity",
                "visible",
                "offsetx",
                "offsety",
                "draworder",
            ],
            ElementKind::Object => &[
                "id", "name", "type", "x", "y", "width", "height", "rotation", "gid", "visible",
                "template",
            ],
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse the `<properties>` child of `node` into a [`PropertyBag`].
///
/// `owner` names the element for error messages. Keys matching the kind's
/// reserved-attribute set fail with [`MapError::ReservedNameConflict`]
/// unless `allow_override` is set.
pub(crate) fn parse_properties(
    node: Node<'_, '_>,
    kind: ElementKind,
    owner: &str,
    allow_override: bool,
) -> Result<PropertyBag, MapError> {
    let mut bag = PropertyBag::new();
    for block in child_elements(node, "properties") {
        for prop in child_elements(block, "property") {
            let name = required_attr(prop, "name")?;
            if !allow_override && kind.reserved_names().contains(&name) {
                return Err(MapError::ReservedNameConflict {
                    kind,
                    key: name.to_string(),
                    owner: owner.to_string(),
                });
            }

            // Multi-line string properties store their value as element
            // text instead of a value attribute.
            let raw = match prop.attribute("value") {
                Some(value) => value,
                None => prop.text().unwrap_or(""),
            };

            bag.insert(name.to_string(), coerce_value(prop, name, owner, raw)?);
        }
    }
    Ok(bag)
}

fn coerce_value(
    prop: Node<'_, '_>,
    name: &str,
    owner: &str,
    raw: &str,
) -> Result<PropertyValue, MapError> {
    let bad = |expected: &str| MapError::Schema {
        element: "property".to_string(),
        message: format!("property '{name}' on '{owner}' has invalid value '{raw}'; expected {expected}"),
    };

    let value = match prop.attribute("type") {
        None | Some("string") => PropertyValue::String(raw.to_string()),
        Some("int") => PropertyValue::Int(raw.trim().parse().map_err(|_| bad("an integer"))?),
        Some("float") => PropertyValue::Float(raw.trim().parse().map_err(|_| bad("a number"))?),
        Some("bool") => PropertyValue::Bool(parse_bool(raw).ok_or_else(|| bad("a boolean"))?),
        Some("color") => PropertyValue::Color(raw.trim().to_string()),
        Some("file") => PropertyValue::File(PathBuf::from(raw.trim())),
        Some(other) => {
            warn!(property = name, declared_type = other, "unknown property type, storing as string");
            PropertyValue::String(raw.to_string())
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_bag(xml: &str, kind: ElementKind, allow_override: bool) -> Result<PropertyBag, MapError> {
        let doc = roxmltree::Document::parse(xml).expect("parse xml");
        parse_properties(doc.root_element(), kind, "test", allow_override)
    }

    #[test]
    fn typed_values_coerce() {
        let xml = r##"<object>
            <properties>
                <property name="hp" type="int" value="12"/>
                <property name="speed" type="float" value="1.5"/>
                <property name="solid" type="bool" value="true"/>
                <property name="tint" type="color" value="#ff00ff00"/>
                <property name="script" type="file" value="ai/walker.lua"/>
                <property name="label" value="spawn point"/>
            </properties>
        </object>"##;
        let bag = parse_bag(xml, ElementKind::Object, false).expect("parse");
        assert_eq!(bag["hp"], PropertyValue::Int(12));
        assert_eq!(bag["speed"], PropertyValue::Float(1.5));
        assert_eq!(bag["solid"], PropertyValue::Bool(true));
        assert_eq!(bag["tint"], PropertyValue::Color("#ff00ff00".to_string()));
        assert_eq!(bag["script"], PropertyValue::File(PathBuf::from("ai/walker.lua")));
        assert_eq!(bag["label"], PropertyValue::String("spawn point".to_string()));
    }

    #[test]
    fn reserved_name_is_rejected() {
        let xml = r#"<object>
            <properties><property name="width" value="10"/></properties>
        </object>"#;
        let err = parse_bag(xml, ElementKind::Object, false).unwrap_err();
        match err {
            MapError::ReservedNameConflict { kind, key, .. } => {
                assert_eq!(kind, ElementKind::Object);
                assert_eq!(key, "width");
            }
            other => panic!("expected ReservedNameConflict, got {other:?}"),
        }
    }

    #[test]
    fn reserved_name_allowed_with_override() {
        let xml = r#"<object>
            <properties><property name="width" value="10"/></properties>
        </object>"#;
        let bag = parse_bag(xml, ElementKind::Object, true).expect("parse");
        assert_eq!(bag["width"], PropertyValue::String("10".to_string()));
    }

    #[test]
    fn reserved_sets_are_kind_specific() {
        // "draworder" is reserved for object groups but fine on an object.
        let xml = r#"<e>
            <properties><property name="draworder" value="custom"/></properties>
        </e>"#;
        assert!(parse_bag(xml, ElementKind::Object, false).is_ok());
        assert!(parse_bag(xml, ElementKind::ObjectGroup, false).is_err());
    }

    #[test]
    fn text_value_and_unknown_type_fall_back_to_string() {
        let xml = r#"<e>
            <properties>
                <property name="note">line one</property>
                <property name="odd" type="class" value="x"/>
            </properties>
        </e>"#;
        let bag = parse_bag(xml, ElementKind::Object, false).expect("parse");
        assert_eq!(bag["note"], PropertyValue::String("line one".to_string()));
        assert_eq!(bag["odd"], PropertyValue::String("x".to_string()));
    }

    #[test]
    fn insertion_order_is_preserved() {
        let xml = r#"<e>
            <properties>
                <property name="zeta" value="1"/>
                <property name="alpha" value="2"/>
            </properties>
        </e>"#;
        let bag = parse_bag(xml, ElementKind::Map, false).expect("parse");
        let keys: Vec<_> = bag.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
