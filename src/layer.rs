//! Map layers: tile layers, object groups, and image layers.

use std::path::PathBuf;

use roxmltree::Node;

use crate::data::decode_layer_data;
use crate::error::MapError;
use crate::object::TiledObject;
use crate::properties::{parse_properties, ElementKind, PropertyBag};
use crate::xml::{bool_attr_or, child_element, child_elements, parse_attr_or, required_attr};

/// A dense 2D grid of raw GIDs (width × height cells).
#[derive(Clone, Debug)]
pub struct TileCellGrid {
    width: u32,
    height: u32,
    cells: Vec<u32>,
}

impl TileCellGrid {
    pub(crate) fn new(width: u32, height: u32, cells: Vec<u32>) -> Self {
        debug_assert_eq!(cells.len(), width as usize * height as usize);
        TileCellGrid {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw GID at a coordinate; `None` when out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y as usize * self.width as usize + x as usize).copied()
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// All `(x, y, raw gid)` triples in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, gid)| (i as u32 % width, i as u32 / width, *gid))
    }
}

/// Object draw order of an object group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawOrder {
    #[default]
    Index,
    TopDown,
}

/// A layer of tile cells.
#[derive(Clone, Debug)]
pub struct TileLayer {
    pub grid: TileCellGrid,
}

/// A layer of free-standing objects.
#[derive(Clone, Debug)]
pub struct ObjectGroup {
    pub draw_order: DrawOrder,
    pub color: Option<String>,
    pub objects: Vec<TiledObject>,
}

/// A layer showing a single image.
#[derive(Clone, Debug)]
pub struct ImageLayer {
    /// Path relative to the map document.
    pub source: Option<PathBuf>,
    pub colorkey: Option<String>,
}

/// The kind-specific payload of a layer.
#[derive(Clone, Debug)]
pub enum LayerKind {
    Tile(TileLayer),
    Object(ObjectGroup),
    Image(ImageLayer),
}

/// A map layer with its common fields.
///
/// `index` is the layer's position in flattened document order and is the
/// index used by coordinate queries on [`Map`](crate::Map).
#[derive(Clone, Debug)]
pub struct Layer {
    pub name: String,
    pub index: usize,
    pub visible: bool,
    pub opacity: f32,
    pub offset: (f32, f32),
    pub properties: PropertyBag,
    pub kind: LayerKind,
}

impl Layer {
    pub fn as_tile_layer(&self) -> Option<&TileLayer> {
        match &self.kind {
            LayerKind::Tile(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_object_group(&self) -> Option<&ObjectGroup> {
        match &self.kind {
            LayerKind::Object(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_image_layer(&self) -> Option<&ImageLayer> {
        match &self.kind {
            LayerKind::Image(layer) => Some(layer),
            _ => None,
        }
    }

    pub(crate) fn parse_tile_layer(
        node: Node<'_, '_>,
        index: usize,
        visible: bool,
        allow_override: bool,
    ) -> Result<Layer, MapError> {
        let name = node.attribute("name").unwrap_or("").to_string();
        let width: u32 = parse_attr_or(node, "width", 0)?;
        let height: u32 = parse_attr_or(node, "height", 0)?;
        let common = CommonFields::parse(node, ElementKind::Layer, &name, allow_override)?;

        let data = child_element(node, "data").ok_or_else(|| MapError::PayloadDecode {
            layer: name.clone(),
            message: "missing <data> element".to_string(),
        })?;
        let cells = decode_layer_data(data, width, height, &name)?;

        Ok(Layer {
            name,
            index,
            visible: visible && common.visible,
            opacity: common.opacity,
            offset: common.offset,
            properties: common.properties,
            kind: LayerKind::Tile(TileLayer {
                grid: TileCellGrid::new(width, height, cells),
            }),
        })
    }

    pub(crate) fn parse_object_group(
        node: Node<'_, '_>,
        index: usize,
        visible: bool,
        allow_override: bool,
    ) -> Result<Layer, MapError> {
        let name = node.attribute("name").unwrap_or("").to_string();
        let common = CommonFields::parse(node, ElementKind::ObjectGroup, &name, allow_override)?;

        let draw_order = match node.attribute("draworder") {
            None | Some("index") => DrawOrder::Index,
            Some("topdown") => DrawOrder::TopDown,
            Some(other) => {
                return Err(MapError::Schema {
                    element: "objectgroup".to_string(),
                    message: format!("unknown draworder '{other}'"),
                })
            }
        };

        let mut objects = Vec::new();
        for object_node in child_elements(node, "object") {
            objects.push(TiledObject::parse(object_node, allow_override)?);
        }

        Ok(Layer {
            name,
            index,
            visible: visible && common.visible,
            opacity: common.opacity,
            offset: common.offset,
            properties: common.properties,
            kind: LayerKind::Object(ObjectGroup {
                draw_order,
                color: node.attribute("color").map(ToOwned::to_owned),
                objects,
            }),
        })
    }

    pub(crate) fn parse_image_layer(
        node: Node<'_, '_>,
        index: usize,
        visible: bool,
        allow_override: bool,
    ) -> Result<Layer, MapError> {
        let name = node.attribute("name").unwrap_or("").to_string();
        let common = CommonFields::parse(node, ElementKind::Layer, &name, allow_override)?;

        let (source, colorkey) = match child_element(node, "image") {
            Some(image) => (
                Some(PathBuf::from(required_attr(image, "source")?)),
                image.attribute("trans").map(ToOwned::to_owned),
            ),
            None => (None, None),
        };

        Ok(Layer {
            name,
            index,
            visible: visible && common.visible,
            opacity: common.opacity,
            offset: common.offset,
            properties: common.properties,
            kind: LayerKind::Image(ImageLayer { source, colorkey }),
        })
    }
}

struct CommonFields {
    visible: bool,
    opacity: f32,
    offset: (f32, f32),
    properties: PropertyBag,
}

impl CommonFields {
    fn parse(
        node: Node<'_, '_>,
        kind: ElementKind,
        name: &str,
        allow_override: bool,
    ) -> Result<CommonFields, MapError> {
        Ok(CommonFields {
            visible: bool_attr_or(node, "visible", true)?,
            opacity: parse_attr_or(node, "opacity", 1.0)?,
            offset: (
                parse_attr_or(node, "offsetx", 0.0)?,
                parse_attr_or(node, "offsety", 0.0)?,
            ),
            properties: parse_properties(node, kind, name, allow_override)?,
        })
    }
}
