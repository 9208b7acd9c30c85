//! Map objects and their geometry transforms.
//!
//! Polygon and polyline points are authored relative to the object origin;
//! they are translated into absolute map-pixel coordinates exactly once at
//! decode time. Rotation is never baked into the stored points: it is only
//! applied, about the object origin, by [`TiledObject::transformed_points`].

use roxmltree::Node;

use crate::error::MapError;
use crate::properties::{parse_properties, ElementKind, PropertyBag};
use crate::xml::{bool_attr_or, child_element, parse_attr, parse_attr_or, required_attr};

/// A point in absolute map-pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

/// The shape kind of a map object.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectShape {
    Rectangle,
    Point,
    Ellipse,
    /// Closed shape; points are absolute map-pixel coordinates.
    Polygon { points: Vec<Point> },
    /// Open shape; points are absolute map-pixel coordinates.
    Polyline { points: Vec<Point> },
    /// References a tile image by raw GID (orientation bits included).
    Tile { gid: u32 },
}

/// A single object from an object group or a tile collider group.
#[derive(Clone, Debug)]
pub struct TiledObject {
    pub id: u32,
    pub name: Option<String>,
    /// The object's `type`/class attribute from the editor.
    pub class: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Rotation in degrees, clockwise, about the object origin.
    pub rotation: f32,
    pub visible: bool,
    pub shape: ObjectShape,
    pub properties: PropertyBag,
}

impl TiledObject {
    pub(crate) fn parse(node: Node<'_, '_>, allow_override: bool) -> Result<Self, MapError> {
        let id = parse_attr_or(node, "id", 0)?;
        let name = node.attribute("name").map(ToOwned::to_owned);
        let class = node.attribute("type").map(ToOwned::to_owned);
        let owner = match &name {
            Some(name) => name.clone(),
            None => format!("object {id}"),
        };

        let x: f32 = parse_attr_or(node, "x", 0.0)?;
        let y: f32 = parse_attr_or(node, "y", 0.0)?;
        let mut width: f32 = parse_attr_or(node, "width", 0.0)?;
        let mut height: f32 = parse_attr_or(node, "height", 0.0)?;
        let rotation = parse_attr_or(node, "rotation", 0.0)?;
        let visible = bool_attr_or(node, "visible", true)?;
        let properties = parse_properties(node, ElementKind::Object, &owner, allow_override)?;

        let shape = if node.attribute("gid").is_some() {
            ObjectShape::Tile {
                gid: parse_attr::<u32>(node, "gid")?,
            }
        } else if let Some(polygon) = child_element(node, "polygon") {
            let points = read_points(polygon, &owner, x, y)?;
            let (w, h) = extent(&points);
            width = w;
            height = h;
            ObjectShape::Polygon { points }
        } else if let Some(polyline) = child_element(node, "polyline") {
            let points = read_points(polyline, &owner, x, y)?;
            let (w, h) = extent(&points);
            width = w;
            height = h;
            ObjectShape::Polyline { points }
        } else if child_element(node, "ellipse").is_some() {
            ObjectShape::Ellipse
        } else if child_element(node, "point").is_some() {
            ObjectShape::Point
        } else {
            ObjectShape::Rectangle
        };

        Ok(TiledObject {
            id,
            name,
            class,
            x,
            y,
            width,
            height,
            rotation,
            visible,
            shape,
            properties,
        })
    }

    /// Absolute points for polygon and polyline shapes.
    pub fn points(&self) -> Option<&[Point]> {
        match &self.shape {
            ObjectShape::Polygon { points } | ObjectShape::Polyline { points } => Some(points),
            _ => None,
        }
    }

    /// The raw GID of a tile-reference object.
    pub fn raw_gid(&self) -> Option<u32> {
        match self.shape {
            ObjectShape::Tile { gid } => Some(gid),
            _ => None,
        }
    }

    /// The four corners of the bounding box, in absolute coordinates.
    pub fn corner_points(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.x, self.y + self.height),
            Point::new(self.x + self.width, self.y + self.height),
            Point::new(self.x + self.width, self.y),
        ]
    }

    /// All points of the object with rotation applied about its origin.
    ///
    /// Uses the stored polygon/polyline points when present, otherwise the
    /// bounding-box corners. The stored points themselves are never
    /// modified by this call.
    pub fn transformed_points(&self) -> Vec<Point> {
        let origin = Point::new(self.x, self.y);
        match self.points() {
            Some(points) => rotate_about(points, origin, self.rotation),
            None => rotate_about(&self.corner_points(), origin, self.rotation),
        }
    }
}

/// Rotate `points` clockwise by `degrees` about `origin`.
pub(crate) fn rotate_about(points: &[Point], origin: Point, degrees: f32) -> Vec<Point> {
    let (sin_t, cos_t) = degrees.to_radians().sin_cos();
    points
        .iter()
        .map(|p| {
            let dx = p.x - origin.x;
            let dy = p.y - origin.y;
            Point::new(
                origin.x + cos_t * dx - sin_t * dy,
                origin.y + sin_t * dx + cos_t * dy,
            )
        })
        .collect()
}

/// Parse a `points` attribute, translating into absolute coordinates.
fn read_points(
    node: Node<'_, '_>,
    owner: &str,
    origin_x: f32,
    origin_y: f32,
) -> Result<Vec<Point>, MapError> {
    let raw = required_attr(node, "points")?;
    let mut points = Vec::new();
    for pair in raw.split_whitespace() {
        let mut split = pair.splitn(2, ',');
        let parsed = match (split.next(), split.next()) {
            (Some(x), Some(y)) => match (x.parse::<f32>(), y.parse::<f32>()) {
                (Ok(x), Ok(y)) => Some(Point::new(origin_x + x, origin_y + y)),
                _ => None,
            },
            _ => None,
        };
        let point = parsed.ok_or_else(|| MapError::Schema {
            element: node.tag_name().name().to_string(),
            message: format!("object '{owner}' has invalid point '{pair}'"),
        })?;
        points.push(point);
    }
    Ok(points)
}

/// Width and height of the axis-aligned extent of a point list.
fn extent(points: &[Point]) -> (f32, f32) {
    let mut min = Point::new(f32::MAX, f32::MAX);
    let mut max = Point::new(f32::MIN, f32::MIN);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    if points.is_empty() {
        (0.0, 0.0)
    } else {
        (max.x - min.x, max.y - min.y)
    }
}
