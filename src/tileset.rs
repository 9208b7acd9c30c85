//! Tilesets, per-tile metadata, and the firstgid-range registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use roxmltree::Node;
use tracing::debug;

use crate::error::MapError;
use crate::object::TiledObject;
use crate::properties::{parse_properties, ElementKind, PropertyBag};
use crate::xml::{child_element, child_elements, parse_attr, parse_attr_or, required_attr};

/// The source image of a tileset or of an individual tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TilesetImage {
    /// Path relative to the map document.
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Colorkey transparency (`trans` attribute), without a leading '#'.
    pub colorkey: Option<String>,
}

/// One frame of a tile animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationFrame {
    /// Tileset-local id of the frame's tile.
    pub local_id: u32,
    /// Frame duration in milliseconds.
    pub duration_ms: u32,
}

/// Metadata attached to a single tile of a tileset.
#[derive(Clone, Debug, Default)]
pub struct TileMeta {
    pub properties: PropertyBag,
    pub frames: Vec<AnimationFrame>,
    /// Collision shapes from the tile's embedded object group.
    pub colliders: Vec<TiledObject>,
    /// Tiles may carry their own image instead of a sheet rect.
    pub image: Option<TilesetImage>,
}

/// A named collection of equally sized tiles sliced from one source image.
#[derive(Clone, Debug)]
pub struct Tileset {
    pub firstgid: u32,
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
    pub tile_count: u32,
    pub columns: u32,
    /// Per-tile drawing offset from the `<tileoffset>` element.
    pub tile_offset: (i32, i32),
    pub image: Option<TilesetImage>,
    pub properties: PropertyBag,
    pub(crate) tiles: HashMap<u32, TileMeta>,
}

impl Tileset {
    /// Parse a `<tileset>` element.
    ///
    /// `firstgid` overrides the node's own attribute; external tilesets do
    /// not store one, it lives on the placeholder in the map document.
    /// `image_prefix` is prepended to image paths so that paths inside an
    /// external tileset stay relative to the map document; `base_dir` is
    /// the map document's directory, used when an image has to be probed
    /// on disk.
    pub(crate) fn parse(
        node: Node<'_, '_>,
        firstgid: Option<u32>,
        image_prefix: &Path,
        base_dir: &Path,
        allow_override: bool,
    ) -> Result<Tileset, MapError> {
        let firstgid = match firstgid {
            Some(gid) => gid,
            None => parse_attr(node, "firstgid")?,
        };
        let name = node.attribute("name").unwrap_or("").to_string();
        let tile_width = parse_attr(node, "tilewidth")?;
        let tile_height = parse_attr(node, "tileheight")?;
        let spacing = parse_attr_or(node, "spacing", 0)?;
        let margin = parse_attr_or(node, "margin", 0)?;
        let columns = parse_attr_or(node, "columns", 0)?;
        let properties = parse_properties(node, ElementKind::Tileset, &name, allow_override)?;

        let image = match child_element(node, "image") {
            Some(image_node) => Some(parse_image(image_node, image_prefix, base_dir)?),
            None => None,
        };

        let tile_count = match node.attribute("tilecount") {
            Some(_) => parse_attr(node, "tilecount")?,
            // Older documents omit tilecount; derive it from the sheet.
            None => image
                .as_ref()
                .map(|img| {
                    grid_capacity(img.width, img.height, tile_width, tile_height, margin, spacing)
                })
                .unwrap_or(0),
        };

        let tile_offset = match child_element(node, "tileoffset") {
            Some(offset) => (
                parse_attr_or(offset, "x", 0)?,
                parse_attr_or(offset, "y", 0)?,
            ),
            None => (0, 0),
        };

        let mut tiles = HashMap::new();
        for tile_node in child_elements(node, "tile") {
            let local_id: u32 = parse_attr(tile_node, "id")?;
            let meta = parse_tile_meta(tile_node, image_prefix, base_dir, allow_override)?;
            tiles.insert(local_id, meta);
        }

        debug!(
            tileset = %name,
            firstgid,
            tile_count,
            tiles_with_meta = tiles.len(),
            "parsed tileset"
        );

        Ok(Tileset {
            firstgid,
            name,
            tile_width,
            tile_height,
            spacing,
            margin,
            tile_count,
            columns,
            tile_offset,
            image,
            properties,
            tiles,
        })
    }

    /// Metadata for a local tile id, if any was authored.
    pub fn tile_meta(&self, local_id: u32) -> Option<&TileMeta> {
        self.tiles.get(&local_id)
    }

    /// All (local id, metadata) pairs, in no particular order.
    pub fn tiles_with_meta(&self) -> impl Iterator<Item = (u32, &TileMeta)> {
        self.tiles.iter().map(|(id, meta)| (*id, meta))
    }

    /// Whether this tileset covers the given bare GID.
    pub fn contains_gid(&self, bare_gid: u32) -> bool {
        bare_gid >= self.firstgid && bare_gid - self.firstgid < self.tile_count
    }
}

fn parse_tile_meta(
    node: Node<'_, '_>,
    image_prefix: &Path,
    base_dir: &Path,
    allow_override: bool,
) -> Result<TileMeta, MapError> {
    let owner = format!("tile {}", node.attribute("id").unwrap_or("?"));
    let properties = parse_properties(node, ElementKind::Tile, &owner, allow_override)?;

    let image = match child_element(node, "image") {
        Some(image_node) => Some(parse_image(image_node, image_prefix, base_dir)?),
        None => None,
    };

    let mut frames = Vec::new();
    if let Some(animation) = child_element(node, "animation") {
        for frame in child_elements(animation, "frame") {
            frames.push(AnimationFrame {
                local_id: parse_attr(frame, "tileid")?,
                duration_ms: parse_attr(frame, "duration")?,
            });
        }
    }

    let mut colliders = Vec::new();
    if let Some(group) = child_element(node, "objectgroup") {
        for object in child_elements(group, "object") {
            colliders.push(TiledObject::parse(object, allow_override)?);
        }
    }

    Ok(TileMeta {
        properties,
        frames,
        colliders,
        image,
    })
}

fn parse_image(node: Node<'_, '_>, prefix: &Path, base_dir: &Path) -> Result<TilesetImage, MapError> {
    let source = prefix.join(required_attr(node, "source")?);
    let colorkey = node.attribute("trans").map(ToOwned::to_owned);

    // Width and height are normally present as attributes; when they are
    // not, probe the image header on disk. `source` stays relative to the
    // map document, so anchor the probe there.
    let (width, height) = match (node.attribute("width"), node.attribute("height")) {
        (Some(_), Some(_)) => (parse_attr(node, "width")?, parse_attr(node, "height")?),
        _ => {
            let probe = base_dir.join(&source);
            let dim = imagesize::size(&probe).map_err(|source_err| MapError::Image {
                path: probe,
                message: format!("cannot determine image dimensions: {source_err}"),
            })?;
            (dim.width as u32, dim.height as u32)
        }
    };

    Ok(TilesetImage {
        source,
        width,
        height,
        colorkey,
    })
}

/// Number of tiles a sheet of the given geometry can hold.
pub(crate) fn grid_capacity(
    image_width: u32,
    image_height: u32,
    tile_width: u32,
    tile_height: u32,
    margin: u32,
    spacing: u32,
) -> u32 {
    let per_row = tiles_per_row(image_width, tile_width, margin, spacing);
    let per_col = tiles_per_row(image_height, tile_height, margin, spacing);
    per_row * per_col
}

/// Tiles per row for a sheet: floor((iw - 2*margin + spacing) / (tw + spacing)).
pub(crate) fn tiles_per_row(image_width: u32, tile_width: u32, margin: u32, spacing: u32) -> u32 {
    let usable = (image_width + spacing).saturating_sub(2 * margin);
    let stride = tile_width + spacing;
    if stride == 0 {
        0
    } else {
        usable / stride
    }
}

/// Ordered tilesets with non-overlapping, ascending firstgid ranges.
#[derive(Clone, Debug)]
pub struct TilesetRegistry {
    tilesets: Vec<Tileset>,
}

impl TilesetRegistry {
    pub(crate) fn new(mut tilesets: Vec<Tileset>) -> Result<Self, MapError> {
        tilesets.sort_by_key(|ts| ts.firstgid);
        for pair in tilesets.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.firstgid < prev.firstgid + prev.tile_count.max(1) {
                return Err(MapError::Schema {
                    element: "tileset".to_string(),
                    message: format!(
                        "firstgid range of '{}' (starting at {}) overlaps '{}' (starting at {})",
                        next.name, next.firstgid, prev.name, prev.firstgid
                    ),
                });
            }
        }
        Ok(TilesetRegistry { tilesets })
    }

    /// Resolve a bare (flag-free) GID to `(tileset index, tileset, local id)`.
    ///
    /// GID 0 means "no tile" and must be special-cased by the caller.
    pub fn lookup(&self, bare_gid: u32) -> Result<(usize, &Tileset, u32), MapError> {
        let idx = self
            .tilesets
            .partition_point(|ts| ts.firstgid <= bare_gid);
        if idx == 0 {
            return Err(MapError::UnknownTileset { gid: bare_gid });
        }

        let tileset = &self.tilesets[idx - 1];
        let local_id = bare_gid - tileset.firstgid;
        if local_id >= tileset.tile_count {
            return Err(MapError::UnknownTileset { gid: bare_gid });
        }
        Ok((idx - 1, tileset, local_id))
    }

    pub fn get(&self, index: usize) -> Option<&Tileset> {
        self.tilesets.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tileset> {
        self.tilesets.iter()
    }

    pub fn len(&self) -> usize {
        self.tilesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tilesets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tileset(firstgid: u32, name: &str, tile_count: u32) -> Tileset {
        Tileset {
            firstgid,
            name: name.to_string(),
            tile_width: 32,
            tile_height: 32,
            spacing: 0,
            margin: 0,
            tile_count,
            columns: 8,
            tile_offset: (0, 0),
            image: None,
            properties: PropertyBag::new(),
            tiles: HashMap::new(),
        }
    }

    #[test]
    fn lookup_picks_the_covering_range() {
        let registry = TilesetRegistry::new(vec![
            tileset(1, "ground", 64),
            tileset(65, "walls", 16),
        ])
        .expect("registry");

        let (idx, ts, local) = registry.lookup(1).expect("gid 1");
        assert_eq!((idx, ts.name.as_str(), local), (0, "ground", 0));

        let (idx, ts, local) = registry.lookup(64).expect("gid 64");
        assert_eq!((idx, ts.name.as_str(), local), (0, "ground", 63));

        let (idx, ts, local) = registry.lookup(65).expect("gid 65");
        assert_eq!((idx, ts.name.as_str(), local), (1, "walls", 0));
    }

    #[test]
    fn lookup_rejects_uncovered_gids() {
        let registry = TilesetRegistry::new(vec![tileset(1, "ground", 4)]).expect("registry");
        assert!(matches!(
            registry.lookup(5).unwrap_err(),
            MapError::UnknownTileset { gid: 5 }
        ));
        // GID below the first range.
        let registry = TilesetRegistry::new(vec![tileset(10, "late", 4)]).expect("registry");
        assert!(matches!(
            registry.lookup(3).unwrap_err(),
            MapError::UnknownTileset { gid: 3 }
        ));
    }

    #[test]
    fn overlapping_ranges_are_rejected() {
        let err = TilesetRegistry::new(vec![
            tileset(1, "ground", 64),
            tileset(32, "walls", 16),
        ])
        .unwrap_err();
        assert!(matches!(err, MapError::Schema { .. }));
    }

    #[test]
    fn tiles_per_row_matches_sheet_geometry() {
        assert_eq!(tiles_per_row(256, 32, 0, 0), 8);
        // 2px margin, 2px spacing: (256 - 4 + 2) / 34 = 7.
        assert_eq!(tiles_per_row(256, 32, 2, 2), 7);
        assert_eq!(grid_capacity(256, 256, 32, 32, 0, 0), 64);
    }

    #[test]
    fn parse_reads_animation_and_colliders() {
        let xml = r#"<tileset firstgid="1" name="terrain" tilewidth="16" tileheight="16" tilecount="8" columns="4">
            <image source="terrain.png" width="64" height="32"/>
            <tile id="3">
                <properties><property name="kind" value="water"/></properties>
                <animation>
                    <frame tileid="3" duration="100"/>
                    <frame tileid="4" duration="150"/>
                </animation>
                <objectgroup>
                    <object id="1" x="0" y="8" width="16" height="8"/>
                </objectgroup>
            </tile>
        </tileset>"#;
        let doc = roxmltree::Document::parse(xml).expect("parse xml");
        let ts = Tileset::parse(doc.root_element(), None, Path::new(""), Path::new(""), false)
            .expect("tileset");

        assert_eq!(ts.firstgid, 1);
        assert_eq!(ts.tile_count, 8);
        let image = ts.image.as_ref().expect("image");
        assert_eq!(image.source, PathBuf::from("terrain.png"));
        assert_eq!((image.width, image.height), (64, 32));

        let meta = ts.tile_meta(3).expect("meta");
        assert_eq!(meta.frames.len(), 2);
        assert_eq!(meta.frames[0], AnimationFrame { local_id: 3, duration_ms: 100 });
        assert_eq!(meta.colliders.len(), 1);
        assert_eq!(meta.properties["kind"].as_str(), Some("water"));
        assert!(ts.tile_meta(0).is_none());
    }

    #[test]
    fn tile_count_derived_when_missing() {
        let xml = r#"<tileset firstgid="1" name="old" tilewidth="32" tileheight="32">
            <image source="old.png" width="256" height="64"/>
        </tileset>"#;
        let doc = roxmltree::Document::parse(xml).expect("parse xml");
        let ts = Tileset::parse(doc.root_element(), None, Path::new(""), Path::new(""), false)
            .expect("tileset");
        assert_eq!(ts.tile_count, 16);
    }
}
