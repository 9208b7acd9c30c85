//! The document assembler: loads a TMX document into a queryable [`Map`].
//!
//! Loading is a single synchronous pass: parse the tree, merge tilesets,
//! decode layer payloads, fix up tile objects, then slice every referenced
//! tile image through the backend. Any failure aborts the load; no partial
//! map is ever returned. The assembled map is immutable afterwards except
//! for explicit, append-only atlas growth via [`Map::slice_tile`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::debug;

use crate::atlas::{AtlasKey, ImageBackend, ImageRequest, TileAtlas, TileTransform};
use crate::error::MapError;
use crate::gid::{decode_gid, TileFlags};
use crate::layer::{Layer, LayerKind, ObjectGroup, TileLayer};
use crate::object::{ObjectShape, TiledObject};
use crate::properties::{parse_properties, ElementKind, PropertyBag};
use crate::tileset::{AnimationFrame, Tileset, TilesetRegistry};
use crate::xml::{bool_attr_or, child_elements, parse_attr};

/// Map grid orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Staggered,
    Hexagonal,
}

impl Orientation {
    fn parse(raw: Option<&str>) -> Result<Orientation, MapError> {
        match raw {
            None | Some("orthogonal") => Ok(Orientation::Orthogonal),
            Some("isometric") => Ok(Orientation::Isometric),
            Some("staggered") => Ok(Orientation::Staggered),
            Some("hexagonal") => Ok(Orientation::Hexagonal),
            Some(other) => Err(MapError::Schema {
                element: "map".to_string(),
                message: format!("unknown orientation '{other}'"),
            }),
        }
    }
}

/// Options controlling a map load.
#[derive(Clone, Copy, Debug)]
pub struct LoadOptions {
    /// Slice every tile of every tileset instead of only referenced ones.
    pub load_all_tiles: bool,
    /// Shift tile-object origins for bottom-left-origin targets.
    pub invert_y: bool,
    /// Let user properties shadow reserved attribute names.
    pub allow_duplicate_names: bool,
    /// Forwarded to the image backend for per-pixel alpha handling.
    pub pixel_alpha: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            load_all_tiles: false,
            invert_y: true,
            allow_duplicate_names: false,
            pixel_alpha: true,
        }
    }
}

/// A fully decoded tile map.
///
/// Generic over the [`ImageBackend`] whose handles it caches; use
/// [`NullBackend`](crate::atlas::NullBackend) to load a map without
/// decoding any images.
pub struct Map<B: ImageBackend> {
    pub version: String,
    pub tiled_version: Option<String>,
    pub orientation: Orientation,
    pub render_order: Option<String>,
    /// Map size in tiles.
    pub width: u32,
    pub height: u32,
    /// Tile size in pixels.
    pub tile_width: u32,
    pub tile_height: u32,
    pub background_color: Option<String>,
    pub properties: PropertyBag,
    registry: TilesetRegistry,
    layers: Vec<Layer>,
    animations: HashMap<u32, Vec<AnimationFrame>>,
    atlas: TileAtlas<B>,
    layer_images: HashMap<usize, B::Handle>,
    base_dir: PathBuf,
    options: LoadOptions,
}

// Backend handles are opaque; print a structural summary instead of
// requiring Debug of them.
impl<B: ImageBackend> fmt::Debug for Map<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("version", &self.version)
            .field("orientation", &self.orientation)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("tile_width", &self.tile_width)
            .field("tile_height", &self.tile_height)
            .field("tilesets", &self.registry.len())
            .field("layers", &self.layers.len())
            .field("cached_tiles", &self.atlas.len())
            .finish_non_exhaustive()
    }
}

impl<B: ImageBackend> Map<B> {
    /// Load a map from a .tmx file.
    ///
    /// External tilesets and images are resolved relative to the file.
    pub fn load(
        path: impl AsRef<Path>,
        backend: &mut B,
        options: LoadOptions,
    ) -> Result<Map<B>, MapError> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::assemble(&xml, path, &base_dir, backend, options)
    }

    /// Load a map from an in-memory document.
    ///
    /// `base_dir` anchors the relative paths of external tilesets and
    /// images.
    pub fn from_xml_str(
        xml: &str,
        base_dir: &Path,
        backend: &mut B,
        options: LoadOptions,
    ) -> Result<Map<B>, MapError> {
        Self::assemble(xml, Path::new("<string>"), base_dir, backend, options)
    }

    fn assemble(
        xml: &str,
        origin: &Path,
        base_dir: &Path,
        backend: &mut B,
        options: LoadOptions,
    ) -> Result<Map<B>, MapError> {
        let doc = Document::parse(xml).map_err(|source| MapError::XmlParse {
            path: origin.to_path_buf(),
            message: source.to_string(),
        })?;
        let root = doc.root_element();
        if root.tag_name().name() != "map" {
            return Err(MapError::Schema {
                element: root.tag_name().name().to_string(),
                message: "expected <map> root element".to_string(),
            });
        }
        if root.attribute("infinite").is_some_and(|raw| raw == "1" || raw == "true") {
            return Err(MapError::Schema {
                element: "map".to_string(),
                message: "infinite maps are not supported".to_string(),
            });
        }

        let allow_override = options.allow_duplicate_names;
        let width: u32 = parse_attr(root, "width")?;
        let height: u32 = parse_attr(root, "height")?;

        // Tilesets first: layer decoding validates cell GIDs against them.
        let mut tilesets = Vec::new();
        for node in child_elements(root, "tileset") {
            tilesets.push(parse_tileset_entry(node, base_dir, allow_override)?);
        }
        let registry = TilesetRegistry::new(tilesets)?;
        debug!(tilesets = registry.len(), "tilesets resolved");

        // Layers in flattened document order.
        let mut layers = Vec::new();
        collect_layers(root, true, allow_override, &mut layers)?;
        debug!(layers = layers.len(), "layers decoded");

        // Tile objects inherit their tile's properties and, for inverted-y
        // targets, move their origin from the bottom-left corner.
        for layer in &mut layers {
            if let LayerKind::Object(group) = &mut layer.kind {
                for object in &mut group.objects {
                    fix_up_tile_object(object, &registry, options.invert_y)?;
                }
            }
        }

        // Accumulate every (tileset, local id, flags) the document uses.
        let mut referenced: HashSet<AtlasKey> = HashSet::new();
        for layer in &layers {
            match &layer.kind {
                LayerKind::Tile(tile_layer) => {
                    for (_, _, raw) in tile_layer.grid.iter() {
                        if let Some(key) = key_for_raw(raw, &registry)? {
                            referenced.insert(key);
                        }
                    }
                }
                LayerKind::Object(group) => {
                    for object in &group.objects {
                        if let Some(key) =
                            object.raw_gid().map_or(Ok(None), |raw| key_for_raw(raw, &registry))?
                        {
                            referenced.insert(key);
                        }
                    }
                }
                LayerKind::Image(_) => {}
            }
        }
        if options.load_all_tiles {
            for (index, tileset) in registry.iter().enumerate() {
                for local_id in 0..tileset.tile_count {
                    referenced.insert(AtlasKey {
                        tileset: index,
                        local_id,
                        flags: TileFlags::default(),
                    });
                }
            }
        }

        let animations = build_animations(&registry, &mut referenced, options.load_all_tiles);

        // Population order is sorted for reproducibility; the cache itself
        // is keyed, so order never changes results.
        let mut atlas = TileAtlas::new(registry.len());
        let mut keys: Vec<AtlasKey> = referenced.into_iter().collect();
        keys.sort();
        for key in keys {
            let has_image = registry.get(key.tileset).is_some_and(|ts| {
                ts.image.is_some()
                    || ts.tile_meta(key.local_id).is_some_and(|meta| meta.image.is_some())
            });
            if !has_image {
                continue;
            }
            atlas.resolve(backend, &registry, base_dir, key, options.pixel_alpha)?;
        }
        debug!(tiles = atlas.len(), "atlas populated");

        let mut layer_images = HashMap::new();
        for layer in &layers {
            if let LayerKind::Image(image_layer) = &layer.kind {
                if let Some(source) = &image_layer.source {
                    let opened = backend.open(&ImageRequest {
                        path: &base_dir.join(source),
                        colorkey: image_layer.colorkey.as_deref(),
                        pixel_alpha: options.pixel_alpha,
                    })?;
                    let handle = backend.slice(&opened, None, TileTransform::Identity)?;
                    layer_images.insert(layer.index, handle);
                }
            }
        }

        Ok(Map {
            version: root.attribute("version").unwrap_or("1.0").to_string(),
            tiled_version: root.attribute("tiledversion").map(ToOwned::to_owned),
            orientation: Orientation::parse(root.attribute("orientation"))?,
            render_order: root.attribute("renderorder").map(ToOwned::to_owned),
            width,
            height,
            tile_width: parse_attr(root, "tilewidth")?,
            tile_height: parse_attr(root, "tileheight")?,
            background_color: root.attribute("backgroundcolor").map(ToOwned::to_owned),
            properties: parse_properties(root, ElementKind::Map, "map", allow_override)?,
            registry,
            layers,
            animations,
            atlas,
            layer_images,
            base_dir: base_dir.to_path_buf(),
            options,
        })
    }

    /// Map width in pixels.
    pub fn pixel_width(&self) -> u32 {
        self.width * self.tile_width
    }

    /// Map height in pixels.
    pub fn pixel_height(&self) -> u32 {
        self.height * self.tile_height
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// First layer with the given name, in flattened document order.
    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    pub fn tilesets(&self) -> &TilesetRegistry {
        &self.registry
    }

    pub fn atlas(&self) -> &TileAtlas<B> {
        &self.atlas
    }

    /// Visible tile layers, in document order.
    pub fn visible_tile_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers
            .iter()
            .filter(|layer| layer.visible && matches!(layer.kind, LayerKind::Tile(_)))
    }

    /// All object groups, in document order.
    pub fn object_groups(&self) -> impl Iterator<Item = &ObjectGroup> {
        self.layers.iter().filter_map(Layer::as_object_group)
    }

    /// All objects of all object groups, in document order.
    pub fn objects(&self) -> impl Iterator<Item = &TiledObject> {
        self.object_groups().flat_map(|group| group.objects.iter())
    }

    /// First object with the given name, in document order.
    ///
    /// Behavior under duplicate names is first-match; enforce uniqueness
    /// externally if you need more than that.
    pub fn object_by_name(&self, name: &str) -> Option<&TiledObject> {
        self.objects().find(|object| object.name.as_deref() == Some(name))
    }

    /// Raw GID at a coordinate of a tile layer. 0 means "no tile".
    pub fn tile_gid(&self, x: u32, y: u32, layer: usize) -> Result<u32, MapError> {
        let tile_layer = self.tile_layer(layer)?;
        tile_layer
            .grid
            .get(x, y)
            .ok_or(MapError::InvalidCoordinate { x, y, layer })
    }

    /// Cached tile image for a coordinate; `None` for empty cells.
    pub fn tile_image(&self, x: u32, y: u32, layer: usize) -> Result<Option<&B::Handle>, MapError> {
        let raw = self.tile_gid(x, y, layer)?;
        self.tile_image_by_gid(raw)
    }

    /// Cached tile image for a raw GID; `None` when the bare id is 0.
    pub fn tile_image_by_gid(&self, raw: u32) -> Result<Option<&B::Handle>, MapError> {
        match key_for_raw(raw, &self.registry)? {
            Some(key) => Ok(self.atlas.get(&key)),
            None => Ok(None),
        }
    }

    /// Tile properties at a coordinate; `None` for empty or plain cells.
    pub fn tile_properties(
        &self,
        x: u32,
        y: u32,
        layer: usize,
    ) -> Result<Option<&PropertyBag>, MapError> {
        let raw = self.tile_gid(x, y, layer)?;
        Ok(self.tile_properties_by_gid(raw))
    }

    /// Tile properties for a raw GID, flags ignored.
    pub fn tile_properties_by_gid(&self, raw: u32) -> Option<&PropertyBag> {
        let (bare, _) = decode_gid(raw);
        if bare == 0 {
            return None;
        }
        let (_, tileset, local_id) = self.registry.lookup(bare).ok()?;
        tileset
            .tile_meta(local_id)
            .map(|meta| &meta.properties)
            .filter(|bag| !bag.is_empty())
    }

    /// Animation frames for a raw GID, keyed by its bare id.
    pub fn animation(&self, raw: u32) -> Option<&[AnimationFrame]> {
        let (bare, _) = decode_gid(raw);
        self.animations.get(&bare).map(Vec::as_slice)
    }

    /// The full animation table: bare GID → frames.
    pub fn animations(&self) -> &HashMap<u32, Vec<AnimationFrame>> {
        &self.animations
    }

    /// `(global gid, colliders)` for every tile with collision shapes.
    pub fn tile_colliders(&self) -> impl Iterator<Item = (u32, &[TiledObject])> {
        self.registry.iter().flat_map(|tileset| {
            tileset
                .tiles_with_meta()
                .filter(|(_, meta)| !meta.colliders.is_empty())
                .map(move |(local_id, meta)| {
                    (tileset.firstgid + local_id, meta.colliders.as_slice())
                })
        })
    }

    /// Lazy iteration over the non-empty cells of a tile layer as
    /// `(x, y, tile image)` triples.
    ///
    /// The iterator is finite, restartable, and has no side effects on the
    /// grid or the cache.
    pub fn layer_tiles(
        &self,
        layer: usize,
    ) -> Result<impl Iterator<Item = (u32, u32, &B::Handle)>, MapError> {
        let tile_layer = self.tile_layer(layer)?;
        Ok(tile_layer.grid.iter().filter_map(move |(x, y, raw)| {
            if raw == 0 {
                return None;
            }
            self.handle_for_raw(raw).map(|handle| (x, y, handle))
        }))
    }

    /// Every `(x, y, layer index)` in a visible tile layer holding exactly
    /// this raw GID. A linear scan; cache results if used often.
    pub fn tile_locations_by_gid(&self, raw: u32) -> Vec<(u32, u32, usize)> {
        let mut locations = Vec::new();
        for layer in self.visible_tile_layers() {
            if let LayerKind::Tile(tile_layer) = &layer.kind {
                for (x, y, cell) in tile_layer.grid.iter() {
                    if cell == raw {
                        locations.push((x, y, layer.index));
                    }
                }
            }
        }
        locations
    }

    /// The loaded image of an image layer, if it has one.
    pub fn image_layer_image(&self, layer: usize) -> Option<&B::Handle> {
        self.layer_images.get(&layer)
    }

    /// Slice one more tile after the load, growing the cache.
    ///
    /// Supports tiles never referenced by the document. The cache only
    /// grows; existing handles are never invalidated.
    pub fn slice_tile(&mut self, backend: &mut B, raw: u32) -> Result<&B::Handle, MapError> {
        let key = key_for_raw(raw, &self.registry)?
            .ok_or(MapError::UnknownTileset { gid: 0 })?;
        self.atlas.resolve(
            backend,
            &self.registry,
            &self.base_dir,
            key,
            self.options.pixel_alpha,
        )
    }

    fn tile_layer(&self, layer: usize) -> Result<&TileLayer, MapError> {
        let entry = self
            .layers
            .get(layer)
            .ok_or(MapError::LayerNotFound { index: layer })?;
        entry
            .as_tile_layer()
            .ok_or(MapError::NotATileLayer { index: layer })
    }

    fn handle_for_raw(&self, raw: u32) -> Option<&B::Handle> {
        let key = key_for_raw(raw, &self.registry).ok().flatten()?;
        self.atlas.get(&key)
    }
}

// A bare id of 0 means "no tile" even when flag bits are set; it never
// maps to an atlas key.
fn key_for_raw(raw: u32, registry: &TilesetRegistry) -> Result<Option<AtlasKey>, MapError> {
    let (bare, flags) = decode_gid(raw);
    if bare == 0 {
        return Ok(None);
    }
    let (tileset, _, local_id) = registry.lookup(bare)?;
    Ok(Some(AtlasKey {
        tileset,
        local_id,
        flags,
    }))
}

fn parse_tileset_entry(
    node: Node<'_, '_>,
    base_dir: &Path,
    allow_override: bool,
) -> Result<Tileset, MapError> {
    match node.attribute("source") {
        None => Tileset::parse(node, None, Path::new(""), base_dir, allow_override),
        Some(source) => {
            // External tileset: the placeholder only carries firstgid and
            // the document path; image paths inside the .tsx stay relative
            // to it.
            let firstgid = parse_attr(node, "firstgid")?;
            let relative = Path::new(source);
            let tsx_path = base_dir.join(relative);
            let text = fs::read_to_string(&tsx_path)?;
            let tsx_doc = Document::parse(&text).map_err(|err| MapError::XmlParse {
                path: tsx_path.clone(),
                message: err.to_string(),
            })?;
            let prefix = relative.parent().unwrap_or(Path::new(""));
            Tileset::parse(tsx_doc.root_element(), Some(firstgid), prefix, base_dir, allow_override)
        }
    }
}

fn collect_layers(
    parent: Node<'_, '_>,
    visible: bool,
    allow_override: bool,
    out: &mut Vec<Layer>,
) -> Result<(), MapError> {
    for node in parent.children().filter(|n| n.is_element()) {
        let index = out.len();
        match node.tag_name().name() {
            "layer" => out.push(Layer::parse_tile_layer(node, index, visible, allow_override)?),
            "objectgroup" => {
                out.push(Layer::parse_object_group(node, index, visible, allow_override)?)
            }
            "imagelayer" => {
                out.push(Layer::parse_image_layer(node, index, visible, allow_override)?)
            }
            "group" => {
                let group_visible = visible && bool_attr_or(node, "visible", true)?;
                collect_layers(node, group_visible, allow_override, out)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn fix_up_tile_object(
    object: &mut TiledObject,
    registry: &TilesetRegistry,
    invert_y: bool,
) -> Result<(), MapError> {
    let ObjectShape::Tile { gid } = object.shape else {
        return Ok(());
    };
    let (bare, _) = decode_gid(gid);
    if bare == 0 {
        return Ok(());
    }

    let (_, tileset, local_id) = registry.lookup(bare)?;
    if let Some(meta) = tileset.tile_meta(local_id) {
        for (key, value) in &meta.properties {
            if !object.properties.contains_key(key) {
                object.properties.insert(key.clone(), value.clone());
            }
        }
    }

    // Tile objects author their origin at the bottom-left corner; shift it
    // to match every other object kind.
    if invert_y {
        object.y -= object.height;
    }
    Ok(())
}

fn build_animations(
    registry: &TilesetRegistry,
    referenced: &mut HashSet<AtlasKey>,
    load_all: bool,
) -> HashMap<u32, Vec<AnimationFrame>> {
    let mut animations = HashMap::new();

    let mut add = |index: usize,
                   tileset: &Tileset,
                   local_id: u32,
                   frames: &[AnimationFrame],
                   referenced: &mut HashSet<AtlasKey>| {
        animations.insert(tileset.firstgid + local_id, frames.to_vec());
        for frame in frames {
            referenced.insert(AtlasKey {
                tileset: index,
                local_id: frame.local_id,
                flags: TileFlags::default(),
            });
        }
    };

    if load_all {
        for (index, tileset) in registry.iter().enumerate() {
            for (local_id, meta) in tileset.tiles_with_meta() {
                if !meta.frames.is_empty() {
                    add(index, tileset, local_id, &meta.frames, referenced);
                }
            }
        }
    } else {
        let used: Vec<AtlasKey> = referenced.iter().copied().collect();
        for key in used {
            let Some(tileset) = registry.get(key.tileset) else {
                continue;
            };
            if let Some(meta) = tileset.tile_meta(key.local_id) {
                if !meta.frames.is_empty() {
                    add(key.tileset, tileset, key.local_id, &meta.frames, referenced);
                }
            }
        }
    }

    animations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::NullBackend;

    const EMPTY_MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" renderorder="right-down" width="4" height="4" tilewidth="16" tileheight="16">
  <tileset firstgid="1" name="tiles" tilewidth="16" tileheight="16" tilecount="4" columns="2">
    <image source="tiles.png" width="32" height="32"/>
  </tileset>
  <layer id="1" name="ground" width="4" height="4">
    <data encoding="csv">0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0</data>
  </layer>
</map>"#;

    fn load(xml: &str) -> Map<NullBackend> {
        Map::from_xml_str(xml, Path::new("."), &mut NullBackend, LoadOptions::default())
            .expect("load map")
    }

    #[test]
    fn all_zero_grid_reports_no_tiles() {
        let map = load(EMPTY_MAP);
        assert_eq!((map.width, map.height), (4, 4));
        let layer = map.layer_by_name("ground").expect("layer");
        let tile_layer = layer.as_tile_layer().expect("tile layer");
        assert_eq!(tile_layer.grid.cells().len(), 16);

        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(map.tile_gid(x, y, 0).expect("in bounds"), 0);
                assert!(map.tile_image(x, y, 0).expect("in bounds").is_none());
            }
        }
        assert!(map.atlas().is_empty());
        assert_eq!(map.layer_tiles(0).expect("layer").count(), 0);
    }

    #[test]
    fn map_debug_prints_a_summary() {
        let map = load(EMPTY_MAP);
        let printed = format!("{map:?}");
        assert!(printed.contains("tilesets: 1"));
        assert!(printed.contains("layers: 1"));
    }

    #[test]
    fn out_of_bounds_queries_are_scoped_errors() {
        let map = load(EMPTY_MAP);
        assert!(matches!(
            map.tile_gid(4, 0, 0).unwrap_err(),
            MapError::InvalidCoordinate { x: 4, y: 0, layer: 0 }
        ));
        assert!(matches!(
            map.tile_gid(0, 0, 9).unwrap_err(),
            MapError::LayerNotFound { index: 9 }
        ));
        // The map is still usable after a failed query.
        assert_eq!(map.tile_gid(0, 0, 0).expect("still works"), 0);
    }

    #[test]
    fn unknown_cell_gid_fails_the_load() {
        let xml = EMPTY_MAP.replace(
            "0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0",
            "0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,99",
        );
        let err = Map::from_xml_str(&xml, Path::new("."), &mut NullBackend, LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, MapError::UnknownTileset { gid: 99 }));
    }

    #[test]
    fn infinite_maps_are_rejected() {
        let xml = EMPTY_MAP.replace("tileheight=\"16\">", "tileheight=\"16\" infinite=\"1\">");
        let err = Map::from_xml_str(&xml, Path::new("."), &mut NullBackend, LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, MapError::Schema { .. }));
    }

    #[test]
    fn group_layers_flatten_in_document_order() {
        let xml = r#"<map version="1.10" width="1" height="1" tilewidth="8" tileheight="8">
  <group name="world">
    <layer name="below" width="1" height="1"><data encoding="csv">0</data></layer>
    <group name="inner" visible="0">
      <layer name="hidden" width="1" height="1"><data encoding="csv">0</data></layer>
    </group>
  </group>
  <objectgroup name="things"/>
</map>"#;
        let map = load(xml);
        let names: Vec<_> = map.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["below", "hidden", "things"]);
        // Group visibility propagates into flattened layers.
        assert!(map.layers()[0].visible);
        assert!(!map.layers()[1].visible);
        assert_eq!(map.layer_by_name("hidden").map(|l| l.index), Some(1));
    }
}
