//! Tmxmap: a decoder for Tiled TMX tile maps.
//!
//! Tmxmap parses a .tmx document (plus any external .tsx tilesets it
//! references) into a typed, queryable [`Map`]: tile layers as dense GID
//! grids, object groups with absolute-coordinate geometry, tilesets with
//! per-tile metadata, and a per-map atlas of sliced tile images. Image
//! decoding is delegated to an [`ImageBackend`] so the crate works with any
//! rendering stack; [`NullBackend`] loads maps without touching pixels.
//!
//! # Modules
//!
//! - [`map`]: Document assembly and the [`Map`] query API
//! - [`layer`]: Tile layers, object groups, and image layers
//! - [`tileset`]: Tilesets, per-tile metadata, and GID-range lookup
//! - [`object`]: Map objects and their geometry transforms
//! - [`atlas`]: Tile image slicing and the atlas cache
//! - [`gid`]: The GID codec (orientation flag bits)
//! - [`properties`]: Custom property bags and reserved-name policy
//! - [`error`]: Error types for map loading and queries
//!
//! # Example
//!
//! ```no_run
//! use tmxmap::{LoadOptions, Map, NullBackend};
//!
//! # fn main() -> Result<(), tmxmap::MapError> {
//! let mut backend = NullBackend;
//! let map = Map::load("level.tmx", &mut backend, LoadOptions::default())?;
//! for (x, y, tile) in map.layer_tiles(0)? {
//!     println!("({x}, {y}) -> {tile:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod atlas;
pub mod error;
pub mod gid;
pub mod layer;
pub mod map;
pub mod object;
pub mod properties;
pub mod tileset;

mod data;
mod xml;

pub use atlas::{AtlasKey, ImageBackend, ImageRequest, NullBackend, SourceRect, TileAtlas, TileRef, TileTransform};
pub use error::MapError;
pub use gid::{decode_gid, encode_gid, TileFlags};
pub use layer::{DrawOrder, ImageLayer, Layer, LayerKind, ObjectGroup, TileCellGrid, TileLayer};
pub use map::{LoadOptions, Map, Orientation};
pub use object::{ObjectShape, Point, TiledObject};
pub use properties::{ElementKind, PropertyBag, PropertyValue};
pub use tileset::{AnimationFrame, TileMeta, Tileset, TilesetImage, TilesetRegistry};
