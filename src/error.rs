use std::path::PathBuf;

use thiserror::Error;

use crate::properties::ElementKind;

/// The main error type for map loading and queries.
///
/// Structural errors raised during a load are fatal: no partial [`Map`]
/// is ever returned. Errors raised by query methods after a successful
/// load are scoped to that call and leave the map intact.
///
/// [`Map`]: crate::Map
#[derive(Debug, Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse XML from {path}: {message}")]
    XmlParse { path: PathBuf, message: String },

    #[error("invalid <{element}> element: {message}")]
    Schema { element: String, message: String },

    #[error("failed to decode data for layer '{layer}': {message}")]
    PayloadDecode { layer: String, message: String },

    #[error("layer '{layer}' uses unsupported encoding '{encoding}' with compression '{compression}'")]
    UnsupportedEncoding {
        layer: String,
        encoding: String,
        compression: String,
    },

    #[error("no tileset contains GID {gid}")]
    UnknownTileset { gid: u32 },

    #[error("tile {local_id} of tileset '{tileset}' lies outside the bounds of its source image")]
    TileOutOfBounds { tileset: String, local_id: u32 },

    #[error("property '{key}' on {kind} '{owner}' shadows a reserved attribute name")]
    ReservedNameConflict {
        kind: ElementKind,
        key: String,
        owner: String,
    },

    #[error("image backend error for {path}: {message}")]
    Image { path: PathBuf, message: String },

    #[error("coordinate ({x}, {y}) is out of bounds for layer {layer}")]
    InvalidCoordinate { x: u32, y: u32, layer: usize },

    #[error("no layer with index {index}")]
    LayerNotFound { index: usize },

    #[error("layer {index} is not a tile layer")]
    NotATileLayer { index: usize },
}
