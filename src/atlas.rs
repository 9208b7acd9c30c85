//! Tile image slicing and the per-map atlas cache.
//!
//! The atlas maps `(tileset index, local id, orientation flags)` to a tile
//! image handle produced by an [`ImageBackend`]. It computes the source
//! rectangle inside the tileset sheet and the dihedral transform to apply;
//! actual pixel work (decoding, slicing, transparency) belongs to the
//! backend. Cache population is idempotent and append-only.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::MapError;
use crate::gid::TileFlags;
use crate::tileset::{tiles_per_row, Tileset, TilesetImage, TilesetRegistry};

/// A rectangle inside a tileset source image, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One of the eight dihedral orientations of a tile image.
///
/// Rotations are clockwise. `Transpose` mirrors across the main diagonal
/// (the raw diagonal-flip bit); `AntiTranspose` mirrors across the other
/// diagonal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileTransform {
    Identity,
    FlipHorizontal,
    FlipVertical,
    Rotate90,
    Rotate180,
    Rotate270,
    Transpose,
    AntiTranspose,
}

impl TileTransform {
    /// Map orientation flags to the transform they jointly encode.
    ///
    /// The diagonal flip is a transpose applied first; the horizontal and
    /// vertical flips are applied after it.
    pub fn from_flags(flags: TileFlags) -> TileTransform {
        let TileFlags {
            flipped_horizontally: h,
            flipped_vertically: v,
            flipped_diagonally: d,
        } = flags;
        match (h, v, d) {
            (false, false, false) => TileTransform::Identity,
            (true, false, false) => TileTransform::FlipHorizontal,
            (false, true, false) => TileTransform::FlipVertical,
            (true, true, false) => TileTransform::Rotate180,
            (false, false, true) => TileTransform::Transpose,
            (true, false, true) => TileTransform::Rotate90,
            (false, true, true) => TileTransform::Rotate270,
            (true, true, true) => TileTransform::AntiTranspose,
        }
    }
}

/// What the backend needs to open a source image.
#[derive(Clone, Debug)]
pub struct ImageRequest<'a> {
    pub path: &'a Path,
    /// Colorkey transparency, without a leading '#'.
    pub colorkey: Option<&'a str>,
    /// Whether per-pixel alpha should be preserved.
    pub pixel_alpha: bool,
}

/// External collaborator that decodes images and slices tiles.
///
/// `open` loads a source image once; `slice` cuts a tile out of it (or
/// clones the whole image when `rect` is `None`) with the given transform
/// and transparency already finalized. Implementations decide what a
/// handle is: a texture id, a surface, or just a description.
pub trait ImageBackend {
    type Source;
    type Handle: Clone;

    fn open(&mut self, request: &ImageRequest<'_>) -> Result<Self::Source, MapError>;

    fn slice(
        &mut self,
        source: &Self::Source,
        rect: Option<SourceRect>,
        transform: TileTransform,
    ) -> Result<Self::Handle, MapError>;
}

/// Handle type of [`NullBackend`]: records what would have been sliced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileRef {
    pub path: PathBuf,
    pub rect: Option<SourceRect>,
    pub transform: TileTransform,
}

/// Backend that never touches pixels.
///
/// Suitable for loading a map without its images: every handle is a
/// [`TileRef`] describing the slice a real backend would perform.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBackend;

impl ImageBackend for NullBackend {
    type Source = PathBuf;
    type Handle = TileRef;

    fn open(&mut self, request: &ImageRequest<'_>) -> Result<Self::Source, MapError> {
        Ok(request.path.to_path_buf())
    }

    fn slice(
        &mut self,
        source: &Self::Source,
        rect: Option<SourceRect>,
        transform: TileTransform,
    ) -> Result<Self::Handle, MapError> {
        Ok(TileRef {
            path: source.clone(),
            rect,
            transform,
        })
    }
}

/// Source rectangle for a local tile id inside a tileset sheet.
///
/// Returns `None` when the rect would exceed the image bounds or the sheet
/// cannot hold a single tile.
pub(crate) fn tile_source_rect(
    image: &TilesetImage,
    tileset: &Tileset,
    local_id: u32,
) -> Option<SourceRect> {
    let per_row = tiles_per_row(image.width, tileset.tile_width, tileset.margin, tileset.spacing);
    if per_row == 0 {
        return None;
    }

    let x = tileset.margin + (local_id % per_row) * (tileset.tile_width + tileset.spacing);
    let y = tileset.margin + (local_id / per_row) * (tileset.tile_height + tileset.spacing);
    if x + tileset.tile_width > image.width || y + tileset.tile_height > image.height {
        return None;
    }
    Some(SourceRect {
        x,
        y,
        width: tileset.tile_width,
        height: tileset.tile_height,
    })
}

/// Cache key: a tile of a tileset in a specific orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtlasKey {
    pub tileset: usize,
    pub local_id: u32,
    pub flags: TileFlags,
}

/// The per-map tile image cache.
///
/// Owned by the map and passed a backend explicitly; there is no global
/// state. Identical keys never re-slice.
pub struct TileAtlas<B: ImageBackend> {
    sources: Vec<Option<B::Source>>,
    handles: HashMap<AtlasKey, B::Handle>,
}

impl<B: ImageBackend> TileAtlas<B> {
    pub(crate) fn new(tileset_count: usize) -> Self {
        let mut sources = Vec::with_capacity(tileset_count);
        sources.resize_with(tileset_count, || None);
        TileAtlas {
            sources,
            handles: HashMap::new(),
        }
    }

    /// Cached handle for a key, if it has been sliced.
    pub fn get(&self, key: &AtlasKey) -> Option<&B::Handle> {
        self.handles.get(key)
    }

    /// Number of cached tile handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Slice the tile for `key`, reusing the cache when possible.
    pub(crate) fn resolve(
        &mut self,
        backend: &mut B,
        registry: &TilesetRegistry,
        base_dir: &Path,
        key: AtlasKey,
        pixel_alpha: bool,
    ) -> Result<&B::Handle, MapError> {
        match self.handles.entry(key) {
            Entry::Occupied(occupied) => Ok(occupied.into_mut()),
            Entry::Vacant(vacant) => {
                let tileset = registry.get(key.tileset).ok_or(MapError::TileOutOfBounds {
                    tileset: format!("#{}", key.tileset),
                    local_id: key.local_id,
                })?;
                let transform = TileTransform::from_flags(key.flags);

                // A tile-specific image replaces the sheet rect entirely.
                let per_tile_image = tileset
                    .tile_meta(key.local_id)
                    .and_then(|meta| meta.image.as_ref());

                let handle = if let Some(image) = per_tile_image {
                    let source = backend.open(&ImageRequest {
                        path: &base_dir.join(&image.source),
                        colorkey: image.colorkey.as_deref(),
                        pixel_alpha,
                    })?;
                    backend.slice(&source, None, transform)?
                } else {
                    let image = tileset.image.as_ref().ok_or_else(|| MapError::Image {
                        path: base_dir.to_path_buf(),
                        message: format!("tileset '{}' has no source image", tileset.name),
                    })?;
                    let rect = tile_source_rect(image, tileset, key.local_id).ok_or_else(|| {
                        MapError::TileOutOfBounds {
                            tileset: tileset.name.clone(),
                            local_id: key.local_id,
                        }
                    })?;

                    let slot = &mut self.sources[key.tileset];
                    if slot.is_none() {
                        *slot = Some(backend.open(&ImageRequest {
                            path: &base_dir.join(&image.source),
                            colorkey: image.colorkey.as_deref(),
                            pixel_alpha,
                        })?);
                    }
                    let source = slot.as_ref().ok_or_else(|| MapError::Image {
                        path: base_dir.join(&image.source),
                        message: "tileset source image unavailable".to_string(),
                    })?;
                    backend.slice(source, Some(rect), transform)?
                };

                Ok(vacant.insert(handle))
            }
        }
    }
}
