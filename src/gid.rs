//! GID codec: raw tile id ↔ (bare id, orientation flags).
//!
//! A raw GID as stored in TMX layer data packs a 29-bit tileset-local id
//! together with three high flag bits that jointly encode one of the eight
//! dihedral orientations of a tile image.

/// Raw GID bit for a horizontally flipped tile.
pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;

/// Raw GID bit for a vertically flipped tile.
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;

/// Raw GID bit for a diagonally flipped (transposed) tile.
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;

const FLAG_MASK: u32 = FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY | FLIPPED_DIAGONALLY;

/// The three orientation flags carried in the high bits of a raw GID.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileFlags {
    pub flipped_horizontally: bool,
    pub flipped_vertically: bool,
    pub flipped_diagonally: bool,
}

impl TileFlags {
    /// True when no flag bit is set.
    pub fn is_identity(self) -> bool {
        !(self.flipped_horizontally || self.flipped_vertically || self.flipped_diagonally)
    }
}

/// Split a raw GID into its bare id and orientation flags.
pub fn decode_gid(raw: u32) -> (u32, TileFlags) {
    let flags = TileFlags {
        flipped_horizontally: raw & FLIPPED_HORIZONTALLY != 0,
        flipped_vertically: raw & FLIPPED_VERTICALLY != 0,
        flipped_diagonally: raw & FLIPPED_DIAGONALLY != 0,
    };
    (raw & !FLAG_MASK, flags)
}

/// Rebuild a raw GID from a bare id and orientation flags.
///
/// Exact inverse of [`decode_gid`]; used when constructing derived GIDs
/// for tile-reference objects.
pub fn encode_gid(bare: u32, flags: TileFlags) -> u32 {
    let mut raw = bare & !FLAG_MASK;
    if flags.flipped_horizontally {
        raw |= FLIPPED_HORIZONTALLY;
    }
    if flags.flipped_vertically {
        raw |= FLIPPED_VERTICALLY;
    }
    if flags.flipped_diagonally {
        raw |= FLIPPED_DIAGONALLY;
    }
    raw
}
