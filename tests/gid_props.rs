use proptest::prelude::*;
use tmxmap::{decode_gid, encode_gid, TileFlags};

proptest! {
    #[test]
    fn encode_inverts_decode(raw in any::<u32>()) {
        let (bare, flags) = decode_gid(raw);
        prop_assert_eq!(encode_gid(bare, flags), raw);
    }

    #[test]
    fn bare_gid_carries_no_flag_bits(raw in any::<u32>()) {
        let (bare, _) = decode_gid(raw);
        prop_assert_eq!(bare & 0xE000_0000, 0);
    }

    #[test]
    fn flagless_gids_decode_to_identity(bare in 0u32..0x2000_0000) {
        let (decoded, flags) = decode_gid(bare);
        prop_assert_eq!(decoded, bare);
        prop_assert!(flags.is_identity());
    }

    #[test]
    fn encode_sets_exactly_the_requested_bits(
        bare in 0u32..0x2000_0000,
        h in any::<bool>(),
        v in any::<bool>(),
        d in any::<bool>(),
    ) {
        let flags = TileFlags {
            flipped_horizontally: h,
            flipped_vertically: v,
            flipped_diagonally: d,
        };
        let raw = encode_gid(bare, flags);
        let (back, back_flags) = decode_gid(raw);
        prop_assert_eq!(back, bare);
        prop_assert_eq!(back_flags, flags);
    }
}
