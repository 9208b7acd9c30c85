//! Encoded-payload decoder for tile layer data.
//!
//! Turns the `<data>` element of a tile layer into a flat sequence of raw
//! GIDs. Supported encodings: a plain `<tile>` element sequence, CSV, and
//! base64 with optional gzip or zlib compression. Compressed payloads are
//! inflated before being split into little-endian 4-byte integers.

use std::io::Read;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::{GzDecoder, ZlibDecoder};
use roxmltree::Node;

use crate::error::MapError;
use crate::xml::{child_element, child_elements, parse_attr_or};

/// Decode a `<data>` node into exactly `width * height` raw GIDs.
pub(crate) fn decode_layer_data(
    data: Node<'_, '_>,
    width: u32,
    height: u32,
    layer: &str,
) -> Result<Vec<u32>, MapError> {
    if child_element(data, "chunk").is_some() {
        return Err(MapError::PayloadDecode {
            layer: layer.to_string(),
            message: "chunked (infinite) layer data is not supported".to_string(),
        });
    }

    let compression = data.attribute("compression");
    let gids = match data.attribute("encoding") {
        None => {
            if compression.is_some() {
                return Err(unsupported(layer, "", compression));
            }
            decode_plain(data, layer)?
        }
        Some("csv") => {
            if compression.is_some() {
                return Err(unsupported(layer, "csv", compression));
            }
            decode_csv(data.text().unwrap_or(""), layer)?
        }
        Some("base64") => decode_base64(data.text().unwrap_or(""), compression, layer)?,
        Some(other) => return Err(unsupported(layer, other, compression)),
    };

    let expected = width as usize * height as usize;
    if gids.len() != expected {
        return Err(MapError::PayloadDecode {
            layer: layer.to_string(),
            message: format!(
                "expected {expected} cells ({width}x{height}), decoded {}",
                gids.len()
            ),
        });
    }
    Ok(gids)
}

fn unsupported(layer: &str, encoding: &str, compression: Option<&str>) -> MapError {
    MapError::UnsupportedEncoding {
        layer: layer.to_string(),
        encoding: encoding.to_string(),
        compression: compression.unwrap_or("none").to_string(),
    }
}

fn decode_plain(data: Node<'_, '_>, layer: &str) -> Result<Vec<u32>, MapError> {
    let mut gids = Vec::new();
    for tile in child_elements(data, "tile") {
        let gid = parse_attr_or::<u32>(tile, "gid", 0).map_err(|_| MapError::PayloadDecode {
            layer: layer.to_string(),
            message: format!(
                "invalid gid '{}' in <tile> element",
                tile.attribute("gid").unwrap_or("")
            ),
        })?;
        gids.push(gid);
    }
    Ok(gids)
}

fn decode_csv(text: &str, layer: &str) -> Result<Vec<u32>, MapError> {
    text.split(',')
        .map(|token| {
            token.trim().parse::<u32>().map_err(|_| MapError::PayloadDecode {
                layer: layer.to_string(),
                message: format!("invalid CSV token '{}'", token.trim()),
            })
        })
        .collect()
}

fn decode_base64(text: &str, compression: Option<&str>, layer: &str) -> Result<Vec<u32>, MapError> {
    let decode_err = |message: String| MapError::PayloadDecode {
        layer: layer.to_string(),
        message,
    };

    let raw = BASE64
        .decode(text.trim())
        .map_err(|source| decode_err(format!("malformed base64: {source}")))?;

    let bytes = match compression {
        None => raw,
        Some("zlib") => {
            let mut out = Vec::new();
            ZlibDecoder::new(&raw[..])
                .read_to_end(&mut out)
                .map_err(|source| decode_err(format!("zlib inflate failed: {source}")))?;
            out
        }
        Some("gzip") => {
            let mut out = Vec::new();
            GzDecoder::new(&raw[..])
                .read_to_end(&mut out)
                .map_err(|source| decode_err(format!("gzip inflate failed: {source}")))?;
            out
        }
        Some(other) => return Err(unsupported(layer, "base64", Some(other))),
    };

    if bytes.len() % 4 != 0 {
        return Err(decode_err(format!(
            "payload length {} is not a multiple of 4",
            bytes.len()
        )));
    }

    let mut reader = &bytes[..];
    let mut gids = Vec::with_capacity(bytes.len() / 4);
    while !reader.is_empty() {
        let gid = reader
            .read_u32::<LittleEndian>()
            .map_err(|source| decode_err(format!("truncated payload: {source}")))?;
        gids.push(gid);
    }
    Ok(gids)
}

#[cfg(test)]
mod tests {
    use super::*;

    // All base64 vectors encode the same 4x2 grid:
    // [1, 2, 3, 0, 0x80000001, 0x40000002, 0x20000001, 2]
    const GRID: [u32; 8] = [1, 2, 3, 0, 0x8000_0001, 0x4000_0002, 0x2000_0001, 2];
    const GRID_B64: &str = "AQAAAAIAAAADAAAAAAAAAAEAAIACAABAAQAAIAIAAAA=";
    const GRID_B64_ZLIB: &str = "eJxjZGBgYAJiZgYIYGRgaADyHYC0AkgcAApYAO0=";
    const GRID_B64_GZIP: &str = "H4sIAAAAAAACA2NkYGBgAmJmBghgZGBoAPIdgLQCSBwAGs1sKCAAAAA=";

    fn decode(xml: &str, width: u32, height: u32) -> Result<Vec<u32>, MapError> {
        let doc = roxmltree::Document::parse(xml).expect("parse xml");
        decode_layer_data(doc.root_element(), width, height, "ground")
    }

    #[test]
    fn csv_payload_decodes() {
        let xml = "<data encoding=\"csv\">1,2,3,0,\n4,5,6,7</data>";
        assert_eq!(decode(xml, 4, 2).expect("decode"), vec![1, 2, 3, 0, 4, 5, 6, 7]);
    }

    #[test]
    fn plain_tile_elements_decode() {
        let xml = r#"<data><tile gid="1"/><tile/><tile gid="3"/><tile gid="0"/></data>"#;
        assert_eq!(decode(xml, 2, 2).expect("decode"), vec![1, 0, 3, 0]);
    }

    #[test]
    fn base64_plain_decodes() {
        let xml = format!("<data encoding=\"base64\">{GRID_B64}</data>");
        assert_eq!(decode(&xml, 4, 2).expect("decode"), GRID.to_vec());
    }

    #[test]
    fn base64_zlib_decodes() {
        let xml =
            format!("<data encoding=\"base64\" compression=\"zlib\">{GRID_B64_ZLIB}</data>");
        assert_eq!(decode(&xml, 4, 2).expect("decode"), GRID.to_vec());
    }

    #[test]
    fn base64_gzip_decodes() {
        let xml =
            format!("<data encoding=\"base64\" compression=\"gzip\">{GRID_B64_GZIP}</data>");
        assert_eq!(decode(&xml, 4, 2).expect("decode"), GRID.to_vec());
    }

    #[test]
    fn malformed_base64_fails() {
        let xml = "<data encoding=\"base64\">!!not base64!!</data>";
        match decode(xml, 4, 2).unwrap_err() {
            MapError::PayloadDecode { layer, message } => {
                assert_eq!(layer, "ground");
                assert!(message.contains("base64"));
            }
            other => panic!("expected PayloadDecode, got {other:?}"),
        }
    }

    #[test]
    fn truncated_zlib_stream_fails() {
        // First half of the zlib vector above. The inflater may report the
        // truncation itself or hand back the partial bytes; the partial
        // payload can never satisfy the declared cell count.
        let xml = "<data encoding=\"base64\" compression=\"zlib\">eJxjZGBgYAJiZgYIYGQ=</data>";
        assert!(matches!(
            decode(xml, 4, 2).unwrap_err(),
            MapError::PayloadDecode { .. }
        ));
    }

    #[test]
    fn length_not_multiple_of_four_fails() {
        // Six bytes of payload.
        let xml = "<data encoding=\"base64\">AQAAAAIA</data>";
        match decode(xml, 4, 2).unwrap_err() {
            MapError::PayloadDecode { message, .. } => assert!(message.contains("multiple of 4")),
            other => panic!("expected PayloadDecode, got {other:?}"),
        }
    }

    #[test]
    fn cell_count_mismatch_fails() {
        // zlib payload holding three gids, declared as a 2x2 layer.
        let xml =
            "<data encoding=\"base64\" compression=\"zlib\">eJxjZGBgYAJiZiAGAAA0AAc=</data>";
        match decode(xml, 2, 2).unwrap_err() {
            MapError::PayloadDecode { message, .. } => {
                assert!(message.contains("expected 4 cells"));
            }
            other => panic!("expected PayloadDecode, got {other:?}"),
        }
    }

    #[test]
    fn unknown_compression_fails() {
        let xml = "<data encoding=\"base64\" compression=\"zstd\">AAAA</data>";
        match decode(xml, 1, 1).unwrap_err() {
            MapError::UnsupportedEncoding { encoding, compression, .. } => {
                assert_eq!(encoding, "base64");
                assert_eq!(compression, "zstd");
            }
            other => panic!("expected UnsupportedEncoding, got {other:?}"),
        }
    }

    #[test]
    fn unknown_encoding_fails() {
        let xml = "<data encoding=\"hex\">00</data>";
        assert!(matches!(
            decode(xml, 1, 1).unwrap_err(),
            MapError::UnsupportedEncoding { .. }
        ));
    }

    #[test]
    fn chunked_data_is_rejected() {
        let xml = r#"<data encoding="csv"><chunk x="0" y="0" width="16" height="16">0</chunk></data>"#;
        match decode(xml, 16, 16).unwrap_err() {
            MapError::PayloadDecode { message, .. } => assert!(message.contains("infinite")),
            other => panic!("expected PayloadDecode, got {other:?}"),
        }
    }
}
