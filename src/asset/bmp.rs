//! Indexed BMP decoding and encoding.
//!
//! Only uncompressed 4bpp and 8bpp files with a plain `BITMAPINFOHEADER`
//! are accepted, which is what the codec consumes.

use std::fs;
use std::io;
use std::path::Path;

use super::{check_dimensions, AssetFormat, Color, DecodeError, DecodedAsset, Pixels};
use crate::item::palette::normalize_colors_count;

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: u32 = 40;
const V4_HEADER_SIZE: u32 = 108;
const V5_HEADER_SIZE: u32 = 124;

fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, DecodeError> {
    bytes
        .get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(DecodeError::Truncated)
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, DecodeError> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(DecodeError::Truncated)
}

fn read_i32(bytes: &[u8], offset: usize) -> Result<i32, DecodeError> {
    read_u32(bytes, offset).map(|v| v as i32)
}

/// Bytes per pixel row, padded to 4 bytes.
fn row_stride(width: u32, bits: u16) -> usize {
    ((width as usize * bits as usize + 31) / 32) * 4
}

/// Decode a BMP file from disk.
pub fn decode_file(path: &Path) -> Result<DecodedAsset, DecodeError> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

/// Decode BMP bytes.
pub fn decode(bytes: &[u8]) -> Result<DecodedAsset, DecodeError> {
    if bytes.get(0..2) != Some(b"BM".as_slice()) {
        return Err(DecodeError::NotBmp);
    }

    let pixels_offset = read_u32(bytes, 10)? as usize;
    let header_size = read_u32(bytes, 14)?;
    match header_size {
        INFO_HEADER_SIZE => {}
        V4_HEADER_SIZE | V5_HEADER_SIZE => return Err(DecodeError::ColorSpaceHeader),
        other => return Err(DecodeError::InvalidHeaderSize(other)),
    }

    let raw_width = read_i32(bytes, 18)?;
    let raw_height = read_i32(bytes, 22)?;
    let (width, height) = check_dimensions(raw_width as i64, (raw_height as i64).abs())?;
    let top_down = raw_height < 0;

    let bits = read_u16(bytes, 28)?;
    if bits != 4 && bits != 8 {
        return Err(DecodeError::UnsupportedBitDepth(bits));
    }

    let compression = read_u32(bytes, 30)?;
    if compression != 0 {
        return Err(DecodeError::UnsupportedCompression(compression));
    }

    let max_entries = 1u32 << bits;
    let used = read_u32(bytes, 46)?;
    let entries = if used == 0 || used > max_entries { max_entries } else { used };

    let palette_start = FILE_HEADER_SIZE + header_size as usize;
    let palette = (0..entries as usize)
        .map(|i| {
            let at = palette_start + i * 4;
            bytes.get(at..at + 3).map(|b| Color::rgb(b[2], b[1], b[0])).ok_or(DecodeError::Truncated)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let stride = row_stride(width, bits);
    let row_bytes = (width as usize * bits as usize) / 8;
    let pixels_end = stride
        .checked_mul(height as usize - 1)
        .and_then(|n| n.checked_add(pixels_offset))
        .and_then(|n| n.checked_add(row_bytes))
        .ok_or(DecodeError::Truncated)?;
    if pixels_end > bytes.len() {
        return Err(DecodeError::Truncated);
    }

    let mut indices = Vec::with_capacity(width as usize * height as usize);

    for y in 0..height as usize {
        let stored_row = if top_down { y } else { height as usize - 1 - y };
        let start = pixels_offset + stored_row * stride;
        let row = bytes.get(start..start + row_bytes).ok_or(DecodeError::Truncated)?;

        if bits == 4 {
            for x in 0..width as usize {
                let byte = row[x / 2];
                indices.push(if x % 2 == 0 { byte >> 4 } else { byte & 0x0F });
            }
        } else {
            indices.extend_from_slice(row);
        }
    }

    let colors_count = if bits == 4 {
        16
    } else {
        let max_index = indices.iter().copied().max().unwrap_or(0) as u32;
        normalize_colors_count(max_index + 1)
    };

    Ok(DecodedAsset {
        format: AssetFormat::Bmp,
        width,
        height,
        colors_count,
        pixels: Pixels::Indexed { palette, indices },
    })
}

/// Encode an indexed image as an uncompressed bottom-up BMP.
///
/// `indices` are row-major and top-down. Missing palette entries are
/// written as black; missing indices as 0.
pub fn encode_indexed(width: u32, height: u32, bits: u16, palette: &[Color], indices: &[u8]) -> Vec<u8> {
    let entries = 1usize << bits;
    let stride = row_stride(width, bits);
    let pixels_offset = FILE_HEADER_SIZE + INFO_HEADER_SIZE as usize + entries * 4;
    let file_size = pixels_offset + stride * height as usize;

    let mut out = Vec::with_capacity(file_size);
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(file_size as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(pixels_offset as u32).to_le_bytes());

    out.extend_from_slice(&INFO_HEADER_SIZE.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&((stride * height as usize) as u32).to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    out.extend_from_slice(&(entries as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    for i in 0..entries {
        let c = palette.get(i).copied().unwrap_or(Color::BLACK);
        out.extend_from_slice(&[c.b, c.g, c.r, 0]);
    }

    let index_at = |x: usize, y: usize| indices.get(y * width as usize + x).copied().unwrap_or(0);
    for y in (0..height as usize).rev() {
        let mut row = vec![0u8; stride];
        for x in 0..width as usize {
            let index = index_at(x, y);
            if bits == 4 {
                let shift = if x % 2 == 0 { 4 } else { 0 };
                row[x / 2] |= (index & 0x0F) << shift;
            } else {
                row[x] = index;
            }
        }
        out.extend_from_slice(&row);
    }

    out
}

/// Write an indexed BMP to disk, creating parent directories as needed.
pub fn write_indexed(
    path: &Path,
    width: u32,
    height: u32,
    bits: u16,
    palette: &[Color],
    indices: &[u8],
) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encode_indexed(width, height, bits, palette, indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette(n: u8) -> Vec<Color> {
        (0..n).map(|i| Color::rgb(i, 255 - i, i / 2)).collect()
    }

    #[test]
    fn test_decode_4bpp() {
        let indices: Vec<u8> = (0..64).map(|i| (i % 16) as u8).collect();
        let bytes = encode_indexed(8, 8, 4, &palette(16), &indices);

        let asset = decode(&bytes).unwrap();
        assert_eq!(asset.format, AssetFormat::Bmp);
        assert_eq!((asset.width, asset.height), (8, 8));
        assert_eq!(asset.colors_count, 16);
        assert_eq!(asset.pixels, Pixels::Indexed { palette: palette(16), indices });
    }

    #[test]
    fn test_decode_8bpp_counts_highest_index() {
        let mut indices = vec![0u8; 16 * 8];
        indices[5] = 20;
        let bytes = encode_indexed(16, 8, 8, &palette(32), &indices);

        let asset = decode(&bytes).unwrap();
        assert_eq!(asset.colors_count, 32);
        let Pixels::Indexed { indices: decoded, .. } = asset.pixels else {
            panic!("expected indexed pixels");
        };
        assert_eq!(decoded, indices);
    }

    #[test]
    fn test_decode_top_down() {
        let indices: Vec<u8> = (0..64).map(|i| (i / 8) as u8).collect();
        let mut bytes = encode_indexed(8, 8, 8, &palette(8), &indices);
        // Flip to a top-down file: negative height, rows reversed
        bytes[22..26].copy_from_slice(&(-8i32).to_le_bytes());
        let offset = read_u32(&bytes, 10).unwrap() as usize;
        let rows: Vec<Vec<u8>> = bytes[offset..].chunks(8).map(|r| r.to_vec()).rev().collect();
        bytes.truncate(offset);
        bytes.extend(rows.concat());

        let asset = decode(&bytes).unwrap();
        let Pixels::Indexed { indices: decoded, .. } = asset.pixels else {
            panic!("expected indexed pixels");
        };
        assert_eq!(decoded, indices);
    }

    #[test]
    fn test_reject_color_space_header() {
        let mut bytes = encode_indexed(8, 8, 4, &palette(16), &[]);
        bytes[14..18].copy_from_slice(&V4_HEADER_SIZE.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(DecodeError::ColorSpaceHeader)));
    }

    #[test]
    fn test_reject_unknown_header_size() {
        let mut bytes = encode_indexed(8, 8, 4, &palette(16), &[]);
        bytes[14..18].copy_from_slice(&12u32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(DecodeError::InvalidHeaderSize(12))));
    }

    #[test]
    fn test_reject_bit_depth() {
        let mut bytes = encode_indexed(8, 8, 8, &palette(16), &[]);
        bytes[28..30].copy_from_slice(&24u16.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(DecodeError::UnsupportedBitDepth(24))));
    }

    #[test]
    fn test_reject_compression() {
        let mut bytes = encode_indexed(8, 8, 8, &palette(16), &[]);
        bytes[30..34].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(DecodeError::UnsupportedCompression(1))));
    }

    #[test]
    fn test_reject_dimensions() {
        let bytes = encode_indexed(12, 8, 8, &palette(16), &[]);
        assert!(matches!(decode(&bytes), Err(DecodeError::InvalidWidth(12))));

        let bytes = encode_indexed(8, 0, 8, &palette(16), &[]);
        assert!(matches!(decode(&bytes), Err(DecodeError::InvalidHeight(0))));
    }

    #[test]
    fn test_reject_truncated_and_foreign() {
        let bytes = encode_indexed(8, 8, 8, &palette(16), &[]);
        assert!(matches!(decode(&bytes[..bytes.len() - 10]), Err(DecodeError::Truncated)));
        assert!(matches!(decode(b"GIF89a"), Err(DecodeError::NotBmp)));
    }

    #[test]
    fn test_huge_dimensions_without_pixel_data() {
        let mut bytes = encode_indexed(8, 8, 8, &palette(255), &[]);
        let offset = read_u32(&bytes, 10).unwrap() as usize;
        bytes.truncate(offset);
        assert_eq!(bytes.len(), 1078);

        bytes[18..22].copy_from_slice(&0x4000_0000i32.to_le_bytes());
        bytes[22..26].copy_from_slice(&0x4000_0000i32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(DecodeError::Truncated)));
    }
}
