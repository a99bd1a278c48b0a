//! PNG decoding.
//!
//! Indexed files are read with the `png` crate so the embedded palette and
//! the raw indices survive. Everything else goes through `image`.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use image::{ImageFormat, RgbaImage};

use super::{check_dimensions, AssetFormat, Color, DecodeError, DecodedAsset, Pixels};
use crate::item::palette::{normalize_colors_count, MAX_COLORS};

/// Decode a PNG file from disk.
pub fn decode_file(path: &Path) -> Result<DecodedAsset, DecodeError> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

/// Decode PNG bytes.
///
/// The colors count of an indexed file comes from its palette length, even
/// when only some entries are used.
pub fn decode(bytes: &[u8]) -> Result<DecodedAsset, DecodeError> {
    let mut decoder = ::png::Decoder::new(bytes);
    decoder.set_transformations(::png::Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;

    let info = reader.info();
    if info.color_type != ::png::ColorType::Indexed {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8();
        return decode_image(&image);
    }

    let (width, height) = check_dimensions(info.width as i64, info.height as i64)?;
    let palette: Vec<Color> = info
        .palette
        .as_deref()
        .unwrap_or_default()
        .chunks_exact(3)
        .map(|rgb| Color::rgb(rgb[0], rgb[1], rgb[2]))
        .collect();
    if palette.len() > MAX_COLORS as usize {
        return Err(DecodeError::TooManyColors(palette.len()));
    }

    let bits = info.bit_depth as usize;
    let line_size = (width as usize).checked_mul(bits).map(|n| (n + 7) / 8);
    let frame_size = line_size.and_then(|n| n.checked_mul(height as usize)).ok_or(DecodeError::Truncated)?;
    let frame_size = frame_size.max(reader.output_buffer_size());
    let mut frame = Vec::new();
    frame
        .try_reserve_exact(frame_size)
        .map_err(|_| io::Error::from(io::ErrorKind::OutOfMemory))?;
    frame.resize(frame_size, 0);
    let output = reader.next_frame(&mut frame)?;

    let indices = unpack_rows(&frame, output.line_size, width as usize, height as usize, bits);

    Ok(DecodedAsset {
        format: AssetFormat::Png,
        width,
        height,
        colors_count: normalize_colors_count(palette.len().max(1) as u32),
        pixels: Pixels::Indexed { palette, indices },
    })
}

/// Expand packed 1, 2, 4 or 8 bit indices into one byte per pixel.
fn unpack_rows(frame: &[u8], line_size: usize, width: usize, height: usize, bits: usize) -> Vec<u8> {
    let mask = ((1u16 << bits) - 1) as u8;
    let mut indices = Vec::with_capacity(width * height);

    for row in frame.chunks(line_size).take(height) {
        for x in 0..width {
            let bit = x * bits;
            let shift = 8 - bits - bit % 8;
            indices.push((row[bit / 8] >> shift) & mask);
        }
    }

    indices
}

/// Decode an RGBA image. The colors count is the number of distinct colors.
pub fn decode_image(image: &RgbaImage) -> Result<DecodedAsset, DecodeError> {
    let (width, height) = check_dimensions(image.width() as i64, image.height() as i64)?;

    let pixels: Vec<Color> = image.pixels().map(|p| Color::from_rgba(*p)).collect();
    let distinct: HashSet<Color> = pixels.iter().copied().collect();
    if distinct.len() > MAX_COLORS as usize {
        return Err(DecodeError::TooManyColors(distinct.len()));
    }

    Ok(DecodedAsset {
        format: AssetFormat::Png,
        width,
        height,
        colors_count: normalize_colors_count(distinct.len().max(1) as u32),
        pixels: Pixels::Rgba(pixels),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::fs::File;
    use std::io::BufWriter;
    use tempfile::TempDir;

    fn write_indexed_png(path: &Path, width: u32, height: u32, depth: ::png::BitDepth, palette: &[u8], data: &[u8]) {
        let file = BufWriter::new(File::create(path).unwrap());
        let mut encoder = ::png::Encoder::new(file, width, height);
        encoder.set_color(::png::ColorType::Indexed);
        encoder.set_depth(depth);
        encoder.set_palette(palette.to_vec());
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_decode_counts_distinct_colors() {
        let image = RgbaImage::from_fn(16, 8, |x, _| Rgba([(x * 10) as u8, 0, 0, 255]));
        let asset = decode_image(&image).unwrap();
        assert_eq!(asset.colors_count, 16);
        assert_eq!((asset.width, asset.height), (16, 8));

        let image = RgbaImage::from_fn(32, 8, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let asset = decode_image(&image).unwrap();
        assert_eq!(asset.colors_count, 256);
    }

    #[test]
    fn test_too_many_colors() {
        let image = RgbaImage::from_fn(32, 16, |x, y| Rgba([x as u8, y as u8, 7, 255]));
        assert!(matches!(decode_image(&image), Err(DecodeError::TooManyColors(512))));
    }

    #[test]
    fn test_reject_partial_tiles() {
        let image = RgbaImage::new(10, 8);
        assert!(matches!(decode_image(&image), Err(DecodeError::InvalidWidth(10))));
    }

    #[test]
    fn test_decode_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ball.png");
        RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255])).save(&path).unwrap();

        let asset = decode_file(&path).unwrap();
        assert_eq!(asset.colors_count, 16);
        assert_eq!(asset.format, AssetFormat::Png);
        assert!(matches!(asset.pixels, Pixels::Rgba(_)));
    }

    #[test]
    fn test_indexed_keeps_full_palette() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stage.png");
        let palette: Vec<u8> = (0..=255u8).flat_map(|i| [i, 255 - i, i / 2]).collect();
        let indices: Vec<u8> = (0..16 * 8).map(|i| 200 + (i % 11) as u8).collect();
        write_indexed_png(&path, 16, 8, ::png::BitDepth::Eight, &palette, &indices);

        let asset = decode_file(&path).unwrap();
        assert_eq!(asset.colors_count, 256);
        let Pixels::Indexed { palette: decoded_palette, indices: decoded } = asset.pixels else {
            panic!("expected indexed pixels");
        };
        assert_eq!(decoded_palette.len(), 256);
        assert_eq!(decoded_palette[200], Color::rgb(200, 55, 100));
        assert_eq!(decoded, indices);
    }

    #[test]
    fn test_indexed_4bit_rows_are_unpacked() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ball.png");
        let palette: Vec<u8> = (0..20u8).flat_map(|i| [i, i, i]).collect();
        // Two pixels per byte, high nibble first
        let packed: Vec<u8> = (0..8 * 8 / 2).map(|i| (((i % 8) as u8) << 4) | 0x0F).collect();
        write_indexed_png(&path, 8, 8, ::png::BitDepth::Four, &palette, &packed);

        let asset = decode_file(&path).unwrap();
        assert_eq!(asset.colors_count, 32);
        let Pixels::Indexed { indices, .. } = asset.pixels else {
            panic!("expected indexed pixels");
        };
        assert_eq!(indices.len(), 64);
        assert_eq!(&indices[..8], &[0, 15, 1, 15, 2, 15, 3, 15]);
    }

    #[test]
    fn test_unpack_rows_skips_row_padding() {
        // 2 bit depth, 4 pixels per row, rows padded to 2 bytes
        let frame = [0b0001_1011, 0xAA, 0b1110_0100, 0xAA];
        assert_eq!(unpack_rows(&frame, 2, 4, 2, 2), vec![0, 1, 2, 3, 3, 2, 1, 0]);
    }
}
