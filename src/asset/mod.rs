//! Raster asset decoding.
//!
//! Decoders turn an image file into a [`DecodedAsset`]: dimensions, the
//! normalized number of palette colors and the pixels themselves. Both
//! formats share the same dimension contract: width and height must be
//! non-zero multiples of 8 (whole hardware tiles).

pub mod bmp;
pub mod png;
pub mod quantize;

use std::io;
use std::path::Path;

use thiserror::Error;

pub use quantize::Color;

/// Errors produced while decoding an asset.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("failed to read file: {0}")]
    Io(#[from] io::Error),

    #[error("not a BMP file (missing BM signature)")]
    NotBmp,

    #[error("file is truncated")]
    Truncated,

    #[error("color space information not supported")]
    ColorSpaceHeader,

    #[error("invalid header size: {0}")]
    InvalidHeaderSize(u32),

    #[error("invalid width: {0} (must be a non-zero multiple of 8)")]
    InvalidWidth(i64),

    #[error("invalid height: {0} (must be a non-zero multiple of 8)")]
    InvalidHeight(i64),

    #[error("invalid bits per pixel: {0} (only 4 and 8 are supported)")]
    UnsupportedBitDepth(u16),

    #[error("compression not supported: {0}")]
    UnsupportedCompression(u32),

    #[error("too many colors: {0} (max 256)")]
    TooManyColors(usize),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to decode PNG: {0}")]
    Png(#[from] ::png::DecodingError),

    #[error("unsupported graphics file: {0}")]
    UnsupportedFormat(String),
}

/// Supported asset file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetFormat {
    Bmp,
    Png,
}

impl AssetFormat {
    /// Extensions recognized during discovery.
    pub const EXTENSIONS: [&'static str; 2] = ["bmp", "png"];

    /// Format from a file extension. Matching is case-sensitive.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "bmp" => Some(AssetFormat::Bmp),
            "png" => Some(AssetFormat::Png),
            _ => None,
        }
    }
}

/// Decoded pixel storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pixels {
    /// Palette indices in row-major, top-down order.
    Indexed { palette: Vec<Color>, indices: Vec<u8> },
    /// True color pixels in row-major, top-down order.
    Rgba(Vec<Color>),
}

/// A decoded image and its palette metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAsset {
    pub format: AssetFormat,
    pub width: u32,
    pub height: u32,
    /// Number of palette colors, rounded up to a multiple of 16.
    pub colors_count: u32,
    pub pixels: Pixels,
}

impl DecodedAsset {
    /// Color of every pixel in row-major, top-down order.
    pub fn pixel_colors(&self) -> Vec<Color> {
        match &self.pixels {
            Pixels::Indexed { palette, indices } => indices
                .iter()
                .map(|&i| palette.get(i as usize).copied().unwrap_or(Color::BLACK))
                .collect(),
            Pixels::Rgba(colors) => colors.clone(),
        }
    }

    /// Reduce the asset to 16 colors and write it as a 4bpp BMP at `target`.
    ///
    /// Returns the colors count of the written file.
    pub fn quantize(&self, target: &Path) -> Result<u32, DecodeError> {
        quantize::quantize(self, target)
    }
}

/// Decode an asset, dispatching on its extension.
pub fn decode(path: &Path) -> Result<DecodedAsset, DecodeError> {
    match AssetFormat::from_path(path) {
        Some(AssetFormat::Bmp) => bmp::decode_file(path),
        Some(AssetFormat::Png) => png::decode_file(path),
        None => Err(DecodeError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Enforce the whole-tile dimension contract.
pub(crate) fn check_dimensions(width: i64, height: i64) -> Result<(u32, u32), DecodeError> {
    let valid = |side: i64| side > 0 && side % 8 == 0 && side <= u32::MAX as i64;

    if !valid(width) {
        return Err(DecodeError::InvalidWidth(width));
    }
    if !valid(height) {
        return Err(DecodeError::InvalidHeight(height));
    }

    Ok((width as u32, height as u32))
}
