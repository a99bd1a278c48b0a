//! Color quantization using the median cut algorithm.
//!
//! Used to fold true color or 8bpp backgrounds down to a single 16 color
//! palette. Palette index 0 is the backdrop (transparent) color on the
//! target hardware, so it is carried over from the source untouched.

use std::collections::HashMap;
use std::path::Path;

use image::Rgba;

use super::{bmp, DecodeError, DecodedAsset, Pixels};
use crate::item::palette::normalize_colors_count;

/// Palette size of a quantized asset.
pub const QUANTIZED_COLORS: usize = 16;

/// A color represented as RGBA values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn from_rgba(rgba: Rgba<u8>) -> Self {
        Self { r: rgba[0], g: rgba[1], b: rgba[2], a: rgba[3] }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    fn distance_sq(&self, other: &Color) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Red,
    Green,
    Blue,
}

/// A box of colors with their pixel counts.
#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<(Color, u32)>,
}

impl ColorBox {
    fn widest_channel(&self) -> Channel {
        let range = |channel: fn(&Color) -> u8| {
            let (min, max) = self
                .colors
                .iter()
                .map(|(c, _)| channel(c))
                .fold((u8::MAX, u8::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
            max.saturating_sub(min)
        };

        let (r, g, b) = (range(|c| c.r), range(|c| c.g), range(|c| c.b));
        if r >= g && r >= b {
            Channel::Red
        } else if g >= b {
            Channel::Green
        } else {
            Channel::Blue
        }
    }

    /// Split along the widest channel at the pixel-weighted median.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let channel = self.widest_channel();
        self.colors.sort_by_key(|(c, _)| match channel {
            Channel::Red => (c.r, c.g, c.b),
            Channel::Green => (c.g, c.r, c.b),
            Channel::Blue => (c.b, c.r, c.g),
        });

        let total = self.pixel_count();
        let mut running = 0u64;
        let mut split_idx = self.colors.len() / 2;
        for (i, (_, count)) in self.colors.iter().enumerate() {
            running += *count as u64;
            if running * 2 >= total {
                split_idx = i + 1;
                break;
            }
        }
        split_idx = split_idx.clamp(1, self.colors.len() - 1);

        let right = self.colors.split_off(split_idx);
        (self, ColorBox { colors: right })
    }

    fn average_color(&self) -> Color {
        let total = self.pixel_count().max(1);
        let channel_avg = |channel: fn(&Color) -> u8| {
            let sum: u64 = self.colors.iter().map(|(c, n)| channel(c) as u64 * *n as u64).sum();
            (sum / total) as u8
        };

        Color { r: channel_avg(|c| c.r), g: channel_avg(|c| c.g), b: channel_avg(|c| c.b), a: 255 }
    }

    fn pixel_count(&self) -> u64 {
        self.colors.iter().map(|(_, n)| *n as u64).sum()
    }
}

/// Reduce a color histogram to at most `max_colors` representative colors.
pub(crate) fn median_cut(histogram: HashMap<Color, u32>, max_colors: usize) -> Vec<Color> {
    let mut colors: Vec<(Color, u32)> = histogram.into_iter().collect();
    colors.sort();

    if colors.len() <= max_colors {
        return colors.into_iter().map(|(c, _)| c).collect();
    }

    let mut boxes = vec![ColorBox { colors }];
    while boxes.len() < max_colors {
        let Some(idx) = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.colors.len() > 1)
            .max_by_key(|(_, b)| b.pixel_count())
            .map(|(i, _)| i)
        else {
            break;
        };

        let (left, right) = boxes.remove(idx).split();
        boxes.push(left);
        boxes.push(right);
    }

    boxes.iter().map(ColorBox::average_color).collect()
}

/// Backdrop color of an asset: palette entry 0, or the first transparent pixel.
fn backdrop_color(asset: &DecodedAsset, pixels: &[Color]) -> Color {
    match &asset.pixels {
        Pixels::Indexed { palette, .. } => palette.first().copied().unwrap_or(Color::BLACK),
        Pixels::Rgba(_) => pixels
            .iter()
            .find(|c| c.is_transparent())
            .or_else(|| pixels.first())
            .copied()
            .unwrap_or(Color::BLACK),
    }
}

/// Quantize `asset` to 16 colors and write a 4bpp BMP to `target`.
pub fn quantize(asset: &DecodedAsset, target: &Path) -> Result<u32, DecodeError> {
    let pixels = asset.pixel_colors();
    let backdrop = backdrop_color(asset, &pixels);

    let mut histogram: HashMap<Color, u32> = HashMap::new();
    for color in pixels.iter().filter(|c| **c != backdrop) {
        *histogram.entry(*color).or_insert(0) += 1;
    }

    let mut palette = vec![backdrop];
    palette.extend(median_cut(histogram, QUANTIZED_COLORS - 1));

    let indices: Vec<u8> = pixels
        .iter()
        .map(|color| {
            if *color == backdrop {
                return 0;
            }
            palette
                .iter()
                .enumerate()
                .skip(1)
                .min_by_key(|(_, candidate)| candidate.distance_sq(color))
                .map(|(i, _)| i as u8)
                .unwrap_or(0)
        })
        .collect();

    bmp::write_indexed(target, asset.width, asset.height, 4, &palette, &indices)?;

    Ok(normalize_colors_count(palette.len() as u32))
}
