//! Sprite geometry.
//!
//! Hardware sprites come in twelve shape/size combinations. Every sprite
//! (and sprite tile set) must map to one of them.

use std::fmt;

use super::compression::{resolve_field, CompressionSetting, CompressionSettings, Field};
use super::descriptor::Descriptor;
use super::error::SpecValidationError;
use super::{Bpp, ItemInput, ItemKind, ItemSpec, PaletteReference};
use crate::asset::DecodedAsset;

/// Human readable list of the valid `width x height` pairs.
pub const VALID_SPRITE_SIZES: &str =
    "8x8, 16x16, 32x32, 64x64, 16x8, 32x8, 32x16, 64x32, 8x16, 8x32, 16x32, 32x64";

const SIDES: [u32; 4] = [8, 16, 32, 64];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteShape {
    Square,
    Wide,
    Tall,
}

impl SpriteShape {
    pub fn as_str(self) -> &'static str {
        match self {
            SpriteShape::Square => "SQUARE",
            SpriteShape::Wide => "WIDE",
            SpriteShape::Tall => "TALL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteSize {
    Small,
    Normal,
    Big,
    Huge,
}

impl SpriteSize {
    pub fn as_str(self) -> &'static str {
        match self {
            SpriteSize::Small => "SMALL",
            SpriteSize::Normal => "NORMAL",
            SpriteSize::Big => "BIG",
            SpriteSize::Huge => "HUGE",
        }
    }
}

/// Shape and size pair selected from sprite dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteShapeSize {
    pub shape: SpriteShape,
    pub size: SpriteSize,
}

impl SpriteShapeSize {
    /// `sprite_shape_size(...)` constructor expression.
    pub fn declaration(&self) -> String {
        format!(
            "sprite_shape_size(sprite_shape::{}, sprite_size::{})",
            self.shape.as_str(),
            self.size.as_str()
        )
    }
}

impl fmt::Display for SpriteShapeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.shape.as_str(), self.size.as_str())
    }
}

/// Map sprite dimensions to their shape and size.
pub fn shape_size(width: u32, height: u32) -> Result<SpriteShapeSize, SpecValidationError> {
    use SpriteShape::*;
    use SpriteSize::*;

    if !SIDES.contains(&width) {
        return Err(SpecValidationError::new(
            "width",
            format!("Invalid sprite width: {} (valid sprite sizes: {})", width, VALID_SPRITE_SIZES),
        ));
    }
    if !SIDES.contains(&height) {
        return Err(SpecValidationError::new(
            "height",
            format!("Invalid sprite height: {} (valid sprite sizes: {})", height, VALID_SPRITE_SIZES),
        ));
    }

    let (shape, size) = match (width, height) {
        (8, 8) => (Square, Small),
        (16, 16) => (Square, Normal),
        (32, 32) => (Square, Big),
        (64, 64) => (Square, Huge),
        (16, 8) => (Wide, Small),
        (32, 8) => (Wide, Normal),
        (32, 16) => (Wide, Big),
        (64, 32) => (Wide, Huge),
        (8, 16) => (Tall, Small),
        (8, 32) => (Tall, Normal),
        (16, 32) => (Tall, Big),
        (32, 64) => (Tall, Huge),
        _ => {
            return Err(SpecValidationError::new(
                "size",
                format!(
                    "Invalid sprite size: ({}x{}) (valid sprite sizes: {})",
                    width, height, VALID_SPRITE_SIZES
                ),
            ))
        }
    };

    Ok(SpriteShapeSize { shape, size })
}

/// Check that an asset side splits into whole item frames.
fn check_frame_side(field: &str, asset_side: u32, item_side: u32) -> Result<(), SpecValidationError> {
    if item_side == 0 {
        return Err(SpecValidationError::new(field, "must be greater than zero"));
    }
    if asset_side % item_side != 0 {
        return Err(SpecValidationError::new(
            field,
            format!("File {} is not divisible by item {}: {} - {}", field, field, asset_side, item_side),
        ));
    }
    Ok(())
}

/// `sprite`: frames laid out in a grid of `width x height` cells.
pub(super) fn validate_sprite(
    input: &ItemInput<'_>,
    descriptor: &Descriptor,
    asset: &DecodedAsset,
) -> Result<ItemSpec, SpecValidationError> {
    let height = descriptor.require_u32("height")?;
    let width = descriptor.get_u32("width")?.unwrap_or(height);

    check_frame_side("width", asset.width, width)?;
    check_frame_side("height", asset.height, height)?;
    let shape_size = shape_size(width, height)?;
    let frames = (asset.height / height) * (asset.width / width);

    let colors_count = asset.colors_count;
    let compression = CompressionSettings {
        tiles: resolve_field(descriptor, Field::Tiles)?,
        palette: resolve_field(descriptor, Field::Palette)?,
        map: CompressionSetting::NONE,
    };

    Ok(input.spec(
        ItemKind::Sprite { shape_size, frames },
        Some(PaletteReference::Inline { colors_count }),
        Bpp::from_colors_count(colors_count),
        compression,
    ))
}

/// `sprite_tiles`: a vertical strip of frames as wide as the asset, no palette.
pub(super) fn validate_sprite_tiles(
    input: &ItemInput<'_>,
    descriptor: &Descriptor,
    asset: &DecodedAsset,
) -> Result<ItemSpec, SpecValidationError> {
    let height = descriptor.require_u32("height")?;

    check_frame_side("height", asset.height, height)?;
    let shape_size = shape_size(asset.width, height)?;
    let frames = asset.height / height;

    let compression = CompressionSettings {
        tiles: resolve_field(descriptor, Field::Tiles)?,
        ..CompressionSettings::NONE
    };

    Ok(input.spec(
        ItemKind::SpriteTiles { shape_size, frames },
        None,
        Bpp::from_colors_count(asset.colors_count),
        compression,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::compression::Compression;
    use crate::item::tests::asset;
    use std::path::Path;

    fn input() -> ItemInput<'static> {
        ItemInput { name: "hero", source: Path::new("hero.bmp"), out_dir: Path::new("build") }
    }

    fn descriptor(json: &str) -> Descriptor {
        Descriptor::parse(json).unwrap()
    }

    #[test]
    fn test_single_square_frame() {
        let spec =
            validate_sprite(&input(), &descriptor(r#"{"type": "sprite", "height": 16}"#), &asset(16, 16, 16))
                .unwrap();
        assert_eq!(
            spec.kind,
            ItemKind::Sprite {
                shape_size: SpriteShapeSize { shape: SpriteShape::Square, size: SpriteSize::Normal },
                frames: 1,
            }
        );
        assert_eq!(spec.bpp, Bpp::Four);
        assert_eq!(spec.palette, Some(PaletteReference::Inline { colors_count: 16 }));
    }

    #[test]
    fn test_narrow_frames() {
        let spec = validate_sprite(
            &input(),
            &descriptor(r#"{"type": "sprite", "height": 16, "width": 8}"#),
            &asset(16, 16, 16),
        )
        .unwrap();
        assert_eq!(
            spec.kind,
            ItemKind::Sprite {
                shape_size: SpriteShapeSize { shape: SpriteShape::Tall, size: SpriteSize::Small },
                frames: 2,
            }
        );
    }

    #[test]
    fn test_frame_grid() {
        let spec = validate_sprite(
            &input(),
            &descriptor(r#"{"type": "sprite", "height": 8, "width": 8}"#),
            &asset(32, 16, 64),
        )
        .unwrap();
        assert!(matches!(spec.kind, ItemKind::Sprite { frames: 8, .. }));
        assert_eq!(spec.bpp, Bpp::Eight);
    }

    #[test]
    fn test_height_required() {
        let err =
            validate_sprite(&input(), &descriptor(r#"{"type": "sprite"}"#), &asset(16, 16, 16)).unwrap_err();
        assert_eq!(err.field, "height");
    }

    #[test]
    fn test_height_must_divide_asset() {
        let err = validate_sprite(&input(), &descriptor(r#"{"type": "sprite", "height": 16}"#), &asset(16, 24, 16))
            .unwrap_err();
        assert_eq!(err.field, "height");
        assert!(err.message.contains("not divisible"));
    }

    #[test]
    fn test_zero_height() {
        let err = validate_sprite(&input(), &descriptor(r#"{"type": "sprite", "height": 0}"#), &asset(16, 16, 16))
            .unwrap_err();
        assert_eq!(err.field, "width");
    }

    #[test]
    fn test_sprite_compression_fields() {
        let spec = validate_sprite(
            &input(),
            &descriptor(r#"{"type": "sprite", "height": 16, "compression": "auto", "palette_compression": "lz77"}"#),
            &asset(16, 16, 16),
        )
        .unwrap();
        assert_eq!(spec.compression.tiles, CompressionSetting::Auto);
        assert_eq!(spec.compression.palette, CompressionSetting::Fixed(Compression::Lz77));
        assert_eq!(spec.compression.map, CompressionSetting::NONE);
    }

    #[test]
    fn test_sprite_tiles_uses_asset_width() {
        let spec = validate_sprite_tiles(
            &input(),
            &descriptor(r#"{"type": "sprite_tiles", "height": 32, "compression": "lz77"}"#),
            &asset(32, 128, 16),
        )
        .unwrap();
        assert_eq!(
            spec.kind,
            ItemKind::SpriteTiles {
                shape_size: SpriteShapeSize { shape: SpriteShape::Square, size: SpriteSize::Big },
                frames: 4,
            }
        );
        assert_eq!(spec.palette, None);
        assert_eq!(spec.compression.tiles, CompressionSetting::Fixed(Compression::Lz77));
        assert_eq!(spec.compression.palette, CompressionSetting::NONE);
    }

    #[test]
    fn test_sprite_tiles_invalid_shape() {
        let err = validate_sprite_tiles(
            &input(),
            &descriptor(r#"{"type": "sprite_tiles", "height": 8}"#),
            &asset(128, 8, 16),
        )
        .unwrap_err();
        assert_eq!(err.field, "width");
    }

    #[test]
    fn test_square_sizes() {
        assert_eq!(
            shape_size(16, 16).unwrap(),
            SpriteShapeSize { shape: SpriteShape::Square, size: SpriteSize::Normal }
        );
        assert_eq!(shape_size(64, 64).unwrap().size, SpriteSize::Huge);
    }

    #[test]
    fn test_tall_and_wide() {
        let tall = shape_size(8, 16).unwrap();
        assert_eq!(tall.shape, SpriteShape::Tall);
        assert_eq!(tall.size, SpriteSize::Small);

        let wide = shape_size(64, 32).unwrap();
        assert_eq!(wide.shape, SpriteShape::Wide);
        assert_eq!(wide.size, SpriteSize::Huge);
    }

    #[test]
    fn test_table_covers_exactly_twelve_pairs() {
        let mut valid = 0;
        for w in SIDES {
            for h in SIDES {
                if shape_size(w, h).is_ok() {
                    valid += 1;
                    assert!(VALID_SPRITE_SIZES.contains(&format!("{}x{}", w, h)));
                }
            }
        }
        assert_eq!(valid, 12);
    }

    #[test]
    fn test_invalid_pairs_name_field() {
        assert_eq!(shape_size(64, 8).unwrap_err().field, "size");
        assert_eq!(shape_size(24, 8).unwrap_err().field, "width");
        assert_eq!(shape_size(8, 128).unwrap_err().field, "height");
        assert!(shape_size(8, 64).unwrap_err().message.contains(VALID_SPRITE_SIZES));
    }

    #[test]
    fn test_declaration() {
        let shape = shape_size(32, 16).unwrap();
        assert_eq!(shape.declaration(), "sprite_shape_size(sprite_shape::WIDE, sprite_size::BIG)");
        assert_eq!(shape.to_string(), "WIDE/BIG");
    }
}
