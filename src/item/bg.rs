//! Background items: regular, fixed (one screen) and affine.

use std::str::FromStr;

use super::compression::{resolve_field, CompressionSetting, CompressionSettings, Field};
use super::descriptor::Descriptor;
use super::error::SpecValidationError;
use super::palette::{resolve_palette_reference, PaletteReference};
use super::{Bpp, ItemInput, ItemKind, ItemSpec, ItemType};
use crate::asset::DecodedAsset;
use crate::error::CompileError;

/// Map layout of a background, in 8x8 tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BgLayout {
    pub columns: u32,
    pub rows: u32,
    pub repeated_tiles_reduction: bool,
    /// Always false for affine backgrounds, whose map cells cannot flip.
    pub flipped_tiles_reduction: bool,
}

/// Requested pixel depth of a regular or fixed background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BgBppMode {
    Bpp8,
    Bpp4,
    /// 4bpp with palette banks arranged by hand in the source image.
    Bpp4Manual,
    /// 4bpp after quantizing the source image down to 16 colors.
    Bpp4Auto,
}

impl FromStr for BgBppMode {
    type Err = SpecValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bpp_8" => Ok(BgBppMode::Bpp8),
            "bpp_4" => Ok(BgBppMode::Bpp4),
            "bpp_4_manual" => Ok(BgBppMode::Bpp4Manual),
            "bpp_4_auto" => Ok(BgBppMode::Bpp4Auto),
            other => Err(SpecValidationError::new("bpp_mode", format!("Invalid BPP mode: {}", other))),
        }
    }
}

fn invalid_side(side: &str, label: &str, rule: &str, value: u32) -> SpecValidationError {
    SpecValidationError::new(side, format!("{} BGs {} must be {}: {}", label, side, rule, value))
}

/// Check the asset dimensions a background type supports.
pub fn check_bg_dimensions(item_type: ItemType, width: u32, height: u32) -> Result<(), SpecValidationError> {
    match item_type {
        ItemType::RegularBg => {
            for (side, value) in [("width", width), ("height", height)] {
                if value == 0 || value % 256 != 0 {
                    return Err(invalid_side(side, "Regular", "divisible by 256", value));
                }
            }
        }
        ItemType::FixedBg => {
            if width != 240 {
                return Err(invalid_side("width", "Fixed", "240", width));
            }
            if height != 160 {
                return Err(invalid_side("height", "Fixed", "160", height));
            }
        }
        ItemType::AffineBg => {
            for (side, value) in [("width", width), ("height", height)] {
                if value != 128 && (value == 0 || value % 256 != 0) {
                    return Err(invalid_side(side, "Affine", "128 or divisible by 256", value));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Resolve `bpp_mode` for regular and fixed backgrounds.
///
/// The field is only consulted with an external palette or more than 16
/// colors; with an external palette it is required.
pub fn resolve_bpp_mode(
    descriptor: &Descriptor,
    palette: &PaletteReference,
) -> Result<BgBppMode, SpecValidationError> {
    let external = palette.is_external();
    if !external && palette.colors_count() <= 16 {
        return Ok(BgBppMode::Bpp4);
    }

    let mode = match descriptor.get_str("bpp_mode")? {
        Some(mode) => mode.parse()?,
        None if external => {
            return Err(SpecValidationError::new(
                "bpp_mode",
                "bpp_mode field is required when palette_item is set",
            ))
        }
        None => BgBppMode::Bpp8,
    };

    if external && mode == BgBppMode::Bpp4Auto {
        return Err(SpecValidationError::new(
            "bpp_mode",
            "BPP mode not supported with an external palette item: bpp_4_auto",
        ));
    }

    Ok(mode)
}

/// Validate `regular_bg`, `fixed_bg` and `affine_bg` descriptors.
pub(super) fn validate_background(
    item_type: ItemType,
    input: &ItemInput<'_>,
    descriptor: &Descriptor,
    asset: &DecodedAsset,
) -> Result<ItemSpec, CompileError> {
    check_bg_dimensions(item_type, asset.width, asset.height)?;

    let affine = item_type == ItemType::AffineBg;
    let mut palette = resolve_palette_reference(descriptor, asset.colors_count)?;
    let repeated_tiles_reduction = descriptor.get_bool("repeated_tiles_reduction")?.unwrap_or(true);
    let flipped_tiles_reduction =
        !affine && descriptor.get_bool("flipped_tiles_reduction")?.unwrap_or(true);

    let layout = BgLayout {
        columns: asset.width / 8,
        rows: asset.height / 8,
        repeated_tiles_reduction,
        flipped_tiles_reduction,
    };

    let quantized;
    let mut input = *input;
    let bpp = if affine {
        Bpp::Eight
    } else {
        match resolve_bpp_mode(descriptor, &palette)? {
            BgBppMode::Bpp8 => Bpp::Eight,
            BgBppMode::Bpp4 | BgBppMode::Bpp4Manual => Bpp::Four,
            BgBppMode::Bpp4Auto => {
                quantized = input.out_dir.join(format!("{}.bn_quantized.bmp", input.name));
                let colors_count = asset
                    .quantize(&quantized)
                    .map_err(|source| CompileError::Decode { path: quantized.clone(), source })?;
                tracing::debug!(item = input.name, path = %quantized.display(), "quantized to 4bpp");

                input.source = &quantized;
                palette = PaletteReference::Inline { colors_count };
                Bpp::Four
            }
        }
    };

    let compression = CompressionSettings {
        tiles: resolve_field(descriptor, Field::Tiles)?,
        palette: if palette.is_external() {
            CompressionSetting::NONE
        } else {
            resolve_field(descriptor, Field::Palette)?
        },
        map: resolve_field(descriptor, Field::Map)?,
    };

    let kind = match item_type {
        ItemType::AffineBg => ItemKind::AffineBg(layout),
        ItemType::FixedBg => ItemKind::FixedBg(layout),
        _ => ItemKind::RegularBg(layout),
    };

    Ok(input.spec(kind, Some(palette), bpp, compression))
}
