//! Palette references and color count normalization.

use super::compression::{resolve_field, CompressionSettings, Field};
use super::descriptor::Descriptor;
use super::error::SpecValidationError;
use super::{Bpp, ItemInput, ItemKind, ItemSpec};
use crate::asset::DecodedAsset;

/// Largest palette the target hardware can address.
pub const MAX_COLORS: u32 = 256;

/// Where an item's palette comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteReference {
    /// Palette emitted alongside the item's tiles.
    Inline { colors_count: u32 },
    /// Palette owned by a separate `bg_palette` item.
    External { name: String },
}

impl PaletteReference {
    /// Colors emitted by this item; external palettes contribute none.
    pub fn colors_count(&self) -> u32 {
        match self {
            PaletteReference::Inline { colors_count } => *colors_count,
            PaletteReference::External { .. } => 0,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, PaletteReference::External { .. })
    }
}

/// Round a color count up to the next multiple of 16.
pub fn normalize_colors_count(colors_count: u32) -> u32 {
    colors_count + (16 - colors_count % 16) % 16
}

/// Explicit `colors_count` field, range checked and normalized.
pub fn explicit_colors_count(descriptor: &Descriptor) -> Result<Option<u32>, SpecValidationError> {
    let Some(colors_count) = descriptor.get_u32("colors_count")? else {
        return Ok(None);
    };

    if colors_count < 1 || colors_count > MAX_COLORS {
        return Err(SpecValidationError::new(
            "colors_count",
            format!("Invalid colors count: {} (must be in [1, {}])", colors_count, MAX_COLORS),
        ));
    }

    Ok(Some(normalize_colors_count(colors_count)))
}

/// Check a `palette_item` identifier: `[a-z][a-z0-9_]*`.
pub fn validate_palette_item_name(name: &str) -> Result<(), SpecValidationError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(SpecValidationError::new("palette_item", "Empty palette item"));
    };

    if !first.is_ascii_lowercase() {
        return Err(SpecValidationError::new(
            "palette_item",
            format!("Invalid palette item: {} (invalid character: '{}')", name, first),
        ));
    }

    if let Some(bad) = chars.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')) {
        return Err(SpecValidationError::new(
            "palette_item",
            format!("Invalid palette item: {} (invalid character: '{}')", name, bad),
        ));
    }

    Ok(())
}

/// Resolve a background's palette: `palette_item` or the asset's own colors.
pub fn resolve_palette_reference(
    descriptor: &Descriptor,
    asset_colors_count: u32,
) -> Result<PaletteReference, SpecValidationError> {
    match descriptor.get_str("palette_item")? {
        Some(name) => {
            validate_palette_item_name(name)?;
            Ok(PaletteReference::External { name: name.to_string() })
        }
        None => Ok(PaletteReference::Inline { colors_count: asset_colors_count }),
    }
}

/// Palette-only items take the palette stream's compression and nothing else.
fn palette_compression(descriptor: &Descriptor) -> Result<CompressionSettings, SpecValidationError> {
    Ok(CompressionSettings {
        palette: resolve_field(descriptor, Field::Palette)?,
        ..CompressionSettings::NONE
    })
}

/// `sprite_palette`: a standalone sprite palette.
pub(super) fn validate_sprite_palette(
    input: &ItemInput<'_>,
    descriptor: &Descriptor,
    asset: &DecodedAsset,
) -> Result<ItemSpec, SpecValidationError> {
    let colors_count = explicit_colors_count(descriptor)?.unwrap_or(asset.colors_count);

    Ok(input.spec(
        ItemKind::SpritePalette,
        Some(PaletteReference::Inline { colors_count }),
        Bpp::from_colors_count(colors_count),
        palette_compression(descriptor)?,
    ))
}

/// `bg_palette`: a standalone background palette, shareable through `palette_item`.
pub(super) fn validate_bg_palette(
    input: &ItemInput<'_>,
    descriptor: &Descriptor,
    asset: &DecodedAsset,
) -> Result<ItemSpec, SpecValidationError> {
    let colors_count = explicit_colors_count(descriptor)?.unwrap_or(asset.colors_count);

    let bpp = match descriptor.get_str("bpp_mode")? {
        None => Bpp::from_colors_count(colors_count),
        Some("bpp_8") => Bpp::Eight,
        Some("bpp_4") => Bpp::Four,
        Some(other) => {
            return Err(SpecValidationError::new("bpp_mode", format!("Invalid BPP mode: {}", other)))
        }
    };

    Ok(input.spec(
        ItemKind::BgPalette,
        Some(PaletteReference::Inline { colors_count }),
        bpp,
        palette_compression(descriptor)?,
    ))
}
