//! Declaration synthesis.
//!
//! Turns the codec's report header into an item header: raw arrays are
//! retyped to engine types, array bounds are rewritten in engine units, and
//! a `constexpr inline` item is appended in the item's namespace.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::codec::{CodecError, CodecReport};
use crate::error::CompileError;
use crate::item::{Bpp, Encodings, ItemKind, ItemSpec, ItemType, PaletteReference, SpecValidationError};

/// A generated item header, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub path: PathBuf,
    pub contents: String,
    /// Tile count in engine (4bpp sized) tiles, if the item has tiles.
    pub tiles_count: Option<u32>,
    /// Codec output size in bytes.
    pub total_size: u64,
}

/// Convert a codec tile count into engine tiles.
///
/// Engine tiles are 4bpp sized, so an 8bpp tile counts twice.
/// Returns `None` if the converted count does not fit in a `u32`.
pub fn reconcile_tiles_count(reported: u32, bpp: Bpp) -> Option<u32> {
    match bpp {
        Bpp::Four => Some(reported),
        Bpp::Eight => reported.checked_mul(2),
    }
}

fn tiles_array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Tiles\[\d+\]").expect("static pattern"))
}

fn palette_array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Pal\[\d+\]").expect("static pattern"))
}

fn bg_label(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::AffineBg => "Affine",
        ItemType::FixedBg => "Fixed",
        _ => "Regular",
    }
}

/// Validate the reported tile count and convert it to engine tiles.
fn checked_tiles_count(spec: &ItemSpec, report: &CodecReport) -> Result<Option<u32>, CompileError> {
    if !spec.kind.has_tiles() {
        return Ok(None);
    }

    let reported = report.tiles_count.ok_or_else(|| CodecError::MalformedReport {
        reason: "tiles count line not found".to_string(),
        output: report.text.clone(),
    })?;

    if let Some(limit) = spec.kind.tiles_limit() {
        if reported > limit {
            return Err(SpecValidationError::new(
                "tiles",
                format!(
                    "{} BGs with more than {} tiles not supported: {}",
                    bg_label(spec.item_type()),
                    limit,
                    reported
                ),
            )
            .into());
        }
    }

    let tiles_count = reconcile_tiles_count(reported, spec.bpp).ok_or_else(|| CodecError::MalformedReport {
        reason: format!("tiles count overflow: {}", reported),
        output: report.text.clone(),
    })?;

    Ok(Some(tiles_count))
}

/// Raw C types replaced with engine types, applied in order, first match only.
fn retypes(spec: &ItemSpec) -> Vec<(&'static str, &'static str)> {
    let inline_palette = matches!(spec.palette, Some(PaletteReference::Inline { .. }));
    let mut retypes = Vec::new();

    if spec.kind.has_tiles() {
        retypes.push(("unsigned int", "bn::tile"));
    }
    match spec.kind {
        ItemKind::AffineBg(_) => retypes.push(("unsigned char", "bn::affine_bg_map_cell")),
        ItemKind::RegularBg(_) => retypes.push(("unsigned short", "bn::regular_bg_map_cell")),
        ItemKind::FixedBg(_) => retypes.push(("unsigned short", "bn::fixed_bg_map_cell")),
        _ => {}
    }
    if inline_palette {
        retypes.push(("unsigned short", "bn::color"));
    }

    retypes
}

/// Rewrite the codec header's arrays in engine terms.
fn rewrite_report(spec: &ItemSpec, report: &CodecReport, tiles_count: Option<u32>) -> String {
    let mut text = report.text.clone();

    if let Some(tiles_count) = tiles_count {
        text = tiles_array_regex().replace_all(&text, format!("Tiles[{}]", tiles_count)).into_owned();
    }
    if let Some(PaletteReference::Inline { colors_count }) = spec.palette {
        text = palette_array_regex().replace_all(&text, format!("Pal[{}]", colors_count)).into_owned();
    }
    for (from, to) in retypes(spec) {
        text = text.replacen(from, to, 1);
    }

    text
}

fn includes(spec: &ItemSpec) -> Vec<String> {
    let mut includes: Vec<String> = match spec.kind {
        ItemKind::Sprite { .. } => vec!["bn_sprite_item.h".into()],
        ItemKind::SpriteTiles { .. } => {
            vec!["bn_sprite_tiles_item.h".into(), "bn_sprite_shape_size.h".into()]
        }
        ItemKind::SpritePalette => vec!["bn_sprite_palette_item.h".into()],
        ItemKind::BgPalette => vec!["bn_bg_palette_item.h".into()],
        ItemKind::RegularBg(_) | ItemKind::FixedBg(_) => vec!["bn_regular_bg_item.h".into()],
        ItemKind::AffineBg(_) => vec!["bn_affine_bg_item.h".into()],
    };

    if let Some(PaletteReference::External { name }) = &spec.palette {
        includes.push(format!("bn_bg_palette_items_{}.h", name));
    }

    includes
}

/// The `bg_palette_item` argument of a background item.
fn bg_palette_expr(spec: &ItemSpec, encodings: Encodings) -> String {
    match &spec.palette {
        Some(PaletteReference::External { name }) => format!("bn::bg_palette_items::{}", name),
        palette => format!(
            "bg_palette_item(span<const color>({}Pal, {}), {}, {})",
            spec.symbol(),
            palette.as_ref().map_or(0, PaletteReference::colors_count),
            spec.bpp.label(),
            encodings.palette.label()
        ),
    }
}

/// The `constexpr inline` definitions of the item.
fn item_definitions(spec: &ItemSpec, tiles_count: u32, encodings: Encodings) -> Vec<String> {
    let name = &spec.name;
    let symbol = spec.symbol();
    let bpp = spec.bpp.label();
    let colors_count = spec.colors_count();
    let tiles = format!("span<const tile>({}Tiles, {})", symbol, tiles_count);
    let colors = format!("span<const color>({}Pal, {})", symbol, colors_count);
    let separator = ", \n            ";

    match &spec.kind {
        ItemKind::Sprite { shape_size, frames } => vec![format!(
            "sprite_item {}({}{}sprite_tiles_item({}, {}, {}, {}){}sprite_palette_item({}, {}, {}))",
            name,
            shape_size.declaration(),
            separator,
            tiles,
            bpp,
            encodings.tiles.label(),
            frames,
            separator,
            colors,
            bpp,
            encodings.palette.label()
        )],
        ItemKind::SpriteTiles { shape_size, frames } => vec![
            format!("sprite_tiles_item {}({}, {}, {}, {})", name, tiles, bpp, encodings.tiles.label(), frames),
            format!("sprite_shape_size {}_shape_size({})", name, shape_size.declaration()),
        ],
        ItemKind::SpritePalette => {
            vec![format!("sprite_palette_item {}({}, {}, {})", name, colors, bpp, encodings.palette.label())]
        }
        ItemKind::BgPalette => {
            vec![format!("bg_palette_item {}({}, {}, {})", name, colors, bpp, encodings.palette.label())]
        }
        ItemKind::RegularBg(layout) | ItemKind::FixedBg(layout) => vec![format!(
            "regular_bg_item {}({}regular_bg_tiles_item({}, {}, {}){}{}{}regular_bg_map_item({}Map[0], size({}, {}), {}))",
            name,
            separator.trim_start_matches(", "),
            tiles,
            bpp,
            encodings.tiles.label(),
            separator,
            bg_palette_expr(spec, encodings),
            separator,
            symbol,
            layout.columns,
            layout.rows,
            encodings.map.label()
        )],
        ItemKind::AffineBg(layout) => vec![format!(
            "affine_bg_item {}({}affine_bg_tiles_item({}, {}){}{}{}affine_bg_map_item({}Map[0], size({}, {}), {}))",
            name,
            separator.trim_start_matches(", "),
            tiles,
            encodings.tiles.label(),
            separator,
            bg_palette_expr(spec, encodings),
            separator,
            symbol,
            layout.columns,
            layout.rows,
            encodings.map.label()
        )],
    }
}

/// Build the header of an item from its final codec report.
pub fn synthesize(spec: &ItemSpec, report: &CodecReport, encodings: Encodings) -> Result<Declaration, CompileError> {
    let tiles_count = checked_tiles_count(spec, report)?;
    let namespace = spec.item_type().items_namespace();
    let guard = format!("BN_{}_{}_H", namespace.to_uppercase(), spec.name.to_uppercase());

    let mut contents = String::new();
    contents.push_str(&format!("#ifndef {}\n", guard));
    contents.push_str(&format!("#define {}\n\n", guard));
    for include in includes(spec) {
        contents.push_str(&format!("#include \"{}\"\n", include));
    }
    contents.push_str(&rewrite_report(spec, report, tiles_count));
    contents.push('\n');
    contents.push_str(&format!("namespace bn::{}\n", namespace));
    contents.push_str("{\n");
    for definition in item_definitions(spec, tiles_count.unwrap_or(0), encodings) {
        contents.push_str(&format!("    constexpr inline {};\n", definition));
    }
    contents.push_str("}\n\n#endif\n\n");

    Ok(Declaration { path: spec.header_path(), contents, tiles_count, total_size: report.total_size })
}
