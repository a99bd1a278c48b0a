//! Item specifications.
//!
//! An item is one graphics asset plus its descriptor, validated into an
//! [`ItemSpec`]. All seven item types share one validation entry point,
//! [`ItemSpec::validate`], which dispatches on the descriptor's `type` tag.

pub mod bg;
pub mod compression;
pub mod descriptor;
pub mod error;
pub mod palette;
pub mod sprite;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::asset::DecodedAsset;
use crate::error::CompileError;

pub use bg::{BgBppMode, BgLayout};
pub use compression::{Compression, CompressionSetting, CompressionSettings, Encodings, Field};
pub use descriptor::Descriptor;
pub use error::SpecValidationError;
pub use palette::PaletteReference;
pub use sprite::{SpriteShape, SpriteShapeSize, SpriteSize};

/// The descriptor `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Sprite,
    SpriteTiles,
    SpritePalette,
    RegularBg,
    FixedBg,
    AffineBg,
    BgPalette,
}

impl ItemType {
    pub const ALL: [ItemType; 7] = [
        ItemType::Sprite,
        ItemType::SpriteTiles,
        ItemType::SpritePalette,
        ItemType::RegularBg,
        ItemType::FixedBg,
        ItemType::AffineBg,
        ItemType::BgPalette,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Sprite => "sprite",
            ItemType::SpriteTiles => "sprite_tiles",
            ItemType::SpritePalette => "sprite_palette",
            ItemType::RegularBg => "regular_bg",
            ItemType::FixedBg => "fixed_bg",
            ItemType::AffineBg => "affine_bg",
            ItemType::BgPalette => "bg_palette",
        }
    }

    /// Namespace (and header prefix) of generated items, e.g. `sprite_items`.
    pub fn items_namespace(self) -> String {
        format!("{}_items", self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = SpecValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SpecValidationError::new("type", format!("Unknown graphics type: {}", s)))
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel depth of tiles and palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bpp {
    Four,
    Eight,
}

impl Bpp {
    /// 8bpp is needed as soon as a palette does not fit in 16 colors.
    pub fn from_colors_count(colors_count: u32) -> Self {
        if colors_count > 16 {
            Bpp::Eight
        } else {
            Bpp::Four
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Bpp::Four => 4,
            Bpp::Eight => 8,
        }
    }

    /// `bpp_mode::BPP_n` tag.
    pub fn label(self) -> &'static str {
        match self {
            Bpp::Four => "bpp_mode::BPP_4",
            Bpp::Eight => "bpp_mode::BPP_8",
        }
    }
}

/// Identity shared by every item: its name and where it lives.
#[derive(Debug, Clone, Copy)]
pub struct ItemInput<'a> {
    pub name: &'a str,
    pub source: &'a Path,
    pub out_dir: &'a Path,
}

impl ItemInput<'_> {
    fn spec(
        &self,
        kind: ItemKind,
        palette: Option<PaletteReference>,
        bpp: Bpp,
        compression: CompressionSettings,
    ) -> ItemSpec {
        ItemSpec {
            name: self.name.to_string(),
            source: self.source.to_path_buf(),
            out_dir: self.out_dir.to_path_buf(),
            kind,
            palette,
            bpp,
            compression,
        }
    }
}

/// Variant payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Sprite { shape_size: SpriteShapeSize, frames: u32 },
    SpriteTiles { shape_size: SpriteShapeSize, frames: u32 },
    SpritePalette,
    RegularBg(BgLayout),
    FixedBg(BgLayout),
    AffineBg(BgLayout),
    BgPalette,
}

impl ItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Sprite { .. } => ItemType::Sprite,
            ItemKind::SpriteTiles { .. } => ItemType::SpriteTiles,
            ItemKind::SpritePalette => ItemType::SpritePalette,
            ItemKind::RegularBg(_) => ItemType::RegularBg,
            ItemKind::FixedBg(_) => ItemType::FixedBg,
            ItemKind::AffineBg(_) => ItemType::AffineBg,
            ItemKind::BgPalette => ItemType::BgPalette,
        }
    }

    /// Whether the codec produces a tile stream for this kind.
    pub fn has_tiles(&self) -> bool {
        !matches!(self, ItemKind::SpritePalette | ItemKind::BgPalette)
    }

    /// Background layout, if this is a background.
    pub fn layout(&self) -> Option<&BgLayout> {
        match self {
            ItemKind::RegularBg(layout) | ItemKind::FixedBg(layout) | ItemKind::AffineBg(layout) => {
                Some(layout)
            }
            _ => None,
        }
    }

    /// Largest tile count (as reported by the codec) the item may use.
    pub fn tiles_limit(&self) -> Option<u32> {
        match self {
            ItemKind::AffineBg(_) => Some(256),
            ItemKind::RegularBg(_) | ItemKind::FixedBg(_) => Some(1024),
            _ => None,
        }
    }
}

/// A validated, immutable item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    pub name: String,
    /// Asset the codec reads; a quantized copy for `bpp_4_auto` backgrounds.
    pub source: PathBuf,
    pub out_dir: PathBuf,
    pub kind: ItemKind,
    /// `None` when the item emits no palette at all.
    pub palette: Option<PaletteReference>,
    pub bpp: Bpp,
    pub compression: CompressionSettings,
}

impl ItemSpec {
    /// Validate a descriptor against its decoded asset.
    pub fn validate(
        input: ItemInput<'_>,
        descriptor: &Descriptor,
        asset: &DecodedAsset,
    ) -> Result<ItemSpec, CompileError> {
        let item_type: ItemType = descriptor
            .get_str("type")?
            .ok_or_else(|| SpecValidationError::missing("type"))?
            .parse()?;

        let spec = match item_type {
            ItemType::Sprite => sprite::validate_sprite(&input, descriptor, asset)?,
            ItemType::SpriteTiles => sprite::validate_sprite_tiles(&input, descriptor, asset)?,
            ItemType::SpritePalette => palette::validate_sprite_palette(&input, descriptor, asset)?,
            ItemType::BgPalette => palette::validate_bg_palette(&input, descriptor, asset)?,
            ItemType::RegularBg | ItemType::FixedBg | ItemType::AffineBg => {
                bg::validate_background(item_type, &input, descriptor, asset)?
            }
        };

        Ok(spec)
    }

    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    /// Prefix of the codec's output symbols and files: `<name>_bn_gfx`.
    pub fn symbol(&self) -> String {
        format!("{}_bn_gfx", self.name)
    }

    /// Output stem passed to the codec.
    pub fn codec_stem(&self) -> PathBuf {
        self.out_dir.join(self.symbol())
    }

    /// Generated header: `bn_<kind>_items_<name>.h`.
    pub fn header_path(&self) -> PathBuf {
        self.out_dir.join(format!("bn_{}_{}.h", self.item_type().items_namespace(), self.name))
    }

    /// Colors emitted by this item.
    pub fn colors_count(&self) -> u32 {
        self.palette.as_ref().map_or(0, PaletteReference::colors_count)
    }
}

impl fmt::Display for ItemSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.name, self.item_type())?;
        match &self.kind {
            ItemKind::Sprite { shape_size, frames } | ItemKind::SpriteTiles { shape_size, frames } => {
                write!(f, ", {}, {} frame(s)", shape_size, frames)?
            }
            ItemKind::RegularBg(layout) | ItemKind::FixedBg(layout) | ItemKind::AffineBg(layout) => {
                write!(f, ", {}x{} tiles", layout.columns, layout.rows)?
            }
            ItemKind::SpritePalette | ItemKind::BgPalette => {}
        }
        match &self.palette {
            Some(PaletteReference::Inline { colors_count }) => write!(f, ", {} colors", colors_count)?,
            Some(PaletteReference::External { name }) => write!(f, ", palette {}", name)?,
            None => {}
        }
        write!(
            f,
            ", {}bpp, compression tiles={} palette={} map={})",
            self.bpp.bits(),
            self.compression.tiles,
            self.compression.palette,
            self.compression.map
        )
    }
}
