//! Compression settings for the tiles, palette and map streams.
//!
//! Each stream of an item is resolved through a layered lookup:
//! `<field>_compression`, then `compression`, then `none`.

use std::fmt;
use std::str::FromStr;

use super::descriptor::Descriptor;
use super::error::SpecValidationError;

/// Encoding applied by the codec to one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    #[default]
    None,
    RunLength,
    Lz77,
}

impl Compression {
    /// Candidates tried by the optimizer, in tie-break order.
    pub const CANDIDATES: [Compression; 3] =
        [Compression::None, Compression::RunLength, Compression::Lz77];

    /// Descriptor spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::RunLength => "run_length",
            Compression::Lz77 => "lz77",
        }
    }

    /// Tag used in generated declarations.
    pub fn label(self) -> &'static str {
        match self {
            Compression::None => "compression_type::NONE",
            Compression::RunLength => "compression_type::RUN_LENGTH",
            Compression::Lz77 => "compression_type::LZ77",
        }
    }

    /// Suffix of the codec's `-?z?` flag, absent for uncompressed streams.
    pub fn codec_code(self) -> Option<char> {
        match self {
            Compression::None => None,
            Compression::RunLength => Some('r'),
            Compression::Lz77 => Some('l'),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stream's requested compression: a fixed encoding or a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionSetting {
    Fixed(Compression),
    Auto,
}

impl CompressionSetting {
    pub const NONE: CompressionSetting = CompressionSetting::Fixed(Compression::None);

    pub fn is_auto(self) -> bool {
        matches!(self, CompressionSetting::Auto)
    }
}

impl FromStr for CompressionSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(CompressionSetting::Fixed(Compression::None)),
            "run_length" => Ok(CompressionSetting::Fixed(Compression::RunLength)),
            "lz77" => Ok(CompressionSetting::Fixed(Compression::Lz77)),
            "auto" => Ok(CompressionSetting::Auto),
            other => Err(format!("Unknown compression: {}", other)),
        }
    }
}

impl fmt::Display for CompressionSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionSetting::Fixed(c) => c.fmt(f),
            CompressionSetting::Auto => f.write_str("auto"),
        }
    }
}

/// One of the three compressible streams produced by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Tiles,
    Palette,
    Map,
}

impl Field {
    /// Optimizer order.
    pub const ALL: [Field; 3] = [Field::Tiles, Field::Palette, Field::Map];

    /// Field-specific descriptor key.
    pub fn key(self) -> &'static str {
        match self {
            Field::Tiles => "tiles_compression",
            Field::Palette => "palette_compression",
            Field::Map => "map_compression",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Tiles => "tiles",
            Field::Palette => "palette",
            Field::Map => "map",
        })
    }
}

/// Requested settings for all three streams of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    pub tiles: CompressionSetting,
    pub palette: CompressionSetting,
    pub map: CompressionSetting,
}

impl CompressionSettings {
    /// Every stream uncompressed.
    pub const NONE: CompressionSettings = CompressionSettings {
        tiles: CompressionSetting::NONE,
        palette: CompressionSetting::NONE,
        map: CompressionSetting::NONE,
    };

    pub fn get(&self, field: Field) -> CompressionSetting {
        match field {
            Field::Tiles => self.tiles,
            Field::Palette => self.palette,
            Field::Map => self.map,
        }
    }

    pub fn set(&mut self, field: Field, setting: CompressionSetting) {
        match field {
            Field::Tiles => self.tiles = setting,
            Field::Palette => self.palette = setting,
            Field::Map => self.map = setting,
        }
    }
}

/// Concrete encodings handed to the codec for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Encodings {
    pub tiles: Compression,
    pub palette: Compression,
    pub map: Compression,
}

impl Encodings {
    pub const NONE: Encodings =
        Encodings { tiles: Compression::None, palette: Compression::None, map: Compression::None };

    /// `compression` on `field`, every sibling uncompressed.
    pub fn only(field: Field, compression: Compression) -> Self {
        Self::NONE.with(field, compression)
    }

    pub fn with(mut self, field: Field, compression: Compression) -> Self {
        match field {
            Field::Tiles => self.tiles = compression,
            Field::Palette => self.palette = compression,
            Field::Map => self.map = compression,
        }
        self
    }

    pub fn get(&self, field: Field) -> Compression {
        match field {
            Field::Tiles => self.tiles,
            Field::Palette => self.palette,
            Field::Map => self.map,
        }
    }
}

/// Resolve a setting through `keys` in order, falling back to `none`.
pub fn resolve_setting(
    descriptor: &Descriptor,
    keys: &[&str],
) -> Result<CompressionSetting, SpecValidationError> {
    let Some((key, value)) = descriptor.lookup(keys) else {
        return Ok(CompressionSetting::NONE);
    };

    let text = value
        .as_str()
        .ok_or_else(|| SpecValidationError::new(key, "compression must be a string"))?;
    text.parse().map_err(|message: String| SpecValidationError::new(key, message))
}

/// Resolve the setting of one stream: `<field>_compression`, then `compression`.
pub fn resolve_field(
    descriptor: &Descriptor,
    field: Field,
) -> Result<CompressionSetting, SpecValidationError> {
    resolve_setting(descriptor, &[field.key(), "compression"])
}
