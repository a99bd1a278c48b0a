//! Codec requests and their command line flag grammar.
//!
//! A request is derived from an [`ItemSpec`] plus the concrete encodings of
//! one invocation. Flags are a pure function of the request.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::item::palette::{normalize_colors_count, MAX_COLORS};
use crate::item::{Bpp, Compression, Encodings, ItemKind, ItemSpec};

/// Tile graphics to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicsRequest {
    /// `-g!`: palette only.
    Exclude,
    /// `-gt -gB<n>`: tiles at the given depth.
    Tiles(Bpp),
}

/// Palette to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRequest {
    /// `-p!`: no palette.
    Exclude,
    /// `-pe<n>`: the first `n` palette entries.
    Count(u32),
}

impl ColorRequest {
    /// A zero count means no palette; other counts are rounded up to a
    /// multiple of 16 and capped at 256.
    pub fn from_colors_count(colors_count: u32) -> Self {
        if colors_count == 0 {
            ColorRequest::Exclude
        } else {
            ColorRequest::Count(normalize_colors_count(colors_count).min(MAX_COLORS))
        }
    }
}

/// Map to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapRequest {
    None,
    /// Regular (screen block) map with tile reduction toggles.
    Regular { bpp: Bpp, repeated: bool, flipped: bool },
    /// Affine map with 8 bit cells.
    Affine { repeated: bool },
}

/// One codec invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecRequest {
    pub source: PathBuf,
    /// Output stem; the codec writes `<stem>.h` and `<stem>.s`.
    pub stem: PathBuf,
    pub graphics: GraphicsRequest,
    pub colors: ColorRequest,
    pub map: MapRequest,
    pub encodings: Encodings,
}

impl CodecRequest {
    pub fn new(spec: &ItemSpec, encodings: Encodings) -> Self {
        let graphics = if spec.kind.has_tiles() {
            GraphicsRequest::Tiles(spec.bpp)
        } else {
            GraphicsRequest::Exclude
        };

        let map = match &spec.kind {
            ItemKind::RegularBg(layout) | ItemKind::FixedBg(layout) => MapRequest::Regular {
                bpp: spec.bpp,
                repeated: layout.repeated_tiles_reduction,
                flipped: layout.flipped_tiles_reduction,
            },
            ItemKind::AffineBg(layout) => MapRequest::Affine { repeated: layout.repeated_tiles_reduction },
            _ => MapRequest::None,
        };

        Self {
            source: spec.source.clone(),
            stem: spec.codec_stem(),
            graphics,
            colors: ColorRequest::from_colors_count(spec.colors_count()),
            map,
            encodings,
        }
    }

    /// Header file the codec writes for this request.
    pub fn report_path(&self) -> PathBuf {
        let mut path = OsString::from(self.stem.as_os_str());
        path.push(".h");
        PathBuf::from(path)
    }

    /// Command line arguments, source file first.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![path_arg(&self.source)];

        match self.graphics {
            GraphicsRequest::Exclude => args.push("-g!".to_string()),
            GraphicsRequest::Tiles(bpp) => {
                args.push("-gt".to_string());
                args.push(format!("-gB{}", bpp.bits()));
            }
        }

        match self.colors {
            ColorRequest::Exclude => args.push("-p!".to_string()),
            ColorRequest::Count(n) => args.push(format!("-pe{}", n)),
        }

        match self.map {
            MapRequest::None => {}
            MapRequest::Regular { bpp, repeated, flipped } => {
                let mut reduce = String::from("-mR");
                if repeated {
                    reduce.push('t');
                }
                if bpp == Bpp::Four {
                    reduce.push('p');
                }
                if flipped {
                    reduce.push('f');
                }
                if reduce.len() == 3 {
                    reduce.push('!');
                }
                args.push(reduce);
                args.push("-mLs".to_string());
            }
            MapRequest::Affine { repeated } => {
                args.push("-mLa".to_string());
                args.push("-mu8".to_string());
                args.push(if repeated { "-mRt" } else { "-mR!" }.to_string());
            }
        }

        for (prefix, compression) in [
            ("-gz", self.encodings.tiles),
            ("-pz", self.encodings.palette),
            ("-mz", self.encodings.map),
        ] {
            if let Some(code) = Compression::codec_code(compression) {
                args.push(format!("{}{}", prefix, code));
            }
        }

        args.push(format!("-o{}", path_arg(&self.stem)));
        args
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
