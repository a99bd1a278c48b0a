//! Parsing of the codec's report header.
//!
//! Besides the array declarations, the header written by the codec starts
//! with a comment block summarizing the conversion:
//!
//! ```text
//! //	ship_bn_gfx, 16x32@4,
//! //	+ palette 16 entries, not compressed
//! //	+ 8 tiles not compressed
//! //	Total size: 32 + 256 = 288
//! ```

use std::sync::OnceLock;

use regex::Regex;

/// Figures extracted from a report header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecReport {
    /// Raw header text, reused by the declaration synthesizer.
    pub text: String,
    /// Tile count from the `+ N tiles` line; absent for palette-only output.
    pub tiles_count: Option<u32>,
    /// Element count of the `Pal[N]` array, if any.
    pub palette_len: Option<u32>,
    /// Total output size in bytes.
    pub total_size: u64,
}

fn palette_array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Pal\[(\d+)\]").expect("static pattern"))
}

fn first_integer(line: &str) -> Option<u32> {
    line.split_whitespace().find_map(|word| word.parse().ok())
}

impl CodecReport {
    /// Parse report text. Fails only when the total size is missing or malformed.
    pub fn parse(text: String) -> Result<Self, String> {
        let total_line = text
            .lines()
            .find(|line| line.contains("Total size:"))
            .ok_or_else(|| "Total size line not found".to_string())?;
        let total_size = total_line
            .split_whitespace()
            .last()
            .and_then(|word| word.parse::<u64>().ok())
            .ok_or_else(|| format!("Invalid total size line: {}", total_line.trim()))?;

        let tiles_count = text.lines().find(|line| line.contains(" tiles ")).and_then(first_integer);

        let palette_len = palette_array_regex()
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok());

        Ok(Self { text, tiles_count, palette_len, total_size })
    }
}
