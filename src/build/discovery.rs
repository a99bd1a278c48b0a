//! Asset discovery for the build system.
//!
//! Scans each asset folder (non-recursively) for `.bmp` and `.png` files.
//! Every asset needs a sibling `<name>.json` descriptor, and item names must
//! be unique across all folders since they share one output directory.

use crate::asset::AssetFormat;
use crate::compile::ItemSource;
use glob::{glob, Pattern};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error during asset discovery. Always fatal for the whole batch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    #[error("Invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, #[source] glob::PatternError),

    #[error("Graphics folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    #[error("There's two or more graphics files with the same name: {name} ({} and {})", .first.display(), .second.display())]
    DuplicateName { name: String, first: PathBuf, second: PathBuf },

    #[error("Graphics json file not found: {}", .0.display())]
    MissingDescriptor(PathBuf),

    #[error("Invalid graphics file name: {name} (invalid character: '{character}')")]
    InvalidName { name: String, character: char },
}

/// Check that an item name can be used as a C++ identifier suffix.
pub fn validate_item_name(name: &str) -> Result<(), DiscoveryError> {
    let invalid = |character| DiscoveryError::InvalidName { name: name.to_string(), character };

    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        Some(first) => return Err(invalid(first)),
        None => return Err(invalid(' ')),
    }

    match chars.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')) {
        Some(bad) => Err(invalid(bad)),
        None => Ok(()),
    }
}

/// List asset files directly inside `folder`, sorted by path.
///
/// Hidden files are ignored, as is anything whose extension is not a
/// recognized asset format (descriptors included).
pub fn discover_assets(folder: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !folder.is_dir() {
        return Err(DiscoveryError::FolderNotFound(folder.to_path_buf()));
    }

    let pattern = format!("{}/*", Pattern::escape(&folder.to_string_lossy()));
    let paths = glob(&pattern).map_err(|e| DiscoveryError::InvalidPattern(pattern.clone(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() && !is_hidden(&path) && AssetFormat::from_path(&path).is_some() {
                    files.push(path);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "error reading path");
            }
        }
    }

    files.sort();
    Ok(files)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).map_or(false, |n| n.starts_with('.'))
}

/// Discover every item in `folders`, in folder order.
///
/// Fails on the first invalid name, duplicate name or missing descriptor,
/// before anything is compiled.
pub fn discover_items(folders: &[PathBuf]) -> Result<Vec<ItemSource>, DiscoveryError> {
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut items = Vec::new();

    for folder in folders {
        for asset in discover_assets(folder)? {
            let name = asset.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            validate_item_name(&name)?;

            if let Some(first) = seen.get(&name) {
                return Err(DiscoveryError::DuplicateName { name, first: first.clone(), second: asset });
            }
            seen.insert(name.clone(), asset.clone());

            let source = ItemSource::new(name, asset);
            if !source.descriptor.is_file() {
                return Err(DiscoveryError::MissingDescriptor(source.descriptor));
            }

            items.push(source);
        }
    }

    tracing::debug!(count = items.len(), "discovered items");
    Ok(items)
}
