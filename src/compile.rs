//! Single item compilation: validate, optimize, synthesize.

use std::fs;
use std::path::{Path, PathBuf};

use crate::asset;
use crate::codec::{CodecBackend, CodecRequest};
use crate::declaration::{self, Declaration};
use crate::error::CompileError;
use crate::item::{Descriptor, Encodings, ItemInput, ItemSpec};
use crate::optimizer;

/// An asset and its descriptor, as found by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemSource {
    /// Item name: the shared base name of both files.
    pub name: String,
    pub asset: PathBuf,
    pub descriptor: PathBuf,
}

impl ItemSource {
    /// Source for `<dir>/<name>.<ext>` with its sibling `<name>.json`.
    pub fn new(name: impl Into<String>, asset: impl Into<PathBuf>) -> Self {
        let asset = asset.into();
        let descriptor = asset.with_extension("json");
        Self { name: name.into(), asset, descriptor }
    }
}

/// Outcome of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledItem {
    pub name: String,
    pub header: PathBuf,
    /// Codec output size in bytes.
    pub total_size: u64,
    pub encodings: Encodings,
}

/// Load the descriptor, decode the asset and validate them together.
///
/// Backgrounds in `bpp_4_auto` mode write their quantized copy to `out_dir`.
pub fn prepare_item(source: &ItemSource, out_dir: &Path) -> Result<ItemSpec, CompileError> {
    let text = fs::read_to_string(&source.descriptor).map_err(|e| CompileError::io(&source.descriptor, e))?;
    let descriptor = Descriptor::parse(&text)?;

    let decoded = asset::decode(&source.asset)
        .map_err(|e| CompileError::Decode { path: source.asset.clone(), source: e })?;

    let input = ItemInput { name: &source.name, source: &source.asset, out_dir };
    ItemSpec::validate(input, &descriptor, &decoded)
}

/// Run the final codec invocation and build the declaration.
pub fn synthesize_item(
    spec: &ItemSpec,
    encodings: Encodings,
    backend: &dyn CodecBackend,
) -> Result<Declaration, CompileError> {
    let report = backend.invoke(&CodecRequest::new(spec, encodings))?;
    declaration::synthesize(spec, &report, encodings)
}

/// Compile one item and write its header.
pub fn compile_item(
    source: &ItemSource,
    out_dir: &Path,
    backend: &dyn CodecBackend,
) -> Result<CompiledItem, CompileError> {
    let spec = prepare_item(source, out_dir)?;
    tracing::debug!(item = %spec, "validated");

    let optimization = optimizer::optimize(&spec, backend)?;
    let declaration = synthesize_item(&spec, optimization.encodings, backend)?;

    fs::write(&declaration.path, &declaration.contents)
        .map_err(|e| CompileError::io(&declaration.path, e))?;

    Ok(CompiledItem {
        name: spec.name,
        header: declaration.path,
        total_size: declaration.total_size,
        encodings: optimization.encodings,
    })
}
