//! Compression optimizer.
//!
//! For every stream whose setting is `auto`, the optimizer runs the codec
//! once per candidate encoding and keeps the smallest output. Each trial
//! measures a single stream against an uncompressed baseline: every other
//! stream is forced to `none`, whatever was chosen for it earlier.

use crate::codec::{CodecBackend, CodecError, CodecRequest};
use crate::item::{Compression, CompressionSetting, Encodings, Field, ItemSpec};

/// A single measured candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trial {
    pub field: Field,
    pub candidate: Compression,
    pub total_size: u64,
}

/// Final encodings plus every trial that led to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optimization {
    pub encodings: Encodings,
    pub trials: Vec<Trial>,
}

/// Resolve the concrete encodings of an item.
///
/// Fixed settings are used as-is; `auto` settings are searched in the order
/// tiles, palette, map. Trials run sequentially and never write a declaration.
pub fn optimize(spec: &ItemSpec, backend: &dyn CodecBackend) -> Result<Optimization, CodecError> {
    let mut encodings = Encodings::NONE;
    let mut trials = Vec::new();

    for field in Field::ALL {
        let chosen = match spec.compression.get(field) {
            CompressionSetting::Fixed(compression) => compression,
            CompressionSetting::Auto => {
                let mut best: Option<(Compression, u64)> = None;

                for candidate in Compression::CANDIDATES {
                    let request = CodecRequest::new(spec, Encodings::only(field, candidate));
                    let total_size = backend.invoke(&request)?.total_size;
                    tracing::debug!(
                        item = %spec.name,
                        field = %field,
                        candidate = %candidate,
                        total_size,
                        "compression trial"
                    );
                    trials.push(Trial { field, candidate, total_size });

                    if best.map_or(true, |(_, size)| total_size < size) {
                        best = Some((candidate, total_size));
                    }
                }

                best.map_or(Compression::None, |(compression, _)| compression)
            }
        };

        encodings = encodings.with(field, chosen);
    }

    Ok(Optimization { encodings, trials })
}
