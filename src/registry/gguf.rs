//! GGUF header decoding on top of candle's `gguf_file` reader.
//!
//! Only the header is needed: metadata key/values and tensor infos. Those
//! sit at the front of the file, so a byte prefix of the blob is enough.

use crate::classify::ModelFileHeader;
use crate::variant::{Metadata, MetadataValue};
use candle_core::quantized::gguf_file::{Content as GgufContent, Value as GgufValue};
use std::io::Cursor;

/// llama.cpp `general.file_type` ids and their display names.
static FILE_TYPES: &[(u32, &str)] = &[
    (0, "F32"),
    (1, "F16"),
    (2, "Q4_0"),
    (3, "Q4_1"),
    (7, "Q8_0"),
    (8, "Q5_0"),
    (9, "Q5_1"),
    (10, "Q2_K"),
    (11, "Q3_K_S"),
    (12, "Q3_K_M"),
    (13, "Q3_K_L"),
    (14, "Q4_K_S"),
    (15, "Q4_K_M"),
    (16, "Q5_K_S"),
    (17, "Q5_K_M"),
    (18, "Q6_K"),
    (19, "IQ2_XXS"),
    (20, "IQ2_XS"),
    (21, "Q2_K_S"),
    (22, "IQ3_XS"),
    (23, "IQ3_XXS"),
    (24, "IQ1_S"),
    (25, "IQ4_NL"),
    (26, "IQ3_S"),
    (27, "IQ3_M"),
    (28, "IQ2_S"),
    (29, "IQ2_M"),
    (30, "IQ4_XS"),
    (31, "IQ1_M"),
    (32, "BF16"),
    (36, "TQ1_0"),
    (37, "TQ2_0"),
];

pub fn file_type_name(id: u32) -> Option<&'static str> {
    FILE_TYPES
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, name)| *name)
}

fn scalar(value: &GgufValue) -> Option<MetadataValue> {
    Some(match value {
        GgufValue::U8(v) => MetadataValue::Uint(*v as u64),
        GgufValue::U16(v) => MetadataValue::Uint(*v as u64),
        GgufValue::U32(v) => MetadataValue::Uint(*v as u64),
        GgufValue::U64(v) => MetadataValue::Uint(*v),
        GgufValue::I8(v) => MetadataValue::Int(*v as i64),
        GgufValue::I16(v) => MetadataValue::Int(*v as i64),
        GgufValue::I32(v) => MetadataValue::Int(*v as i64),
        GgufValue::I64(v) => MetadataValue::Int(*v),
        GgufValue::F32(v) => MetadataValue::Float(*v as f64),
        GgufValue::F64(v) => MetadataValue::Float(*v),
        GgufValue::Bool(v) => MetadataValue::Bool(*v),
        GgufValue::String(v) => MetadataValue::Text(v.clone()),
        // tokenizer vocabularies and the like; not needed for metadata
        GgufValue::Array(_) => return None,
    })
}

/// Whether a parse failure came from running off the end of the prefix.
pub fn is_truncated(err: &candle_core::Error) -> bool {
    if let candle_core::Error::Io(io) = err {
        return io.kind() == std::io::ErrorKind::UnexpectedEof;
    }
    err.to_string().contains("failed to fill whole buffer")
}

/// Decode a header from the first bytes of a GGUF blob.
///
/// `blob_size` is the full blob size from the manifest and becomes the
/// reported artifact size.
pub fn parse_header(prefix: &[u8], blob_size: u64) -> Result<ModelFileHeader, candle_core::Error> {
    let content = GgufContent::read(&mut Cursor::new(prefix))?;

    let metadata: Metadata = content
        .metadata
        .iter()
        .filter_map(|(key, value)| scalar(value).map(|v| (key.clone(), v)))
        .collect();

    let text = |key: &str| {
        metadata
            .get(key)
            .and_then(MetadataValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let file_type = metadata
        .get("general.file_type")
        .and_then(MetadataValue::as_u64)
        .and_then(|id| u32::try_from(id).ok())
        .and_then(file_type_name)
        .map(str::to_string);

    let parameter_count: u64 = content
        .tensor_infos
        .values()
        .map(|info| info.shape.elem_count() as u64)
        .sum();

    Ok(ModelFileHeader {
        size_label: text("general.size_label"),
        parameter_count: (parameter_count > 0).then_some(parameter_count),
        architecture: text("general.architecture"),
        file_type,
        size: (blob_size > 0).then(|| blob_size.to_string()),
        metadata,
    })
}
