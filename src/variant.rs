//! Variant records, one per published tag of a model repository.
//!
//! Every derived field is an `Option`: `None` means no source produced a
//! value, and renders as a placeholder rather than as a fake zero.

use crate::units::parse_magnitude;
use serde::Serialize;
use std::collections::HashMap;

/// Tag that conventionally aliases another concrete tag.
pub const LATEST_TAG: &str = "latest";

/// Parameter count, raw and as displayed (`"7B"`, `"1.2B"`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameters {
    pub raw: f64,
    pub formatted: String,
}

impl Parameters {
    /// Take `formatted` as given and derive `raw` from it, so the two
    /// always decode to the same count. `None` unless it is a positive number.
    pub fn from_formatted(formatted: impl Into<String>) -> Option<Self> {
        let formatted = formatted.into();
        let raw = parse_magnitude(&formatted).filter(|raw| *raw > 0.0)?;
        Some(Self { raw, formatted })
    }
}

/// Quantization scheme, raw token and as displayed.
///
/// The two differ only for the legacy `Q4_K_M` tag marker, which displays
/// as `IQ2_XXS/Q4_K_M`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quantization {
    pub raw: String,
    pub formatted: String,
}

impl Quantization {
    pub fn plain(token: &str) -> Self {
        let token = token.trim();
        Self {
            raw: token.to_string(),
            formatted: token.to_string(),
        }
    }
}

/// Artifact size in bytes, raw and as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByteSize {
    pub bytes: u64,
    pub formatted: String,
}

/// Architecture hyperparameters needed for the VRAM estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hyperparameters {
    pub block_count: Option<u64>,
    pub embedding_length: Option<u64>,
    pub context_length: Option<u64>,
}

/// Scalar metadata value read from a model-file header.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Uint(u64),
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl MetadataValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            MetadataValue::Uint(n) => Some(*n),
            MetadataValue::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Named header fields keyed like `llama.block_count`.
pub type Metadata = HashMap<String, MetadataValue>;

impl Hyperparameters {
    /// Look up `<arch>.block_count`, `<arch>.embedding_length` and
    /// `<arch>.context_length`.
    pub fn from_metadata(architecture: &str, metadata: &Metadata) -> Self {
        let get = |suffix: &str| {
            metadata
                .get(&format!("{}.{}", architecture, suffix))
                .and_then(MetadataValue::as_u64)
        };
        Self {
            block_count: get("block_count"),
            embedding_length: get("embedding_length"),
            context_length: get("context_length"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VariantError {
    #[error("Variant tag must not be empty (repository {0})")]
    EmptyTag(String),
}

/// One published tag with its derived metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelVariant {
    pub repository: String,
    pub tag: String,
    pub architecture: Option<String>,
    pub parameters: Option<Parameters>,
    pub quantization: Option<Quantization>,
    pub size: Option<ByteSize>,
    pub context_length: Option<u32>,
    pub vram_gb: Option<f64>,
    /// Set on the concrete variant that `latest` resolves to.
    pub is_latest: bool,
    /// Tag of the alias (`latest`) that resolves to this variant.
    pub latest_tag: Option<String>,
}

impl ModelVariant {
    pub fn new(repository: &str, tag: &str) -> Result<Self, VariantError> {
        if tag.trim().is_empty() {
            return Err(VariantError::EmptyTag(repository.to_string()));
        }
        Ok(Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
            architecture: None,
            parameters: None,
            quantization: None,
            size: None,
            context_length: None,
            vram_gb: None,
            is_latest: false,
            latest_tag: None,
        })
    }

    /// `repo:tag` reference.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }

    pub fn formatted_parameters(&self) -> Option<&str> {
        self.parameters.as_ref().map(|p| p.formatted.as_str())
    }

    pub fn formatted_quantization(&self) -> Option<&str> {
        self.quantization.as_ref().map(|q| q.formatted.as_str())
    }
}
