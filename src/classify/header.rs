//! Model-file header fields, as produced by the GGUF reader collaborator.

use crate::variant::{Metadata, MetadataValue};

/// GGUF header summary for one published artifact.
///
/// Every field is optional: headers written by older converters routinely
/// omit the size label or the file type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelFileHeader {
    /// `general.size_label`, meant to describe the parameter count (`"7B"`).
    pub size_label: Option<String>,
    /// Exact parameter count summed over all tensors.
    pub parameter_count: Option<u64>,
    /// `general.architecture`.
    pub architecture: Option<String>,
    /// File-type name derived from `general.file_type` (`"Q4_K_M"`).
    pub file_type: Option<String>,
    /// Human-readable artifact size (`"4.07 GB"`).
    pub size: Option<String>,
    /// All scalar header entries.
    pub metadata: Metadata,
}

impl ModelFileHeader {
    /// Architecture from the dedicated field, else from the raw metadata.
    pub fn architecture_name(&self) -> Option<&str> {
        self.architecture
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .or_else(|| {
                self.metadata
                    .get("general.architecture")
                    .and_then(MetadataValue::as_str)
            })
    }
}
