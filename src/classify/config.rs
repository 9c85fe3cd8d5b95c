//! Registry config blob attached to a published model artifact.

use serde::Deserialize;

/// Top-level config document; model fields live under `config`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ConfigBlob {
    #[serde(default)]
    pub config: ConfigFields,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ConfigFields {
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub parameters: Option<String>,
    #[serde(default)]
    pub quantization: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

impl ConfigBlob {
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Treat blank strings the same as missing keys.
pub(crate) fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
