//! Registry collaborators: tags, manifests, config blobs, GGUF headers.
//!
//! `Registry` is the seam the pipeline depends on; `OciRegistryClient` is
//! the HTTP implementation and tests substitute an in-memory one.

mod client;
pub mod gguf;

pub use client::OciRegistryClient;

use crate::classify::{ConfigBlob, ModelFileHeader};
use serde::Deserialize;

/// Media type of the GGUF layer in a model artifact manifest.
pub const GGUF_MEDIA_TYPE: &str = "application/vnd.docker.ai.gguf.v3";

/// Content descriptor from an image manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: String,
    pub digest: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub config: Option<Descriptor>,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

impl Manifest {
    pub fn gguf_layer(&self) -> Option<&Descriptor> {
        self.layers.iter().find(|l| l.media_type == GGUF_MEDIA_TYPE)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Token exchange failed: {0}")]
    Auth(String),

    #[error("No GGUF layer found in {0}")]
    NoGgufLayer(String),

    #[error("Invalid JSON from registry: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("Failed to parse GGUF header: {0}")]
    Gguf(String),
}

/// Operations the variant pipeline needs from a model registry.
///
/// One bounded call per operation; retry policy, if any, lives in the
/// implementation.
#[allow(async_fn_in_trait)]
pub trait Registry {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>, RegistryError>;

    async fn manifest(&self, repository: &str, tag: &str) -> Result<Manifest, RegistryError>;

    async fn config_blob(
        &self,
        repository: &str,
        config: &Descriptor,
    ) -> Result<ConfigBlob, RegistryError>;

    async fn model_file_header(
        &self,
        repository: &str,
        layer: &Descriptor,
    ) -> Result<ModelFileHeader, RegistryError>;
}
