use std::path::PathBuf;

use crate::markdown::MarkdownError;
use crate::registry::RegistryError;
use crate::variant::VariantError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Variant(#[from] VariantError),

    #[error(transparent)]
    Markdown(#[from] MarkdownError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Model file not found: {0}")]
    ModelFileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
