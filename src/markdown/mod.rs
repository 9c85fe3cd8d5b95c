//! Model card documents and the in-place update of their variants table.
//!
//! `section` and `table` are pure; this module owns the file I/O.

mod section;
mod table;

pub use section::{find_section, replace_section, SectionError};
pub use table::render_table;

use crate::variant::ModelVariant;
use std::path::{Path, PathBuf};

/// Heading that owns the generated table.
pub const VARIANTS_HEADING: &str = "## Available model variants";

#[derive(Debug, thiserror::Error)]
pub enum MarkdownError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Section {
        path: PathBuf,
        source: SectionError,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> MarkdownError + '_ {
    move |source| MarkdownError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// All `*.md` files directly inside `dir`, sorted by path.
pub fn find_markdown_files(dir: &Path) -> Result<Vec<PathBuf>, MarkdownError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Repository for a model card: `<model dir name>/<file stem>`.
///
/// `ai/smollm2.md` inside model dir `ai` maps to `ai/smollm2`.
pub fn repository_name(file: &Path, model_dir: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let namespace = model_dir
        .components()
        .next_back()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "." && n != "..");
    match namespace {
        Some(ns) => format!("{}/{}", ns, stem),
        None => stem,
    }
}

/// Write `contents` to a sibling `.partial` file, then rename it over `path`.
///
/// On failure the `.partial` file is removed and `path` is untouched.
fn replace_file(path: &Path, contents: &str) -> Result<(), MarkdownError> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    let result = std::fs::write(&partial, contents.as_bytes())
        .map_err(io_error(&partial))
        .and_then(|()| std::fs::rename(&partial, path).map_err(io_error(path)));

    if result.is_err() && partial.is_file() {
        if let Err(e) = std::fs::remove_file(&partial) {
            log::warn!("[MARKDOWN] Could not remove {}: {}", partial.display(), e);
        }
    }
    result
}

/// Rewrite the variants section of `path`.
///
/// The new document is built in memory first; the file is only replaced
/// once that succeeded.
/// Returns `false` when the content was already up to date.
pub fn update_model_file(
    path: &Path,
    repository: &str,
    variants: &[ModelVariant],
) -> Result<bool, MarkdownError> {
    let original = std::fs::read_to_string(path).map_err(io_error(path))?;

    let body = render_table(repository, variants);
    let updated = replace_section(&original, VARIANTS_HEADING, &body).map_err(|source| {
        MarkdownError::Section {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if updated == original {
        log::info!("[MARKDOWN] {} already up to date", path.display());
        return Ok(false);
    }

    replace_file(path, &updated)?;

    log::info!(
        "[MARKDOWN] Updated {} with {} variants for {}",
        path.display(),
        variants.len(),
        repository
    );
    Ok(true)
}
