//! Orchestration: registry → classification → alias → document.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::alias::resolve_latest;
use crate::classify::{classify, TagSources};
use crate::error::{Error, Result};
use crate::markdown::{find_markdown_files, repository_name, update_model_file};
use crate::registry::{Registry, RegistryError};
use crate::units::format_vram;
use crate::variant::{ModelVariant, LATEST_TAG};

/// Classify one tag from its manifest, config blob and GGUF header.
///
/// A missing manifest or GGUF layer fails the tag. Config and header
/// failures only narrow the sources classification can draw on.
pub async fn classify_tag<R: Registry>(
    registry: &R,
    repository: &str,
    tag: &str,
) -> Result<ModelVariant> {
    let manifest = registry.manifest(repository, tag).await?;
    let layer = manifest
        .gguf_layer()
        .ok_or_else(|| RegistryError::NoGgufLayer(format!("{}:{}", repository, tag)))?;

    let config = match &manifest.config {
        Some(descriptor) => match registry.config_blob(repository, descriptor).await {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("[REGISTRY] {}:{}: config blob unavailable: {}", repository, tag, e);
                None
            }
        },
        None => None,
    };

    let header = match registry.model_file_header(repository, layer).await {
        Ok(header) => Some(header),
        Err(e) => {
            log::warn!("[REGISTRY] {}:{}: GGUF header unavailable: {}", repository, tag, e);
            None
        }
    };

    let sources = TagSources {
        header: header.as_ref(),
        config: config.as_ref(),
    };
    Ok(classify(repository, tag, sources)?)
}

/// Every concrete variant of `repository`, with the `latest` target marked.
///
/// The alias itself is not part of the result. A tag that fails is logged
/// and left out; only a failure to list tags fails the call.
pub async fn collect_variants<R: Registry>(registry: &R, repository: &str) -> Result<Vec<ModelVariant>> {
    let tags = registry.list_tags(repository).await?;

    let alias = if tags.iter().any(|t| t == LATEST_TAG) {
        match classify_tag(registry, repository, LATEST_TAG).await {
            Ok(variant) => Some(variant),
            Err(e) => {
                log::warn!("[CLASSIFY] {}:{}: skipped: {}", repository, LATEST_TAG, e);
                None
            }
        }
    } else {
        None
    };

    let mut variants = Vec::with_capacity(tags.len());
    for tag in tags.iter().filter(|t| t.as_str() != LATEST_TAG) {
        match classify_tag(registry, repository, tag).await {
            Ok(variant) => variants.push(variant),
            Err(e) => log::warn!("[CLASSIFY] {}:{}: skipped: {}", repository, tag, e),
        }
    }

    if resolve_latest(alias.as_ref(), &mut variants).is_none() && alias.is_some() {
        log::warn!("[ALIAS] {}: no variant matches {}", repository, LATEST_TAG);
    }

    Ok(variants)
}

/// Outcome counts of an update run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReport {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Regenerates the variants table of model cards.
pub struct Updater<'a, R> {
    registry: &'a R,
    model_dir: PathBuf,
    model_file: Option<PathBuf>,
}

impl<'a, R: Registry> Updater<'a, R> {
    pub fn new(registry: &'a R, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            model_dir: model_dir.into(),
            model_file: None,
        }
    }

    /// Restrict the run to one file, named relative to the model dir.
    pub fn with_model_file(mut self, model_file: impl Into<PathBuf>) -> Self {
        self.model_file = Some(model_file.into());
        self
    }

    pub async fn run(&self) -> Result<UpdateReport> {
        let files = match &self.model_file {
            Some(name) => {
                let path = self.model_dir.join(name);
                if !path.is_file() {
                    return Err(Error::ModelFileNotFound(path));
                }
                log::info!("[UPDATE] Processing single model file: {}", path.display());
                vec![path]
            }
            None => {
                let files = find_markdown_files(&self.model_dir)?;
                log::info!(
                    "[UPDATE] Found {} model files in {}",
                    files.len(),
                    self.model_dir.display()
                );
                files
            }
        };

        let mut report = UpdateReport::default();
        for (i, file) in files.iter().enumerate() {
            let repository = repository_name(file, &self.model_dir);
            log::info!("[UPDATE] Processing model {}/{}: {}", i + 1, files.len(), repository);

            match self.update_file(file, &repository).await {
                Ok(true) => report.updated += 1,
                Ok(false) => report.unchanged += 1,
                Err(e) => {
                    log::error!("[UPDATE] {}: {}", repository, e);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "[UPDATE] Done: {} updated, {} unchanged, {} failed",
            report.updated,
            report.unchanged,
            report.failed
        );
        Ok(report)
    }

    async fn update_file(&self, file: &Path, repository: &str) -> Result<bool> {
        let variants = collect_variants(self.registry, repository).await?;
        Ok(update_model_file(file, repository, &variants)?)
    }
}

/// Which variant fields `inspect-model` prints.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Fields {
    pub parameters: bool,
    pub architecture: bool,
    pub quantization: bool,
    pub size: bool,
    pub context: bool,
    pub vram: bool,
}

impl Fields {
    pub const ALL: Fields = Fields {
        parameters: true,
        architecture: true,
        quantization: true,
        size: true,
        context: true,
        vram: true,
    };

    /// No selection at all means everything.
    pub fn or_all(self) -> Self {
        if self == Fields::default() {
            Fields::ALL
        } else {
            self
        }
    }
}

/// Prints registry-derived metadata for one or all tags of a repository.
pub struct Inspector<'a, R> {
    registry: &'a R,
    fields: Fields,
    json: bool,
}

impl<'a, R: Registry> Inspector<'a, R> {
    pub fn new(registry: &'a R, fields: Fields, json: bool) -> Self {
        Self {
            registry,
            fields: fields.or_all(),
            json,
        }
    }

    /// Inspect `tag`, or every tag when `tag` is `None`.
    ///
    /// A single requested tag that fails is an error; when inspecting all
    /// tags, failing ones are logged and skipped.
    pub async fn run(&self, repository: &str, tag: Option<&str>, out: &mut impl Write) -> Result<()> {
        if let Some(tag) = tag {
            let variant = classify_tag(self.registry, repository, tag).await?;
            if self.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&self.to_json(&variant))?)?;
            } else {
                self.write_text(&variant, out)?;
            }
            return Ok(());
        }

        let tags = self.registry.list_tags(repository).await?;
        log::info!("[INSPECT] Found {} tags for repository {}", tags.len(), repository);

        let mut results = Map::new();
        for tag in &tags {
            match classify_tag(self.registry, repository, tag).await {
                Ok(variant) if self.json => {
                    results.insert(tag.clone(), self.to_json(&variant));
                }
                Ok(variant) => {
                    self.write_text(&variant, out)?;
                    writeln!(out, "----------------------------------------")?;
                }
                Err(e) => log::warn!("[INSPECT] Failed to inspect {}:{}: {}", repository, tag, e),
            }
        }

        if self.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&Value::Object(results))?)?;
        }
        Ok(())
    }

    fn write_text(&self, variant: &ModelVariant, out: &mut impl Write) -> std::io::Result<()> {
        const UNKNOWN: &str = "Unknown";
        let f = self.fields;

        writeln!(out, "Model: {}", variant.reference())?;
        if f.parameters {
            writeln!(out, "   • Parameters   : {}", variant.formatted_parameters().unwrap_or(UNKNOWN))?;
        }
        if f.architecture {
            writeln!(out, "   • Architecture : {}", variant.architecture.as_deref().unwrap_or(UNKNOWN))?;
        }
        if f.quantization {
            writeln!(out, "   • Quantization : {}", variant.formatted_quantization().unwrap_or(UNKNOWN))?;
        }
        if f.size {
            let size = variant.size.as_ref().map(|s| s.formatted.as_str());
            writeln!(out, "   • Size         : {}", size.unwrap_or(UNKNOWN))?;
        }
        if f.context {
            match variant.context_length {
                Some(n) => writeln!(out, "   • Context      : {} tokens", n)?,
                None => writeln!(out, "   • Context      : {}", UNKNOWN)?,
            }
        }
        if f.vram {
            match variant.vram_gb {
                Some(_) => writeln!(out, "   • VRAM         : {}", format_vram(variant.vram_gb))?,
                None => writeln!(out, "   • VRAM         : {}", UNKNOWN)?,
            }
        }
        Ok(())
    }

    fn to_json(&self, variant: &ModelVariant) -> Value {
        let f = self.fields;
        let mut map = Map::new();
        if f.parameters {
            map.insert("parameters".into(), variant.formatted_parameters().into());
        }
        if f.architecture {
            map.insert("architecture".into(), variant.architecture.as_deref().into());
        }
        if f.quantization {
            map.insert("quantization".into(), variant.formatted_quantization().into());
        }
        if f.size {
            map.insert(
                "size".into(),
                variant.size.as_ref().map(|s| s.formatted.as_str()).into(),
            );
        }
        if f.context {
            map.insert("context_length".into(), variant.context_length.into());
        }
        if f.vram {
            map.insert("vram_gb".into(), variant.vram_gb.into());
        }
        Value::Object(map)
    }
}
