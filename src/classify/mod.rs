//! Tag classification: derive a `ModelVariant` from layered sources.
//!
//! Each field is resolved independently through the same chain:
//! 1. model-file header
//! 2. registry config blob
//! 3. tag-name heuristics
//!
//! A field that no source can supply stays `None`. Only an empty tag is an
//! error.

mod config;
mod header;
mod heuristics;

pub use config::{ConfigBlob, ConfigFields};
pub use header::ModelFileHeader;
pub use heuristics::{architecture_from_repository, parameters_from_tag, quantization_from_tag};

use crate::units::{format_byte_size, format_parameter_count, parse_byte_size, parse_magnitude};
use crate::variant::{ByteSize, Hyperparameters, ModelVariant, Parameters, Quantization, VariantError};
use crate::vram::estimate_vram;
use config::non_empty;

/// Everything known about one tag before classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagSources<'a> {
    pub header: Option<&'a ModelFileHeader>,
    pub config: Option<&'a ConfigBlob>,
}

/// Build the variant record for `repository:tag`.
pub fn classify(
    repository: &str,
    tag: &str,
    sources: TagSources<'_>,
) -> Result<ModelVariant, VariantError> {
    let mut variant = ModelVariant::new(repository, tag)?;

    variant.parameters = header_parameters(sources.header)
        .or_else(|| config_parameters(sources.config))
        .or_else(|| tag_parameters(tag));

    variant.quantization = header_quantization(sources.header)
        .or_else(|| config_quantization(sources.config))
        .or_else(|| tag_quantization(tag));

    variant.architecture = sources
        .header
        .and_then(ModelFileHeader::architecture_name)
        .or_else(|| sources.config.and_then(|c| non_empty(&c.config.architecture)))
        .or_else(|| architecture_from_repository(repository))
        .map(str::to_string);

    variant.size = sources
        .header
        .and_then(|h| non_empty(&h.size))
        .or_else(|| sources.config.and_then(|c| non_empty(&c.config.size)))
        .and_then(parse_byte_size)
        .map(|bytes| ByteSize {
            bytes,
            formatted: format_byte_size(bytes),
        });

    let hyper = header_hyperparameters(sources.header);
    variant.context_length = hyper.context_length.and_then(|c| u32::try_from(c).ok());

    variant.vram_gb = if sources.header.is_some() {
        match estimate_vram(
            variant.parameters.as_ref().map(|p| p.raw),
            variant.formatted_quantization(),
            hyper,
        ) {
            Ok(gb) => Some(gb),
            Err(e) => {
                log::warn!("[CLASSIFY] {}: no VRAM estimate: {}", variant.reference(), e);
                None
            }
        }
    } else {
        None
    };

    log::debug!(
        "[CLASSIFY] {} → params={:?} quant={:?} arch={:?} ctx={:?}",
        variant.reference(),
        variant.formatted_parameters(),
        variant.formatted_quantization(),
        variant.architecture,
        variant.context_length,
    );

    Ok(variant)
}

/// Size label if it is genuinely numeric, else the exact tensor count.
///
/// Some models carry a qualitative label (`"large"`); a raw count is
/// always preferable to that.
fn header_parameters(header: Option<&ModelFileHeader>) -> Option<Parameters> {
    let header = header?;
    non_empty(&header.size_label)
        .and_then(Parameters::from_formatted)
        .or_else(|| {
            let count = header.parameter_count.filter(|n| *n > 0)?;
            Parameters::from_formatted(format_parameter_count(count as f64))
        })
}

fn config_parameters(config: Option<&ConfigBlob>) -> Option<Parameters> {
    let text = non_empty(&config?.config.parameters)?;
    let raw = parse_magnitude(text)?;
    Parameters::from_formatted(format_parameter_count(raw))
}

fn tag_parameters(tag: &str) -> Option<Parameters> {
    Parameters::from_formatted(parameters_from_tag(tag)?)
}

fn header_quantization(header: Option<&ModelFileHeader>) -> Option<Quantization> {
    non_empty(&header?.file_type).map(Quantization::plain)
}

fn config_quantization(config: Option<&ConfigBlob>) -> Option<Quantization> {
    non_empty(&config?.config.quantization).map(Quantization::plain)
}

fn tag_quantization(tag: &str) -> Option<Quantization> {
    quantization_from_tag(tag).map(|(raw, formatted)| Quantization {
        raw: raw.to_string(),
        formatted,
    })
}

fn header_hyperparameters(header: Option<&ModelFileHeader>) -> Hyperparameters {
    header
        .and_then(|h| {
            h.architecture_name()
                .map(|arch| Hyperparameters::from_metadata(arch, &h.metadata))
        })
        .unwrap_or_default()
}
