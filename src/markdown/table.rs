//! Variants table rendering.
//!
//! Output depends only on the variant list, so identical input always gives
//! an identical table and re-running the updater is a no-op.

use crate::sort::sort_variants;
use crate::units::{format_context_length, format_magnitude, format_vram};
use crate::variant::{ModelVariant, LATEST_TAG};

const HEADER: &str = "| Model variant | Parameters | Quantization | Context window | VRAM¹ | Size |";
const DIVIDER: &str = "|---------------|------------|--------------|----------------|-------|------|";
const FOOTNOTE: &str = "¹: VRAM estimated based on model characteristics.";
const PLACEHOLDER: &str = "-";

fn cell(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.replace('|', "\\|"),
        _ => PLACEHOLDER.to_string(),
    }
}

fn row(variant: &ModelVariant, label: &str) -> String {
    let parameters = variant.formatted_parameters().map(format_magnitude);
    format!(
        "| {} | {} | {} | {} | {} | {} |\n",
        label,
        cell(parameters.as_deref()),
        cell(variant.formatted_quantization()),
        format_context_length(variant.context_length),
        format_vram(variant.vram_gb),
        cell(variant.size.as_ref().map(|s| s.formatted.as_str())),
    )
}

fn alias_tag(target: &ModelVariant) -> &str {
    target.latest_tag.as_deref().unwrap_or(LATEST_TAG)
}

/// Render the section body: table, footnote, and the alias note if any.
///
/// The alias target (if one is marked) is listed first; the remaining rows
/// follow in display order.
pub fn render_table(repository: &str, variants: &[ModelVariant]) -> String {
    let latest = variants.iter().find(|v| v.is_latest);

    let mut out = String::new();
    out.push('\n');
    out.push_str(HEADER);
    out.push('\n');
    out.push_str(DIVIDER);
    out.push('\n');

    if let Some(target) = latest {
        let label = format!(
            "`{repo}:{alias}`<br><br>`{repo}:{tag}`",
            repo = repository,
            alias = alias_tag(target),
            tag = target.tag
        );
        out.push_str(&row(target, &label));
    }

    for variant in sort_variants(variants).iter().filter(|v| !v.is_latest) {
        out.push_str(&row(variant, &format!("`{}:{}`", repository, variant.tag)));
    }

    out.push('\n');
    out.push_str(FOOTNOTE);
    out.push('\n');

    if let Some(target) = latest {
        out.push_str(&format!(
            "\n> `{repo}:{alias}` → `{repo}:{tag}`\n",
            repo = repository,
            alias = alias_tag(target),
            tag = target.tag
        ));
    }

    out.push('\n');
    out
}
