//! `latest` alias resolution.
//!
//! The alias carries no pointer to its target, so the target is found by
//! matching resolved metadata: the first concrete variant whose formatted
//! quantization and parameter count both equal the alias's own. Several
//! identical candidates are not disambiguated; iteration order decides.

use crate::variant::ModelVariant;

/// Mark the variant `alias` denotes and return its tag.
///
/// `alias` is `None` when the alias tag failed classification. Returns
/// `None` (marking nothing) when either field is unknown on the alias or
/// no variant matches both.
pub fn resolve_latest(alias: Option<&ModelVariant>, variants: &mut [ModelVariant]) -> Option<String> {
    let alias = alias?;
    let quantization = alias.formatted_quantization()?;
    let parameters = alias.formatted_parameters()?;

    let target = variants.iter_mut().find(|v| {
        v.tag != alias.tag
            && v.formatted_quantization() == Some(quantization)
            && v.formatted_parameters() == Some(parameters)
    })?;

    target.is_latest = true;
    target.latest_tag = Some(alias.tag.clone());

    log::info!(
        "[ALIAS] Latest tag mapping: {}:{} → {}",
        alias.repository,
        alias.tag,
        target.reference()
    );
    Some(target.tag.clone())
}
