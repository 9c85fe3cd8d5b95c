//! Display order for variants: weight ascending, then quantization rank.

use crate::units::parse_magnitude;
use crate::variant::ModelVariant;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Rank given to quantization tokens missing from the table.
pub const UNKNOWN_RANK: u32 = 100;

/// Most compressed first, full precision last.
static QUANTIZATION_RANK: LazyLock<HashMap<&'static str, u32>> = LazyLock::new(|| {
    [
        "Q2_K", "Q3_K", "Q4_0", "Q4_1", "Q4_K", "Q5_0", "Q5_1", "Q5_K", "Q6_K", "Q8_0", "I16",
        "I32", "I64", "F16", "BF16", "F32", "F64",
    ]
    .into_iter()
    .zip(0..)
    .collect()
});

pub fn quantization_rank(token: &str) -> u32 {
    QUANTIZATION_RANK.get(token).copied().unwrap_or(UNKNOWN_RANK)
}

/// Split a `<weight>-<quantization>` tag into its parsed weight and token.
fn split_tag(tag: &str) -> Option<(f64, &str)> {
    let (weight, quantization) = tag.split_once('-')?;
    if quantization.contains('-') {
        return None;
    }
    Some((parse_magnitude(weight)?, quantization))
}

/// Compare two tags for display.
///
/// Tags that do not decompose as `<weight>-<quantization>` are ordered by
/// plain string comparison and come after every tag that does, which keeps
/// the order total.
pub fn compare_tags(a: &str, b: &str) -> Ordering {
    match (split_tag(a), split_tag(b)) {
        (Some((weight_a, quant_a)), Some((weight_b, quant_b))) => weight_a
            .total_cmp(&weight_b)
            .then_with(|| quantization_rank(quant_a).cmp(&quantization_rank(quant_b))),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Return a sorted copy; the input order is left intact.
pub fn sort_variants(variants: &[ModelVariant]) -> Vec<ModelVariant> {
    let mut sorted = variants.to_vec();
    sorted.sort_by(|a, b| compare_tags(&a.tag, &b.tag));
    sorted
}
