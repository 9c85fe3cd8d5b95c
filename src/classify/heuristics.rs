//! Last-resort field extraction from the tag name itself.
//!
//! Tags are split on `-` and each segment is compared whole, so `BF16`
//! never reads as `F16` and `27B` never reads as `7B`.

use regex::Regex;
use std::sync::LazyLock;

/// Parameter markers, checked in this order before the generic pattern.
static PARAMETER_MARKERS: &[&str] = &["360M", "135M", "7B", "13B", "70B"];

/// Quantization markers and how each one is displayed.
///
/// `Q4_K_M` keeps its historical compound label.
static QUANTIZATION_MARKERS: &[(&str, &str)] = &[
    ("F16", "F16"),
    ("Q4_0", "Q4_0"),
    ("Q4_K_M", "IQ2_XXS/Q4_K_M"),
    ("Q8_0", "Q8_0"),
];

static PARAMETER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?[MB]$").unwrap());

static QUANTIZATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(I?Q\d(_[0-9A-Z]+)*|B?F(16|32|64)|I(8|16|32|64))$").unwrap()
});

fn segments(tag: &str) -> impl Iterator<Item = &str> + Clone + '_ {
    tag.split('-').map(str::trim).filter(|s| !s.is_empty())
}

/// Parameter marker found in the tag, e.g. `"360M"` in `"360M-Q4_0"`.
pub fn parameters_from_tag(tag: &str) -> Option<&str> {
    let segs = segments(tag);
    PARAMETER_MARKERS
        .iter()
        .find(|marker| segs.clone().any(|s| s == **marker))
        .copied()
        .or_else(|| segs.clone().find(|s| PARAMETER_PATTERN.is_match(s)))
}

/// Quantization marker found in the tag as `(raw, display)`.
pub fn quantization_from_tag(tag: &str) -> Option<(&str, String)> {
    let segs = segments(tag);
    QUANTIZATION_MARKERS
        .iter()
        .find(|(marker, _)| segs.clone().any(|s| s == *marker))
        .map(|(marker, display)| (*marker, display.to_string()))
        .or_else(|| {
            segs.clone()
                .find(|s| QUANTIZATION_PATTERN.is_match(s))
                .map(|s| (s, s.to_string()))
        })
}

/// Architecture family guessed from a repository name such as `ai/llama3.2`.
///
/// A family matches only at the start of a `-` separated name segment, so
/// `dolphin` is not `phi`.
pub fn architecture_from_repository(repository: &str) -> Option<&'static str> {
    const FAMILIES: &[&str] = &[
        "llama", "mistral", "phi", "gemma", "qwen", "deepseek", "smollm",
    ];
    let name = repository.rsplit('/').next().unwrap_or(repository);
    FAMILIES
        .iter()
        .find(|f| name.split('-').any(|seg| seg.starts_with(**f)))
        .copied()
}
