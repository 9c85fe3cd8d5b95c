//! Numeric strings with magnitude suffixes.
//!
//! Two unit systems live here and must never be mixed:
//! - parameter counts use decimal `M` (1e6) and `B` (1e9) suffixes
//! - byte sizes use binary K/M/G/T multipliers (1024-based)

const MILLION: f64 = 1e6;
const BILLION: f64 = 1e9;

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;
const TIB: f64 = GIB * 1024.0;

/// Parse a parameter-count string such as `"7B"`, `"1.24B"` or `"360M"`.
///
/// Every character except digits and `.` is stripped before parsing; the
/// scale comes from the original text (`B` wins over `M`). Returns `None`
/// when nothing numeric is left.
pub fn parse_magnitude(text: &str) -> Option<f64> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = digits.parse().ok()?;

    let upper = text.to_ascii_uppercase();
    if upper.contains('B') {
        Some(value * BILLION)
    } else if upper.contains('M') {
        Some(value * MILLION)
    } else {
        Some(value)
    }
}

/// Format a parameter string for the variants table.
///
/// Already-suffixed input (`"7B"`, `"360M"`) is returned unchanged, so the
/// function is idempotent. Plain numbers are scaled; anything else passes
/// through.
pub fn format_magnitude(text: &str) -> String {
    if text.ends_with('M') || text.ends_with('B') {
        return text.to_string();
    }
    match text.trim().parse::<f64>() {
        Ok(value) if value >= MILLION => format_parameter_count(value),
        _ => text.to_string(),
    }
}

/// Format a raw parameter count: `7.0B`, `135M`, or the bare integer.
pub fn format_parameter_count(raw: f64) -> String {
    if raw >= BILLION {
        format!("{:.1}B", raw / BILLION)
    } else if raw >= MILLION {
        format!("{:.0}M", raw / MILLION)
    } else {
        format!("{:.0}", raw)
    }
}

/// Parse a human byte size such as `"4.07 GiB"`, `"725.57 MB"` or `"512"`.
///
/// Units are matched by their first letter and are always binary.
pub fn parse_byte_size(text: &str) -> Option<u64> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let value: f64 = text[..split].parse().ok()?;
    let unit = text[split..].trim().to_ascii_uppercase();

    let multiplier = match unit.chars().next() {
        None | Some('B') => 1.0,
        Some('K') => KIB,
        Some('M') => MIB,
        Some('G') => GIB,
        Some('T') => TIB,
        Some(_) => return None,
    };
    Some((value * multiplier) as u64)
}

/// Format a byte count the way the variants table shows sizes.
pub fn format_byte_size(bytes: u64) -> String {
    let bytes = bytes as f64;
    if bytes >= GIB {
        format!("{:.2} GB", bytes / GIB)
    } else {
        format!("{:.2} MB", bytes / MIB)
    }
}

/// Format a context window, `-` when unknown.
pub fn format_context_length(length: Option<u32>) -> String {
    match length {
        None | Some(0) => "-".to_string(),
        Some(n) if n >= 1_000_000 => format!("{:.1}M tokens", n as f64 / 1e6),
        Some(n) if n >= 1_000 => format!("{:.1}K tokens", n as f64 / 1e3),
        Some(n) => format!("{} tokens", n),
    }
}

/// Format an estimated VRAM figure in GB, `-` when unknown.
pub fn format_vram(gb: Option<f64>) -> String {
    match gb {
        Some(gb) => format!("{:.2} GB", gb),
        None => "-".to_string(),
    }
}
