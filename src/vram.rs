//! VRAM estimate from parameter count, quantization, and KV-cache shape.
//!
//! weights  = params × bytes_per_param / 2^30
//! kv_cache = context × layers × embedding × 2 (K+V) × 2 (f16 bytes) / 2^30
//! total    = (weights + kv_cache) × 1.2

use crate::variant::Hyperparameters;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const OVERHEAD: f64 = 1.2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VramError {
    #[error("Unsupported quantization for VRAM estimate: {0}")]
    UnsupportedQuantization(String),

    #[error("Missing {0} for VRAM estimate")]
    MissingHyperparameter(&'static str),

    #[error("Invalid parameter count {0}")]
    InvalidParameterCount(f64),
}

/// Bytes per weight for a quantization family, matched on the formatted token.
///
/// Checked in the order F16, Q8, Q5, Q4, so `BF16` counts as 16-bit and
/// `IQ2_XXS/Q4_K_M` as 4-bit.
pub fn bytes_per_parameter(quantization: &str) -> Result<f64, VramError> {
    if quantization.contains("F16") {
        Ok(2.0)
    } else if quantization.contains("Q8") {
        Ok(1.0)
    } else if quantization.contains("Q5") {
        Ok(0.68)
    } else if quantization.contains("Q4") {
        Ok(0.6)
    } else {
        Err(VramError::UnsupportedQuantization(quantization.to_string()))
    }
}

/// Estimate VRAM in GB.
///
/// Fails instead of substituting zero when any input is unknown.
pub fn estimate_vram(
    parameters: Option<f64>,
    quantization: Option<&str>,
    hyper: Hyperparameters,
) -> Result<f64, VramError> {
    let quantization = quantization.ok_or(VramError::MissingHyperparameter("quantization"))?;
    let bytes_per_param = bytes_per_parameter(quantization)?;

    let params = parameters.ok_or(VramError::MissingHyperparameter("parameter count"))?;
    if !params.is_finite() || params <= 0.0 {
        return Err(VramError::InvalidParameterCount(params));
    }
    let layers = hyper
        .block_count
        .ok_or(VramError::MissingHyperparameter("block_count"))?;
    let embedding = hyper
        .embedding_length
        .ok_or(VramError::MissingHyperparameter("embedding_length"))?;
    let context = hyper
        .context_length
        .ok_or(VramError::MissingHyperparameter("context_length"))?;

    let weights_gb = params * bytes_per_param / GIB;
    let kv_cache_gb = context as f64 * layers as f64 * embedding as f64 * 2.0 * 2.0 / GIB;

    Ok((weights_gb + kv_cache_gb) * OVERHEAD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llama_7b() -> Hyperparameters {
        Hyperparameters {
            block_count: Some(32),
            embedding_length: Some(4096),
            context_length: Some(4096),
        }
    }

    #[test]
    fn seven_billion_q4_0() {
        let gb = estimate_vram(Some(7e9), Some("Q4_0"), llama_7b()).unwrap();
        // weights 3.91 GB + kv cache 2.0 GB, plus 20%
        let expected = (7e9 * 0.6 / GIB + 2.0) * 1.2;
        assert!((gb - expected).abs() < 1e-9);
        assert!((gb - 7.09).abs() < 0.05, "got {}", gb);
    }

    #[test]
    fn families_pick_expected_multipliers() {
        assert_eq!(bytes_per_parameter("F16"), Ok(2.0));
        assert_eq!(bytes_per_parameter("BF16"), Ok(2.0));
        assert_eq!(bytes_per_parameter("Q8_0"), Ok(1.0));
        assert_eq!(bytes_per_parameter("Q5_K_M"), Ok(0.68));
        assert_eq!(bytes_per_parameter("IQ2_XXS/Q4_K_M"), Ok(0.6));
    }

    #[test]
    fn unknown_quantization_is_an_error_not_zero() {
        let err = estimate_vram(Some(7e9), Some("XQ9"), llama_7b()).unwrap_err();
        assert_eq!(err, VramError::UnsupportedQuantization("XQ9".into()));
    }

    #[test]
    fn missing_hyperparameters_fail() {
        let mut hp = llama_7b();
        hp.embedding_length = None;
        assert_eq!(
            estimate_vram(Some(7e9), Some("F16"), hp),
            Err(VramError::MissingHyperparameter("embedding_length"))
        );
        assert_eq!(
            estimate_vram(None, Some("F16"), llama_7b()),
            Err(VramError::MissingHyperparameter("parameter count"))
        );
        assert_eq!(
            estimate_vram(Some(7e9), None, llama_7b()),
            Err(VramError::MissingHyperparameter("quantization"))
        );
    }

    #[test]
    fn large_kv_cache_does_not_overflow() {
        let hp = Hyperparameters {
            block_count: Some(80),
            embedding_length: Some(8192),
            context_length: Some(131_072),
        };
        let gb = estimate_vram(Some(70e9), Some("Q4_K_M"), hp).unwrap();
        // kv cache alone is 320 GB here
        assert!(gb > 320.0);
    }
}
