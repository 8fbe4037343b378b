//! Orchestrator policy configuration.

use redact_models::ReplaceBackend;

/// Policy knobs for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    /// Minimum drag extent (percent of surface) a region must exceed on both axes
    pub min_region_percent: f64,
    /// Backend used when a suggestion asks for a generic "replace"
    pub default_replace_backend: ReplaceBackend,
    /// Blur/pixelate strength when the caller does not pick one
    pub default_blur_strength: u32,
    /// Mask overlay color
    pub mask_color: String,
    /// Mask overlay opacity (0.0-1.0)
    pub mask_opacity: f64,
    /// Output duration requested from the text-only backend, in seconds
    pub text_replace_duration: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            min_region_percent: 1.0,
            default_replace_backend: ReplaceBackend::TextOnly,
            default_blur_strength: 25,
            mask_color: "#000000".to_string(),
            mask_opacity: 1.0,
            text_replace_duration: 5,
        }
    }
}

impl CoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_region_percent: std::env::var("REDACT_MIN_REGION_PERCENT")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.min_region_percent),
            default_replace_backend: std::env::var("REDACT_DEFAULT_REPLACE_BACKEND")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_replace_backend),
            default_blur_strength: std::env::var("REDACT_DEFAULT_BLUR_STRENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.default_blur_strength),
            mask_color: std::env::var("REDACT_MASK_COLOR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.mask_color),
            mask_opacity: std::env::var("REDACT_MASK_OPACITY")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| (0.0..=1.0).contains(v))
                .unwrap_or(defaults.mask_opacity),
            text_replace_duration: std::env::var("REDACT_TEXT_REPLACE_DURATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.text_replace_duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "REDACT_MIN_REGION_PERCENT",
        "REDACT_DEFAULT_REPLACE_BACKEND",
        "REDACT_DEFAULT_BLUR_STRENGTH",
        "REDACT_MASK_COLOR",
        "REDACT_MASK_OPACITY",
        "REDACT_TEXT_REPLACE_DURATION",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        assert_eq!(CoreConfig::from_env(), CoreConfig::default());
        assert_eq!(CoreConfig::default().min_region_percent, 1.0);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("REDACT_MIN_REGION_PERCENT", "0.5");
        std::env::set_var("REDACT_DEFAULT_REPLACE_BACKEND", "mask-inpaint");
        std::env::set_var("REDACT_MASK_OPACITY", "0.6");
        let config = CoreConfig::from_env();
        assert_eq!(config.min_region_percent, 0.5);
        assert_eq!(config.default_replace_backend, ReplaceBackend::MaskInpaint);
        assert_eq!(config.mask_opacity, 0.6);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("REDACT_MIN_REGION_PERCENT", "-3");
        std::env::set_var("REDACT_MASK_OPACITY", "1.7");
        std::env::set_var("REDACT_DEFAULT_BLUR_STRENGTH", "zero");
        let config = CoreConfig::from_env();
        assert_eq!(config.min_region_percent, 1.0);
        assert_eq!(config.mask_opacity, 1.0);
        assert_eq!(config.default_blur_strength, 25);
        clear_env();
    }
}
