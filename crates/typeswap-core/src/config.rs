// src/config.rs
use crate::constants::{
    EXISTENCE_SAMPLE_TEXT, FEATURE_SAMPLE_TEXT, FEATURE_WIDTH_TOLERANCE_PX, HEIGHT_TOLERANCE_PX, MONOSPACE_FALLBACK,
    PROBE_FONT_SIZE_PX, SANS_SERIF_FALLBACK, SETTINGS_STORAGE_KEY, STYLE_ELEMENT_ID,
    WEIGHT_PROBE_VALUES, WEIGHT_RESPONSE_THRESHOLD, WEIGHT_SAMPLE_TEXT, WIDTH_TOLERANCE_PX,
};

/// Pixel tolerance used when comparing two measurements
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance {
    pub width_px: f64,
    pub height_px: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            width_px: WIDTH_TOLERANCE_PX,
            height_px: HEIGHT_TOLERANCE_PX,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProbeConfig {
    pub font_size_px: f64,
    pub existence_text: String,
    pub feature_text: String,
    pub weight_text: String,
    pub monospace_fallback: String,
    pub sans_fallback: String,
    pub tolerance: Tolerance,
    /// Width change that marks a feature as active
    pub feature_tolerance: Tolerance,
    pub weight_probe_values: Vec<u16>,
    /// How many of `weight_probe_values` must respond before a family is
    /// treated as weight-axis capable
    pub weight_response_threshold: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            font_size_px: PROBE_FONT_SIZE_PX,
            existence_text: EXISTENCE_SAMPLE_TEXT.to_string(),
            feature_text: FEATURE_SAMPLE_TEXT.to_string(),
            weight_text: WEIGHT_SAMPLE_TEXT.to_string(),
            monospace_fallback: MONOSPACE_FALLBACK.to_string(),
            sans_fallback: SANS_SERIF_FALLBACK.to_string(),
            tolerance: Tolerance::default(),
            feature_tolerance: Tolerance {
                width_px: FEATURE_WIDTH_TOLERANCE_PX,
                height_px: HEIGHT_TOLERANCE_PX,
            },
            weight_probe_values: WEIGHT_PROBE_VALUES.to_vec(),
            weight_response_threshold: WEIGHT_RESPONSE_THRESHOLD,
        }
    }
}

impl ProbeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font_size(mut self, size_px: f64) -> Self {
        self.font_size_px = size_px;
        self
    }

    pub fn with_tolerance(mut self, width_px: f64, height_px: f64) -> Self {
        self.tolerance = Tolerance {
            width_px: width_px.max(0.0),
            height_px: height_px.max(0.0),
        };
        self
    }

    pub fn with_feature_tolerance(mut self, width_px: f64) -> Self {
        self.feature_tolerance.width_px = width_px.max(0.0);
        self
    }

    pub fn with_existence_text(mut self, text: &str) -> Self {
        self.existence_text = text.to_string();
        self
    }

    pub fn with_feature_text(mut self, text: &str) -> Self {
        self.feature_text = text.to_string();
        self
    }

    pub fn with_weight_probe_values(mut self, values: &[u16], threshold: usize) -> Self {
        self.weight_probe_values = values.to_vec();
        self.weight_response_threshold = threshold.max(1);
        self
    }
}

/// Identifiers shared by the page, background and panel contexts
#[derive(Clone, Debug)]
pub struct ExtensionConfig {
    pub style_element_id: String,
    pub storage_key: String,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            style_element_id: STYLE_ELEMENT_ID.to_string(),
            storage_key: SETTINGS_STORAGE_KEY.to_string(),
        }
    }
}

impl ExtensionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style_element_id(mut self, id: &str) -> Self {
        self.style_element_id = id.to_string();
        self
    }

    pub fn with_storage_key(mut self, key: &str) -> Self {
        self.storage_key = key.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tolerance_is_shared() {
        let config = ProbeConfig::default();
        assert_eq!(config.tolerance.width_px, 2.0);
        assert_eq!(config.tolerance.height_px, 0.5);
        assert_eq!(config.weight_probe_values, vec![400, 700, 800]);
    }

    #[test]
    fn test_builder_clamps_negative_tolerance() {
        let config = ProbeConfig::new().with_tolerance(-1.0, 3.0);
        assert_eq!(config.tolerance.width_px, 0.0);
        assert_eq!(config.tolerance.height_px, 3.0);
    }

    #[test]
    fn test_weight_threshold_never_zero() {
        let config = ProbeConfig::new().with_weight_probe_values(&[400, 700], 0);
        assert_eq!(config.weight_response_threshold, 1);
    }
}
