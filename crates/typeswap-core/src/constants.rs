// src/constants.rs

// Probe rendering constants
pub const PROBE_FONT_SIZE_PX: f64 = 72.0;
pub const EXISTENCE_SAMPLE_TEXT: &str = "abcdefghijklmnopqrstuvwxyz0123456789";
pub const FEATURE_SAMPLE_TEXT: &str = "ffi fl ff Th st ct Qu & abcdefghijklmnopqrstuvwxyz 0123456789";
pub const WEIGHT_SAMPLE_TEXT: &str = "Ag";

// Tolerances for existence and weight probes (pixels at PROBE_FONT_SIZE_PX)
pub const WIDTH_TOLERANCE_PX: f64 = 2.0;
pub const HEIGHT_TOLERANCE_PX: f64 = 0.5;

// Feature on/off renders compare the same face, so a smaller shift counts
pub const FEATURE_WIDTH_TOLERANCE_PX: f64 = 1.0;

// Generic families used as substitution references
pub const MONOSPACE_FALLBACK: &str = "monospace";
pub const SANS_SERIF_FALLBACK: &str = "sans-serif";
pub const GENERIC_FAMILIES: [&str; 5] = ["monospace", "sans-serif", "serif", "cursive", "fantasy"];

// CSS weights a family must respond to (at least two) to count as weight-capable
pub const WEIGHT_PROBE_VALUES: [u16; 3] = [400, 700, 800];
pub const WEIGHT_RESPONSE_THRESHOLD: usize = 2;

// OpenType feature ranges
pub const STYLISTIC_SET_MIN: u8 = 1;
pub const STYLISTIC_SET_MAX: u8 = 20;
pub const SWASH_LEVELS_SUPPORTED: [u8; 3] = [0, 1, 2];
pub const SWASH_LEVELS_UNSUPPORTED: [u8; 1] = [0];

// Tracking (letter-spacing) slider range, in em
pub const LETTER_SPACING_MIN_EM: f32 = -0.1;
pub const LETTER_SPACING_MAX_EM: f32 = 0.5;
pub const LETTER_SPACING_STEP_EM: f32 = 0.01;

// Page and storage identifiers
pub const STYLE_ELEMENT_ID: &str = "font-override-style";
pub const SETTINGS_STORAGE_KEY: &str = "appState";
pub const FONT_NOT_FOUND_MESSAGE: &str = "Font not found";
