//! Seams between the probing core and the page, storage and messaging
//! platforms. The browser backend implements these with `web-sys`; the
//! dummy backend implements them deterministically for tests.

use crate::protocol::Envelope;

/// Font style for one hidden probe element
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeSpec {
    /// CSS `font-family` value, exactly as it will be assigned
    pub font_family: String,
    pub size_px: f64,
    pub weight: u16,
    pub style: &'static str,
    pub variant: &'static str,
    pub stretch: &'static str,
    /// CSS `font-feature-settings` value, `None` leaves the property unset
    pub feature_settings: Option<String>,
}

impl ProbeSpec {
    pub fn new(font_family: impl Into<String>, size_px: f64) -> Self {
        Self {
            font_family: font_family.into(),
            size_px,
            weight: 400,
            style: "normal",
            variant: "normal",
            stretch: "normal",
            feature_settings: None,
        }
    }

    pub fn with_weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_feature_settings(mut self, settings: impl Into<String>) -> Self {
        self.feature_settings = Some(settings.into());
        self
    }
}

/// What the page reported for one probe element
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub computed_family: String,
    pub computed_feature_settings: String,
    pub computed_weight: u16,
    pub width: f64,
    pub height: f64,
}

/// Error types for probe measurement
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    #[error("Document body not attached yet")]
    NotReady,

    #[error("DOM error: {0}")]
    Dom(String),
}

/// Synchronous text measurement against a live (or simulated) document
pub trait TextMeasurer {
    /// Whether probe elements can be attached right now
    fn is_ready(&self) -> bool;

    /// Render `text` once per spec, force a single layout pass and read back
    /// computed style and box metrics. Every attached node is detached before
    /// returning, on success and on error.
    fn measure_batch(&self, text: &str, specs: &[ProbeSpec]) -> Result<Vec<Measurement>, ProbeError>;

    /// Platform "is this font loaded" primitive (`document.fonts.check`) for a
    /// CSS font shorthand. `None` when the primitive is missing or threw.
    fn check_font(&self, font_shorthand: &str) -> Option<bool>;
}

/// Error types for style element management
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StyleError {
    #[error("No document head to attach style to")]
    NoHead,

    #[error("DOM error: {0}")]
    Dom(String),
}

/// Page `<style>` element management
pub trait StyleHost {
    fn insert_style(&mut self, id: &str, css: &str) -> Result<(), StyleError>;
    /// Remove every element carrying `id`; returns how many were removed
    fn remove_style(&mut self, id: &str) -> usize;
    fn count_styles(&self, id: &str) -> usize;
}

/// Key-value settings storage (`chrome.storage.sync` in the browser)
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    async fn load(&self, key: &str) -> Result<Option<String>, String>;
    async fn save(&self, key: &str, value: &str) -> Result<(), String>;
}

/// One request/response round trip to another extension context
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, envelope: Envelope) -> Result<serde_json::Value, crate::TypeswapError>;
}

/// Tab lookup and delivery used by the background relay
#[allow(async_fn_in_trait)]
pub trait TabRouter {
    async fn active_tab(&self) -> Option<u32>;
    async fn send_to_tab(&self, tab_id: u32, envelope: Envelope) -> Result<serde_json::Value, crate::TypeswapError>;
}
