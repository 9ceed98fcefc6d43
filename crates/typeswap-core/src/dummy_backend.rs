//! Dummy backend for testing the probing core without a browser
//!
//! `FakeMeasurer` lays text out from per-face metrics: width is
//! `chars * advance * size`, scaled by the face's weight response and shifted
//! by the width delta of every active feature it supports. Families resolve
//! case-insensitively against registered faces and the three built-in
//! generics; anything unresolved renders in the default sans face. The
//! computed family reports the face that actually rendered.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::font::probe::quote_family;
use crate::traits::{Measurement, ProbeError, ProbeSpec, SettingsStore, StyleError, StyleHost, TextMeasurer};

/// Metrics of one simulated installed face
#[derive(Clone, Debug, PartialEq)]
pub struct FakeFace {
    pub family: String,
    reported_family: Option<String>,
    /// Advance per character, in em
    pub advance: f64,
    /// Line box height, in em
    pub height: f64,
    /// Feature tag and width delta in em when switched on
    features: Vec<(String, f64)>,
    /// Weights with a real design; empty means a single-weight face
    weights: Vec<u16>,
    synthesize_bold: bool,
}

impl FakeFace {
    pub fn new(family: &str, advance: f64, height: f64) -> Self {
        Self {
            family: family.to_string(),
            reported_family: None,
            advance,
            height,
            features: Vec::new(),
            weights: Vec::new(),
            synthesize_bold: false,
        }
    }

    /// Supported feature; a delta of 0.0 is supported but invisible in width
    pub fn with_feature(mut self, tag: &str, width_delta_em: f64) -> Self {
        self.features.push((tag.to_lowercase(), width_delta_em));
        self
    }

    pub fn with_weights(mut self, weights: &[u16]) -> Self {
        self.weights = weights.to_vec();
        self.weights.sort_unstable();
        self
    }

    /// Single-weight face the page fakes bold for at 600 and up
    pub fn with_synthetic_bold(mut self) -> Self {
        self.synthesize_bold = true;
        self
    }

    /// Computed family reports an internal name instead of `family`
    pub fn reporting_family(mut self, name: &str) -> Self {
        self.reported_family = Some(name.to_string());
        self
    }

    fn computed_family(&self) -> &str {
        self.reported_family.as_deref().unwrap_or(&self.family)
    }

    fn feature_delta(&self, tag: &str) -> Option<f64> {
        self.features
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(tag))
            .map(|(_, delta)| *delta)
    }

    fn weight_factor(&self, weight: u16) -> f64 {
        let nearest = self
            .weights
            .iter()
            .copied()
            .min_by_key(|&w| (i32::from(w) - i32::from(weight)).abs());
        match nearest {
            Some(designed) => 1.0 + (f64::from(designed) - 400.0) / 1200.0,
            None if self.synthesize_bold && weight >= 600 => 1.06,
            None => 1.0,
        }
    }
}

/// Deterministic `TextMeasurer`
pub struct FakeMeasurer {
    faces: Vec<FakeFace>,
    monospace: FakeFace,
    sans: FakeFace,
    serif: FakeFace,
    platform_fonts: Vec<String>,
    body_ready: bool,
    dom_failure: bool,
    attached: Cell<usize>,
    peak_attached: Cell<usize>,
    batches: Cell<usize>,
}

impl Default for FakeMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeMeasurer {
    pub fn new() -> Self {
        Self {
            faces: Vec::new(),
            monospace: FakeFace::new("Fake Mono", 0.6, 1.17),
            sans: FakeFace::new("Fake Sans", 0.5, 1.15),
            serif: FakeFace::new("Fake Serif", 0.47, 1.16),
            platform_fonts: Vec::new(),
            body_ready: true,
            dom_failure: false,
            attached: Cell::new(0),
            peak_attached: Cell::new(0),
            batches: Cell::new(0),
        }
    }

    pub fn with_face(mut self, face: FakeFace) -> Self {
        self.faces.push(face);
        self
    }

    pub fn with_body_ready(mut self, ready: bool) -> Self {
        self.body_ready = ready;
        self
    }

    /// Families `document.fonts.check` confirms
    pub fn with_platform_fonts(mut self, families: &[&str]) -> Self {
        self.platform_fonts = families.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Every batch attaches its nodes and then fails
    pub fn with_dom_failure(mut self) -> Self {
        self.dom_failure = true;
        self
    }

    /// Probe nodes currently attached
    pub fn attached_nodes(&self) -> usize {
        self.attached.get()
    }

    pub fn peak_attached_nodes(&self) -> usize {
        self.peak_attached.get()
    }

    /// Number of `measure_batch` calls so far
    pub fn batches(&self) -> usize {
        self.batches.get()
    }

    fn resolve(&self, font_family: &str) -> &FakeFace {
        for entry in font_family.split(',') {
            let name = entry.trim().trim_matches(|c| c == '"' || c == '\'').replace("\\\"", "\"");
            match name.to_lowercase().as_str() {
                "monospace" => return &self.monospace,
                "sans-serif" => return &self.sans,
                "serif" | "cursive" | "fantasy" => return &self.serif,
                _ => {}
            }
            if let Some(face) = self.faces.iter().find(|f| f.family.eq_ignore_ascii_case(&name)) {
                return face;
            }
        }
        &self.sans
    }

    fn lay_out(&self, text: &str, spec: &ProbeSpec) -> Measurement {
        let face = self.resolve(&spec.font_family);
        let chars = text.chars().count() as f64;

        let mut width = chars * face.advance * spec.size_px * face.weight_factor(spec.weight);
        let mut kept = Vec::new();
        for (tag, value) in parse_feature_settings(spec.feature_settings.as_deref().unwrap_or("")) {
            if let Some(delta) = face.feature_delta(&tag) {
                if value != 0 {
                    width += delta * spec.size_px;
                }
                kept.push(format!("\"{tag}\" {value}"));
            }
        }

        Measurement {
            computed_family: face.computed_family().to_string(),
            computed_feature_settings: if kept.is_empty() { "normal".to_string() } else { kept.join(", ") },
            computed_weight: spec.weight,
            width,
            height: face.height * spec.size_px,
        }
    }
}

fn parse_feature_settings(settings: &str) -> Vec<(String, u32)> {
    settings
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let tag = parts.next()?.trim_matches('"').to_lowercase();
            let value = parts.next().map_or(Some(1), |v| v.parse().ok())?;
            (!tag.is_empty() && tag != "normal").then_some((tag, value))
        })
        .collect()
}

impl TextMeasurer for FakeMeasurer {
    fn is_ready(&self) -> bool {
        self.body_ready
    }

    fn measure_batch(&self, text: &str, specs: &[ProbeSpec]) -> Result<Vec<Measurement>, ProbeError> {
        if !self.body_ready {
            return Err(ProbeError::NotReady);
        }
        self.batches.set(self.batches.get() + 1);

        let attached = self.attached.get() + specs.len();
        self.attached.set(attached);
        self.peak_attached.set(self.peak_attached.get().max(attached));

        let result = if self.dom_failure {
            Err(ProbeError::Dom("layout failed".to_string()))
        } else {
            Ok(specs.iter().map(|spec| self.lay_out(text, spec)).collect())
        };

        self.attached.set(self.attached.get() - specs.len());
        result
    }

    fn check_font(&self, font_shorthand: &str) -> Option<bool> {
        Some(
            self.platform_fonts
                .iter()
                .any(|family| font_shorthand.ends_with(&quote_family(family))),
        )
    }
}

/// `StyleHost` that records elements in insertion order
#[derive(Debug, Default)]
pub struct RecordingStyleHost {
    elements: Vec<(String, String)>,
    headless: bool,
    pub inserts: usize,
}

impl RecordingStyleHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document without a `<head>`
    pub fn headless() -> Self {
        Self { headless: true, ..Self::default() }
    }

    /// CSS text of the first element carrying `id`
    pub fn css(&self, id: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|(element_id, _)| element_id == id)
            .map(|(_, css)| css.as_str())
    }
}

impl StyleHost for RecordingStyleHost {
    fn insert_style(&mut self, id: &str, css: &str) -> Result<(), StyleError> {
        if self.headless {
            return Err(StyleError::NoHead);
        }
        self.inserts += 1;
        self.elements.push((id.to_string(), css.to_string()));
        Ok(())
    }

    fn remove_style(&mut self, id: &str) -> usize {
        let before = self.elements.len();
        self.elements.retain(|(element_id, _)| element_id != id);
        before - self.elements.len()
    }

    fn count_styles(&self, id: &str) -> usize {
        self.elements.iter().filter(|(element_id, _)| element_id == id).count()
    }
}

/// In-memory `SettingsStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
    fail_saves: bool,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

impl SettingsStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.value(key))
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), String> {
        if self.fail_saves {
            return Err("storage quota exceeded".to_string());
        }
        self.saves.set(self.saves.get() + 1);
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
