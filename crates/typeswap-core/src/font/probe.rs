//! Probe primitives: hidden-element measurement and comparison helpers

use crate::config::{ProbeConfig, Tolerance};
use crate::constants::GENERIC_FAMILIES;
use crate::font::alnum_key;
use crate::traits::{Measurement, ProbeError, ProbeSpec, TextMeasurer};

/// Quote a family name for use in a CSS `font-family` list
pub fn quote_family(family: &str) -> String {
    let escaped = family.trim().replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Whether a computed `font-family` value starts with a generic keyword
pub fn starts_with_generic(computed_family: &str) -> bool {
    let first = computed_family
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_lowercase();
    GENERIC_FAMILIES.contains(&first.as_str())
}

/// Measurer plus the probe configuration every heuristic shares
pub struct Prober<'a, M: TextMeasurer + ?Sized> {
    measurer: &'a M,
    config: &'a ProbeConfig,
}

impl<'a, M: TextMeasurer + ?Sized> Prober<'a, M> {
    pub fn new(measurer: &'a M, config: &'a ProbeConfig) -> Self {
        Self { measurer, config }
    }

    pub fn config(&self) -> &ProbeConfig {
        self.config
    }

    pub fn tolerance(&self) -> Tolerance {
        self.config.tolerance
    }

    pub fn feature_tolerance(&self) -> Tolerance {
        self.config.feature_tolerance
    }

    pub fn is_ready(&self) -> bool {
        self.measurer.is_ready()
    }

    /// Spec for `family_css` at the configured probe size
    pub fn spec(&self, family_css: impl Into<String>) -> ProbeSpec {
        ProbeSpec::new(family_css, self.config.font_size_px)
    }

    /// Platform font check with a size-qualified shorthand, then with an
    /// explicit `normal` weight qualifier
    pub fn platform_reports_font(&self, family: &str) -> bool {
        let quoted = quote_family(family);
        let size = self.config.font_size_px;
        let attempts = [format!("{size}px {quoted}"), format!("normal {size}px {quoted}")];
        attempts
            .iter()
            .any(|shorthand| self.measurer.check_font(shorthand) == Some(true))
    }

    pub fn measure(&self, text: &str, spec: ProbeSpec) -> Result<Measurement, ProbeError> {
        let mut measurements = self.measure_many(text, &[spec])?;
        measurements
            .pop()
            .ok_or_else(|| ProbeError::Dom("measurer returned no result".to_string()))
    }

    /// Measure several specs within one attach/layout/detach cycle
    pub fn measure_many(&self, text: &str, specs: &[ProbeSpec]) -> Result<Vec<Measurement>, ProbeError> {
        if !self.measurer.is_ready() {
            return Err(ProbeError::NotReady);
        }
        let measurements = self.measurer.measure_batch(text, specs)?;
        if measurements.len() != specs.len() {
            return Err(ProbeError::Dom(format!(
                "expected {} measurements, got {}",
                specs.len(),
                measurements.len()
            )));
        }
        Ok(measurements)
    }
}

/// Width or height differs beyond tolerance
pub fn dimensions_differ(a: &Measurement, b: &Measurement, tolerance: Tolerance) -> bool {
    width_differs(a, b, tolerance) || (a.height - b.height).abs() > tolerance.height_px
}

pub fn width_differs(a: &Measurement, b: &Measurement, tolerance: Tolerance) -> bool {
    (a.width - b.width).abs() > tolerance.width_px
}

/// Whether `computed_family` names `requested` closely enough to count as
/// the requested font: a direct substring, a match with punctuation and
/// spacing stripped, or a match on any single comma-separated entry.
pub fn family_name_matches(computed_family: &str, requested: &str) -> bool {
    let requested_lower = requested.trim().to_lowercase();
    let requested_key = alnum_key(requested);
    if requested_key.is_empty() || starts_with_generic(computed_family) {
        return false;
    }

    let computed_lower = computed_family.to_lowercase();
    if computed_lower.contains(&requested_lower) {
        return true;
    }
    if alnum_key(computed_family).contains(&requested_key) {
        return true;
    }
    computed_family
        .split(',')
        .map(alnum_key)
        .filter(|part| !part.is_empty())
        .any(|part| part == requested_key)
}
