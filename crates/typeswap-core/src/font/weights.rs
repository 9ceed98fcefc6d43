//! Weight variant resolution
//!
//! Decides which weight suffixes a family can render, either through the CSS
//! weight axis or as separately installed `Family-Weight` families. The
//! policy is ordered: explicit user suffix, CSS-capable family, per-suffix
//! probing, and finally fail-open.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::font::existence::font_exists;
use crate::font::probe::{dimensions_differ, family_name_matches, quote_family, Prober};
use crate::font::{capitalize_font_name, FontWeight};
use crate::traits::TextMeasurer;

/// Inputs to one weight resolution
#[derive(Debug, Clone, PartialEq)]
pub struct WeightQuery {
    pub base_font_name: String,
    pub candidates: Vec<FontWeight>,
    /// Full name as typed, e.g. `"Family-Bold"`
    pub user_typed_font_name: Option<String>,
    /// Suffix parsed from the typed name
    pub user_weight_suffix: Option<FontWeight>,
}

impl WeightQuery {
    pub fn new(base_font_name: &str, candidates: &[FontWeight]) -> Self {
        Self {
            base_font_name: base_font_name.trim().to_string(),
            candidates: candidates.to_vec(),
            user_typed_font_name: None,
            user_weight_suffix: None,
        }
    }

    pub fn with_user_typed(mut self, font_name: &str, suffix: Option<FontWeight>) -> Self {
        self.user_typed_font_name = Some(font_name.trim().to_string());
        self.user_weight_suffix = suffix;
        self
    }

    /// The typed name carries a suffix that is not just the base name again
    fn explicit_request(&self) -> Option<(&str, FontWeight)> {
        let typed = self.user_typed_font_name.as_deref()?;
        let suffix = self.user_weight_suffix?;
        (!typed.is_empty() && typed != self.base_font_name).then_some((typed, suffix))
    }
}

/// Which branch of the policy produced the answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightResolution {
    /// User typed `Family-Weight` and that exact family exists
    ExplicitSuffix(FontWeight),
    /// User typed `Family-Weight` and that exact family does not exist
    ExplicitMissing,
    /// Family responds to the CSS weight axis; every weight is usable
    CssCapable,
    /// Weights confirmed one by one
    PerSuffixProbed(BTreeSet<FontWeight>),
    /// Nothing confirmed; everything enabled rather than nothing
    FailOpen,
}

impl WeightResolution {
    /// Available weights, in candidate order
    pub fn available(&self, candidates: &[FontWeight]) -> Vec<FontWeight> {
        match self {
            WeightResolution::ExplicitSuffix(weight) => vec![*weight],
            WeightResolution::ExplicitMissing => Vec::new(),
            WeightResolution::CssCapable | WeightResolution::FailOpen => candidates.to_vec(),
            WeightResolution::PerSuffixProbed(found) => {
                candidates.iter().copied().filter(|w| found.contains(w)).collect()
            }
        }
    }
}

pub fn resolve_weights<M: TextMeasurer + ?Sized>(prober: &Prober<'_, M>, query: &WeightQuery) -> WeightResolution {
    if let Some((typed, suffix)) = query.explicit_request() {
        return if font_exists(prober, typed) {
            info!("weights for {:?}: trusting typed suffix {}", typed, suffix);
            WeightResolution::ExplicitSuffix(suffix)
        } else {
            info!("weights for {:?}: typed family does not exist", typed);
            WeightResolution::ExplicitMissing
        };
    }

    let base = query.base_font_name.as_str();
    let base_exists = font_exists(prober, base);

    if base_exists && is_css_weight_capable(prober, base) {
        info!("weights for {:?}: family follows CSS font-weight", base);
        return WeightResolution::CssCapable;
    }

    let mut found = BTreeSet::new();
    for &weight in &query.candidates {
        if base_exists && weight_responds(prober, base, weight.css_value()) {
            debug!("weight {} of {:?} available via font-weight {}", weight, base, weight.css_value());
            found.insert(weight);
            continue;
        }
        if let Some(name) = suffixed_family_names(base, weight)
            .into_iter()
            .find(|name| font_exists(prober, name))
        {
            debug!("weight {} of {:?} available as family {:?}", weight, base, name);
            found.insert(weight);
        }
    }

    if found.is_empty() {
        info!("weights for {:?}: nothing confirmed, enabling all", base);
        WeightResolution::FailOpen
    } else {
        info!("weights for {:?}: {} confirmed individually", base, found.len());
        WeightResolution::PerSuffixProbed(found)
    }
}

/// At least `weight_response_threshold` of the probe weights visibly change
/// the family
pub fn is_css_weight_capable<M: TextMeasurer + ?Sized>(prober: &Prober<'_, M>, family: &str) -> bool {
    let config = prober.config();
    let responding = config
        .weight_probe_values
        .iter()
        .filter(|&&weight| weight_responds(prober, family, weight))
        .count();
    debug!(
        "{:?} responds to {}/{} probe weights",
        family,
        responding,
        config.weight_probe_values.len()
    );
    responding >= config.weight_response_threshold
}

/// The family renders as itself at `weight`, and (for anything but 400)
/// renders differently than at 400
pub fn weight_responds<M: TextMeasurer + ?Sized>(prober: &Prober<'_, M>, family: &str, weight: u16) -> bool {
    let config = prober.config();
    let family_css = quote_family(family);
    let mut specs = vec![
        prober.spec(family_css.clone()).with_weight(weight),
        prober.spec(config.monospace_fallback.clone()).with_weight(weight),
    ];
    if weight != 400 {
        specs.push(prober.spec(family_css).with_weight(400));
    }

    let measured = match prober.measure_many(&config.weight_text, &specs) {
        Ok(measured) => measured,
        Err(e) => {
            debug!("weight probe {} for {:?} failed: {}", weight, family, e);
            return false;
        }
    };
    let tolerance = prober.tolerance();
    let (at_weight, mono) = (&measured[0], &measured[1]);

    let renders_as_self =
        family_name_matches(&at_weight.computed_family, family) || dimensions_differ(at_weight, mono, tolerance);
    let differs_from_regular = measured
        .get(2)
        .map_or(true, |regular| dimensions_differ(at_weight, regular, tolerance));

    renders_as_self && differs_from_regular
}

/// Family names a separately installed weight might be registered under
pub fn suffixed_family_names(base: &str, weight: FontWeight) -> Vec<String> {
    let base = base.trim();
    let exact: Vec<String> = weight
        .spellings()
        .chain(std::iter::once(weight.pascal()))
        .flat_map(|spelling| ['-', ' '].map(|separator| format!("{base}{separator}{spelling}")))
        .collect();
    let capitalized: Vec<String> = exact.iter().map(|name| capitalize_font_name(name)).collect();

    let mut names: Vec<String> = Vec::with_capacity(exact.len() * 2);
    for name in exact.into_iter().chain(capitalized) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::dummy_backend::{FakeFace, FakeMeasurer};

    #[test]
    fn test_explicit_suffix_trusted_when_exact_family_exists() {
        let m = FakeMeasurer::new().with_face(FakeFace::new("CustomFont-Bold", 0.64, 1.2));
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        let query = WeightQuery::new("CustomFont", &FontWeight::ALL).with_user_typed("CustomFont-Bold", Some(FontWeight::Bold));

        let resolution = resolve_weights(&prober, &query);
        assert_eq!(resolution, WeightResolution::ExplicitSuffix(FontWeight::Bold));
        assert_eq!(resolution.available(&query.candidates), vec![FontWeight::Bold]);
    }

    #[test]
    fn test_explicit_suffix_missing_family_yields_nothing() {
        let m = FakeMeasurer::new();
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        let query = WeightQuery::new("Ghost", &FontWeight::ALL).with_user_typed("Ghost-Light", Some(FontWeight::Light));

        let resolution = resolve_weights(&prober, &query);
        assert_eq!(resolution, WeightResolution::ExplicitMissing);
        assert!(resolution.available(&query.candidates).is_empty());
    }

    #[test]
    fn test_variable_family_enables_everything() {
        let m = FakeMeasurer::new().with_face(FakeFace::new("Inter", 0.55, 1.21).with_weights(&[100, 200, 300, 400, 500, 600, 700, 800, 900]));
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        let query = WeightQuery::new("Inter", &FontWeight::ALL);

        let resolution = resolve_weights(&prober, &query);
        assert_eq!(resolution, WeightResolution::CssCapable);
        assert_eq!(resolution.available(&query.candidates).len(), 9);
    }

    #[test]
    fn test_per_suffix_probing_finds_named_variants() {
        // single-weight base family with light and black installed separately
        let m = FakeMeasurer::new()
            .with_face(FakeFace::new("Monarch", 0.63, 1.2))
            .with_face(FakeFace::new("Monarch Light", 0.52, 1.2))
            .with_face(FakeFace::new("Monarch-Heavy", 0.7, 1.2));
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        let query = WeightQuery::new("Monarch", &FontWeight::ALL);

        let resolution = resolve_weights(&prober, &query);
        assert_eq!(
            resolution.available(&query.candidates),
            vec![FontWeight::Light, FontWeight::Regular, FontWeight::Black]
        );
        assert_eq!(m.attached_nodes(), 0);
    }

    #[test]
    fn test_fail_open_when_nothing_confirmed() {
        let m = FakeMeasurer::new();
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        let candidates = [FontWeight::Regular, FontWeight::Bold];
        let query = WeightQuery::new("Unknown Family", &candidates);

        let resolution = resolve_weights(&prober, &query);
        assert_eq!(resolution, WeightResolution::FailOpen);
        assert_eq!(resolution.available(&candidates), candidates.to_vec());
    }

    #[test]
    fn test_typed_name_equal_to_base_is_not_explicit() {
        let m = FakeMeasurer::new().with_face(FakeFace::new("Inter", 0.55, 1.21).with_weights(&[400, 700]));
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        let query = WeightQuery::new("Inter", &FontWeight::ALL).with_user_typed("Inter", Some(FontWeight::Bold));
        assert_eq!(resolve_weights(&prober, &query), WeightResolution::CssCapable);
    }

    #[test]
    fn test_suffixed_family_names() {
        let names = suffixed_family_names("monarch", FontWeight::SemiBold);
        assert_eq!(&names[..4], ["monarch-semibold", "monarch semibold", "monarch-demi-bold", "monarch demi-bold"]);
        assert!(names.contains(&"Monarch-Semibold".to_string()));
        assert!(names.contains(&"monarch-SemiBold".to_string()));
        assert!(names.contains(&"Monarch Semibold".to_string()));
        assert_eq!(names.iter().filter(|n| n.as_str() == "Monarch-Semibold").count(), 1);
    }
}
