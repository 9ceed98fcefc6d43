//! Capability aggregation: one existence check, then every feature probe

use tracing::{debug, info};

use crate::constants::{STYLISTIC_SET_MAX, STYLISTIC_SET_MIN, SWASH_LEVELS_SUPPORTED, SWASH_LEVELS_UNSUPPORTED};
use crate::font::existence::font_exists;
use crate::font::features::supports_feature;
use crate::font::probe::Prober;
use crate::font::{FontCapabilities, OpenTypeFeature};
use crate::traits::TextMeasurer;

/// Outcome of probing one font name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Blank name: nothing to restrict
    Blank(FontCapabilities),
    Found(FontCapabilities),
    /// Named family does not resolve on this page
    Missing,
}

impl Detection {
    pub fn capabilities(&self) -> Option<&FontCapabilities> {
        match self {
            Detection::Blank(caps) | Detection::Found(caps) => Some(caps),
            Detection::Missing => None,
        }
    }

    pub fn into_capabilities(self) -> Option<FontCapabilities> {
        match self {
            Detection::Blank(caps) | Detection::Found(caps) => Some(caps),
            Detection::Missing => None,
        }
    }
}

pub fn detect_capabilities<M: TextMeasurer + ?Sized>(prober: &Prober<'_, M>, font_name: &str) -> Detection {
    let family = font_name.trim();
    if family.is_empty() {
        return Detection::Blank(FontCapabilities::permissive());
    }
    if !font_exists(prober, family) {
        info!("capability detection: {:?} not found", family);
        return Detection::Missing;
    }

    let stylistic_sets = (STYLISTIC_SET_MIN..=STYLISTIC_SET_MAX)
        .filter(|&n| supports_feature(prober, family, OpenTypeFeature::StylisticSet(n)))
        .collect();
    let swash_levels = if supports_feature(prober, family, OpenTypeFeature::Swash) {
        SWASH_LEVELS_SUPPORTED.to_vec()
    } else {
        SWASH_LEVELS_UNSUPPORTED.to_vec()
    };

    let caps = FontCapabilities {
        stylistic_sets,
        swash_levels,
        supports_ligatures: supports_feature(prober, family, OpenTypeFeature::Ligatures),
        supports_discretionary_ligatures: supports_feature(prober, family, OpenTypeFeature::DiscretionaryLigatures),
        supports_contextual_alternates: supports_feature(prober, family, OpenTypeFeature::ContextualAlternates),
    };
    debug!("capabilities for {:?}: {:?}", family, caps);
    Detection::Found(caps)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::config::ProbeConfig;
    use crate::dummy_backend::{FakeFace, FakeMeasurer};

    #[test]
    fn test_blank_name_is_permissive() {
        let m = FakeMeasurer::new();
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);

        let detection = detect_capabilities(&prober, "");
        let caps = detection.capabilities().unwrap();
        assert!(caps.supports_ligatures);
        assert!(caps.supports_discretionary_ligatures);
        assert!(caps.supports_contextual_alternates);
        assert!(caps.stylistic_sets.is_empty());
        assert!(caps.swash_levels.is_empty());
        assert!(matches!(detection, Detection::Blank(_)));
        assert_eq!(m.peak_attached_nodes(), 0);
    }

    #[test]
    fn test_missing_font() {
        let m = FakeMeasurer::new();
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        assert_eq!(detect_capabilities(&prober, "Nowhere Sans"), Detection::Missing);
    }

    #[test]
    fn test_found_font_reports_probed_features() {
        let m = FakeMeasurer::new().with_face(
            FakeFace::new("Recursive", 0.57, 1.25)
                .with_feature("ss01", 0.3)
                .with_feature("ss05", 0.0)
                .with_feature("swsh", 0.8)
                .with_feature("liga", -0.5)
                .with_feature("calt", 0.0),
        );
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);

        let caps = detect_capabilities(&prober, "Recursive").into_capabilities().unwrap();
        assert_eq!(caps.stylistic_sets, BTreeSet::from([1, 5]));
        assert_eq!(caps.swash_levels, vec![0, 1, 2]);
        assert!(caps.supports_ligatures);
        assert!(!caps.supports_discretionary_ligatures);
        assert!(caps.supports_contextual_alternates);
        assert_eq!(m.attached_nodes(), 0);
    }

    #[test]
    fn test_no_swash_means_level_zero_only() {
        let m = FakeMeasurer::new().with_face(FakeFace::new("Plain Grotesk", 0.54, 1.19));
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);

        let caps = detect_capabilities(&prober, "Plain Grotesk").into_capabilities().unwrap();
        assert_eq!(caps.swash_levels, vec![0]);
        assert!(caps.stylistic_sets.is_empty());
        assert!(!caps.supports_swash());
    }
}
