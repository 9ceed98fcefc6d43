//! OpenType feature support detection

use tracing::{debug, trace};

use crate::font::probe::{quote_family, width_differs, Prober};
use crate::font::OpenTypeFeature;
use crate::traits::{ProbeError, TextMeasurer};

/// How a feature check was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureVerdict {
    /// Turning the feature on changed the rendered width
    WidthChanged,
    /// The page kept the feature in its computed `font-feature-settings`
    Retained,
    /// No observable effect
    Unchanged,
    /// Body not attached yet; assumed supported rather than blocking
    AssumedNotReady,
}

impl FeatureVerdict {
    pub fn is_supported(self) -> bool {
        !matches!(self, FeatureVerdict::Unchanged)
    }
}

pub fn supports_feature<M: TextMeasurer + ?Sized>(
    prober: &Prober<'_, M>,
    font_family: &str,
    feature: OpenTypeFeature,
) -> bool {
    check_feature(prober, font_family, feature).is_supported()
}

/// Render the sample once with `feature` on and once explicitly off.
///
/// Does not confirm that the family exists; for a missing family the answer
/// describes whatever font the page fell back to.
pub fn check_feature<M: TextMeasurer + ?Sized>(
    prober: &Prober<'_, M>,
    font_family: &str,
    feature: OpenTypeFeature,
) -> FeatureVerdict {
    let family_css = quote_family(font_family);
    let specs = [
        prober.spec(family_css.clone()).with_feature_settings(feature.setting(true)),
        prober.spec(family_css).with_feature_settings(feature.setting(false)),
    ];

    let measured = match prober.measure_many(&prober.config().feature_text, &specs) {
        Ok(measured) => measured,
        Err(ProbeError::NotReady) => {
            trace!("feature {} assumed supported: document not ready", feature);
            return FeatureVerdict::AssumedNotReady;
        }
        Err(e) => {
            debug!("feature probe {} for {:?} failed: {}", feature, font_family, e);
            return FeatureVerdict::AssumedNotReady;
        }
    };
    let (on, off) = (&measured[0], &measured[1]);

    let verdict = if width_differs(on, off, prober.feature_tolerance()) {
        FeatureVerdict::WidthChanged
    } else if settings_retain_tag(&on.computed_feature_settings, &feature.tag()) {
        FeatureVerdict::Retained
    } else {
        FeatureVerdict::Unchanged
    };

    trace!(
        "feature {} on {:?}: {:?} (on={:.2}px off={:.2}px settings={:?})",
        feature, font_family, verdict, on.width, off.width, on.computed_feature_settings
    );
    verdict
}

fn settings_retain_tag(computed: &str, tag: &str) -> bool {
    computed
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .any(|name| name.trim_matches(|c| c == '"' || c == '\'').eq_ignore_ascii_case(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::dummy_backend::{FakeFace, FakeMeasurer};

    fn measurer() -> FakeMeasurer {
        FakeMeasurer::new().with_face(
            FakeFace::new("Garamond Premier", 0.52, 1.2)
                .with_feature("liga", -0.9)
                .with_feature("ss02", 0.0)
                .with_feature("swsh", 1.6)
                .with_feature("ss03", 0.02),
        )
    }

    #[test]
    fn test_small_width_shift_counts_for_features() {
        // 0.02em at 72px is a 1.44px shift
        let m = measurer();
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        assert_eq!(
            check_feature(&prober, "Garamond Premier", OpenTypeFeature::StylisticSet(3)),
            FeatureVerdict::WidthChanged
        );

        let coarse = ProbeConfig::new().with_feature_tolerance(2.0);
        let prober = Prober::new(&m, &coarse);
        assert_eq!(
            check_feature(&prober, "Garamond Premier", OpenTypeFeature::StylisticSet(3)),
            FeatureVerdict::Retained
        );
    }

    #[test]
    fn test_width_change_means_supported() {
        let m = measurer();
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        assert_eq!(
            check_feature(&prober, "Garamond Premier", OpenTypeFeature::Ligatures),
            FeatureVerdict::WidthChanged
        );
        assert!(supports_feature(&prober, "Garamond Premier", OpenTypeFeature::Swash));
    }

    #[test]
    fn test_retained_settings_mean_supported() {
        let m = measurer();
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        assert_eq!(
            check_feature(&prober, "Garamond Premier", OpenTypeFeature::StylisticSet(2)),
            FeatureVerdict::Retained
        );
    }

    #[test]
    fn test_unsupported_feature() {
        let m = measurer();
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        assert_eq!(
            check_feature(&prober, "Garamond Premier", OpenTypeFeature::StylisticSet(9)),
            FeatureVerdict::Unchanged
        );
        assert!(!supports_feature(&prober, "Garamond Premier", OpenTypeFeature::DiscretionaryLigatures));
    }

    #[test]
    fn test_fail_open_before_body_exists() {
        let m = measurer().with_body_ready(false);
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        assert_eq!(
            check_feature(&prober, "Garamond Premier", OpenTypeFeature::StylisticSet(9)),
            FeatureVerdict::AssumedNotReady
        );
    }

    #[test]
    fn test_missing_font_does_not_panic() {
        let m = measurer();
        let config = ProbeConfig::default();
        let prober = Prober::new(&m, &config);
        let _ = check_feature(&prober, "Nope", OpenTypeFeature::ContextualAlternates);
        assert_eq!(m.attached_nodes(), 0);
    }

    #[test]
    fn test_settings_retain_tag() {
        assert!(settings_retain_tag("\"ss02\" 1", "ss02"));
        assert!(settings_retain_tag("\"liga\" 0, \"ss02\" 1", "ss02"));
        assert!(!settings_retain_tag("normal", "ss02"));
        assert!(!settings_retain_tag("\"ss12\" 1", "ss02"));
    }
}
