//! Existence detection: is a named family actually resolved by the page,
//! or silently replaced by a default?

use tracing::{debug, trace};

use crate::font::probe::{dimensions_differ, family_name_matches, quote_family, Prober};
use crate::traits::{ProbeError, TextMeasurer};

/// How an existence check was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistenceVerdict {
    /// Empty or whitespace-only name
    Blank,
    /// `document.fonts.check` answered yes
    Platform,
    /// Computed family names the requested font
    NameMatch,
    /// No name evidence, but metrics differ from both generic fallbacks
    Dimensions,
    /// Computed family is identical to a fallback's
    Substituted,
    /// Neither name nor metrics point at the requested font
    Fallback,
    /// Body missing or measurement failed
    NotReady,
}

impl ExistenceVerdict {
    pub fn exists(self) -> bool {
        matches!(
            self,
            ExistenceVerdict::Platform | ExistenceVerdict::NameMatch | ExistenceVerdict::Dimensions
        )
    }
}

pub fn font_exists<M: TextMeasurer + ?Sized>(prober: &Prober<'_, M>, font_family: &str) -> bool {
    check_existence(prober, font_family).exists()
}

/// Decide whether `font_family` is installed.
///
/// The candidate is rendered with no fallback appended, next to forced
/// `monospace` and `sans-serif` renderings. It exists when its computed
/// family names it or its metrics differ from both fallbacks, unless its
/// computed family is identical to one of theirs.
pub fn check_existence<M: TextMeasurer + ?Sized>(prober: &Prober<'_, M>, font_family: &str) -> ExistenceVerdict {
    let family = font_family.trim();
    if family.is_empty() {
        return ExistenceVerdict::Blank;
    }

    if prober.platform_reports_font(family) {
        trace!("platform font check confirmed {:?}", family);
        return ExistenceVerdict::Platform;
    }

    let config = prober.config();
    let specs = [
        prober.spec(quote_family(family)),
        prober.spec(config.monospace_fallback.clone()),
        prober.spec(config.sans_fallback.clone()),
    ];
    let measured = match prober.measure_many(&config.existence_text, &specs) {
        Ok(measured) => measured,
        Err(ProbeError::NotReady) => return ExistenceVerdict::NotReady,
        Err(e) => {
            debug!("existence probe for {:?} failed: {}", family, e);
            return ExistenceVerdict::NotReady;
        }
    };
    let (candidate, mono, sans) = (&measured[0], &measured[1], &measured[2]);

    let has_name = family_name_matches(&candidate.computed_family, family);
    let tolerance = prober.tolerance();
    let dims_differ = dimensions_differ(candidate, mono, tolerance) && dimensions_differ(candidate, sans, tolerance);
    let substituted = candidate.computed_family.eq_ignore_ascii_case(&mono.computed_family)
        || candidate.computed_family.eq_ignore_ascii_case(&sans.computed_family);

    let verdict = if substituted {
        ExistenceVerdict::Substituted
    } else if has_name {
        ExistenceVerdict::NameMatch
    } else if dims_differ {
        ExistenceVerdict::Dimensions
    } else {
        ExistenceVerdict::Fallback
    };

    debug!(
        "existence {:?}: {:?} (name={}, dims={}, computed={:?}, mono={:?}, sans={:?})",
        family, verdict, has_name, dims_differ, candidate.computed_family, mono.computed_family, sans.computed_family
    );
    verdict
}
