//! Font capability probing
//!
//! Everything here infers what a font can do from rendering text in hidden
//! elements. No font file is ever read: existence, OpenType feature support
//! and weight variants all come from comparing measurements.

pub mod capabilities;
pub mod existence;
pub mod features;
pub mod probe;
pub mod weights;

pub use capabilities::{detect_capabilities, Detection};
pub use existence::{check_existence, font_exists, ExistenceVerdict};
pub use features::{check_feature, supports_feature, FeatureVerdict};
pub use probe::{quote_family, Prober};
pub use weights::{resolve_weights, WeightQuery, WeightResolution};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{STYLISTIC_SET_MAX, STYLISTIC_SET_MIN};

/// Named weight variants, addressable either through CSS `font-weight` or as
/// a family-name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[serde(alias = "hairline")]
    Thin,
    #[serde(alias = "ultra-light")]
    ExtraLight,
    Light,
    #[default]
    #[serde(alias = "normal")]
    Regular,
    Medium,
    #[serde(alias = "demi-bold")]
    SemiBold,
    Bold,
    #[serde(alias = "ultra-bold")]
    ExtraBold,
    #[serde(alias = "heavy")]
    Black,
}

impl FontWeight {
    pub const ALL: [FontWeight; 9] = [
        FontWeight::Thin,
        FontWeight::ExtraLight,
        FontWeight::Light,
        FontWeight::Regular,
        FontWeight::Medium,
        FontWeight::SemiBold,
        FontWeight::Bold,
        FontWeight::ExtraBold,
        FontWeight::Black,
    ];

    /// Canonical suffix token
    pub fn token(self) -> &'static str {
        match self {
            FontWeight::Thin => "thin",
            FontWeight::ExtraLight => "extralight",
            FontWeight::Light => "light",
            FontWeight::Regular => "regular",
            FontWeight::Medium => "medium",
            FontWeight::SemiBold => "semibold",
            FontWeight::Bold => "bold",
            FontWeight::ExtraBold => "extrabold",
            FontWeight::Black => "black",
        }
    }

    /// Historical spellings that name the same weight
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            FontWeight::Thin => &["hairline"],
            FontWeight::ExtraLight => &["ultra-light"],
            FontWeight::Regular => &["normal"],
            FontWeight::SemiBold => &["demi-bold"],
            FontWeight::ExtraBold => &["ultra-bold"],
            FontWeight::Black => &["heavy"],
            FontWeight::Light | FontWeight::Medium | FontWeight::Bold => &[],
        }
    }

    /// PascalCase spelling as it tends to appear in installed family names
    pub fn pascal(self) -> &'static str {
        match self {
            FontWeight::Thin => "Thin",
            FontWeight::ExtraLight => "ExtraLight",
            FontWeight::Light => "Light",
            FontWeight::Regular => "Regular",
            FontWeight::Medium => "Medium",
            FontWeight::SemiBold => "SemiBold",
            FontWeight::Bold => "Bold",
            FontWeight::ExtraBold => "ExtraBold",
            FontWeight::Black => "Black",
        }
    }

    /// Numeric CSS weight
    pub fn css_value(self) -> u16 {
        match self {
            FontWeight::Thin => 100,
            FontWeight::ExtraLight => 200,
            FontWeight::Light => 300,
            FontWeight::Regular => 400,
            FontWeight::Medium => 500,
            FontWeight::SemiBold => 600,
            FontWeight::Bold => 700,
            FontWeight::ExtraBold => 800,
            FontWeight::Black => 900,
        }
    }

    /// Every spelling accepted for this weight, canonical first
    pub fn spellings(self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.token()).chain(self.aliases().iter().copied())
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for FontWeight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        FontWeight::ALL
            .into_iter()
            .find(|w| w.spellings().any(|spelling| spelling == lower))
            .ok_or_else(|| format!("unknown font weight: {s}"))
    }
}

/// OpenType feature tags the extension can toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenTypeFeature {
    Ligatures,
    DiscretionaryLigatures,
    ContextualAlternates,
    Swash,
    /// `ss01`..`ss20`
    StylisticSet(u8),
}

impl OpenTypeFeature {
    pub fn stylistic_set(n: u8) -> Option<Self> {
        is_valid_stylistic_set(n).then_some(OpenTypeFeature::StylisticSet(n))
    }

    pub fn tag(self) -> String {
        match self {
            OpenTypeFeature::Ligatures => "liga".to_string(),
            OpenTypeFeature::DiscretionaryLigatures => "dlig".to_string(),
            OpenTypeFeature::ContextualAlternates => "calt".to_string(),
            OpenTypeFeature::Swash => "swsh".to_string(),
            OpenTypeFeature::StylisticSet(n) => format!("ss{n:02}"),
        }
    }

    /// `font-feature-settings` entry with the given value
    pub fn setting(self, on: bool) -> String {
        format!("\"{}\" {}", self.tag(), u8::from(on))
    }
}

impl fmt::Display for OpenTypeFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for OpenTypeFeature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().trim_matches('"').to_lowercase();
        match tag.as_str() {
            "liga" => Ok(OpenTypeFeature::Ligatures),
            "dlig" => Ok(OpenTypeFeature::DiscretionaryLigatures),
            "calt" => Ok(OpenTypeFeature::ContextualAlternates),
            "swsh" => Ok(OpenTypeFeature::Swash),
            _ => tag
                .strip_prefix("ss")
                .filter(|digits| digits.len() == 2)
                .and_then(|digits| digits.parse::<u8>().ok())
                .and_then(OpenTypeFeature::stylistic_set)
                .ok_or_else(|| format!("unsupported feature tag: {s}")),
        }
    }
}

pub fn is_valid_stylistic_set(n: u8) -> bool {
    (STYLISTIC_SET_MIN..=STYLISTIC_SET_MAX).contains(&n)
}

/// Detected capability ceiling for one font name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontCapabilities {
    #[serde(rename = "ss")]
    pub stylistic_sets: BTreeSet<u8>,
    #[serde(rename = "swashLevels")]
    pub swash_levels: Vec<u8>,
    #[serde(rename = "supportsLIGA")]
    pub supports_ligatures: bool,
    #[serde(rename = "supportsDLIG")]
    pub supports_discretionary_ligatures: bool,
    #[serde(rename = "supportsCALT")]
    pub supports_contextual_alternates: bool,
}

impl FontCapabilities {
    /// Nothing probed, nothing restricted
    pub fn permissive() -> Self {
        Self {
            stylistic_sets: BTreeSet::new(),
            swash_levels: Vec::new(),
            supports_ligatures: true,
            supports_discretionary_ligatures: true,
            supports_contextual_alternates: true,
        }
    }

    pub fn supports_swash(&self) -> bool {
        self.swash_levels.iter().any(|&level| level > 0)
    }
}

impl Default for FontCapabilities {
    fn default() -> Self {
        Self::permissive()
    }
}

/// A typed font name split into family and optional weight suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFontName {
    pub base_name: String,
    pub weight: Option<FontWeight>,
}

/// Split `"Family-Bold"` / `"Family Bold"` into base name and weight.
/// Longer suffixes are tried first so `ultra-light` wins over `light`.
/// Returns `None` for blank input.
pub fn parse_font_name(font_name: &str) -> Option<ParsedFontName> {
    let trimmed = font_name.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();

    let mut spellings: Vec<(&'static str, FontWeight)> = FontWeight::ALL
        .into_iter()
        .flat_map(|w| w.spellings().map(move |s| (s, w)))
        .collect();
    spellings.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    for (suffix, weight) in spellings {
        for separator in ['-', ' '] {
            let pattern = format!("{separator}{suffix}");
            if lower.ends_with(&pattern) {
                // lowercasing can change byte lengths outside ASCII
                let Some(base) = trimmed
                    .len()
                    .checked_sub(pattern.len())
                    .and_then(|end| trimmed.get(..end))
                else {
                    continue;
                };
                let base = base.trim();
                if !base.is_empty() {
                    return Some(ParsedFontName {
                        base_name: base.to_string(),
                        weight: Some(weight),
                    });
                }
            }
        }
    }

    Some(ParsedFontName {
        base_name: trimmed.to_string(),
        weight: None,
    })
}

/// `base-suffix`, hyphen separated
pub fn build_font_name(base_name: &str, weight: Option<FontWeight>) -> String {
    match weight {
        Some(weight) => format!("{}-{}", base_name.trim(), weight.token()),
        None => base_name.trim().to_string(),
    }
}

/// Capitalise each space or hyphen separated part, keeping the separator
/// style of the input
pub fn capitalize_font_name(font_name: &str) -> String {
    let separator = if font_name.contains('-') { "-" } else { " " };
    font_name
        .split(|c: char| c == ' ' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(separator)
}

/// Lowercase alphanumerics only, for loose family-name comparison
pub fn alnum_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
