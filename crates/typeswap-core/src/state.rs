// src/state.rs
//! The user's applied selection and its persistence
//!
//! The selection is independent of what the current font was detected to
//! support; capability results only gate the UI. It is stored as one JSON
//! blob, and anything that fails to parse is treated as absent.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{LETTER_SPACING_MAX_EM, LETTER_SPACING_MIN_EM, LETTER_SPACING_STEP_EM, SWASH_LEVELS_SUPPORTED};
use crate::error::{TypeswapError, TypeswapResult};
use crate::font::{build_font_name, is_valid_stylistic_set, parse_font_name, FontWeight};
use crate::traits::SettingsStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
}

impl TextTransform {
    pub fn css_value(self) -> &'static str {
        match self {
            TextTransform::None => "none",
            TextTransform::Uppercase => "uppercase",
            TextTransform::Lowercase => "lowercase",
        }
    }
}

impl fmt::Display for TextTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_value())
    }
}

impl FromStr for TextTransform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(TextTransform::None),
            "uppercase" => Ok(TextTransform::Uppercase),
            "lowercase" => Ok(TextTransform::Lowercase),
            _ => Err(format!("unknown text transform: {s}")),
        }
    }
}

/// Applied style selection, persisted under one storage key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleSelection {
    /// Base family, without weight suffix
    pub font_name: String,
    pub font_weight: FontWeight,
    pub text_transform: TextTransform,
    pub stylistic_sets: BTreeSet<u8>,
    pub swash_level: u8,
    pub liga: bool,
    pub dlig: bool,
    pub calt: bool,
    /// Element selectors the rule is scoped to; empty means every element
    pub text_styles: BTreeSet<String>,
    /// Tracking in em
    pub letter_spacing: f32,
    /// Full name, suffix included, of the font applied before this one
    #[serde(alias = "lastFontName", skip_serializing_if = "Option::is_none")]
    pub previous_font_name: Option<String>,
}

impl Default for StyleSelection {
    fn default() -> Self {
        Self {
            font_name: String::new(),
            font_weight: FontWeight::Regular,
            text_transform: TextTransform::None,
            stylistic_sets: BTreeSet::new(),
            swash_level: 0,
            liga: true,
            dlig: false,
            calt: true,
            text_styles: BTreeSet::new(),
            letter_spacing: 0.0,
            previous_font_name: None,
        }
    }
}

impl StyleSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, font_name: &str, weight: FontWeight) -> Self {
        self.font_name = font_name.trim().to_string();
        self.font_weight = weight;
        self
    }

    pub fn has_font(&self) -> bool {
        !self.font_name.trim().is_empty()
    }

    /// `base-weight`, suffix always present so parsing it back is exact
    pub fn full_font_name(&self) -> String {
        if !self.has_font() {
            return String::new();
        }
        build_font_name(&self.font_name, Some(self.font_weight))
    }

    pub fn toggle_stylistic_set(&mut self, n: u8) -> TypeswapResult<bool> {
        if !is_valid_stylistic_set(n) {
            return Err(invalid("stylisticSets", n));
        }
        let now_on = if self.stylistic_sets.remove(&n) {
            false
        } else {
            self.stylistic_sets.insert(n)
        };
        Ok(now_on)
    }

    pub fn set_swash_level(&mut self, level: u8) -> TypeswapResult<()> {
        if !SWASH_LEVELS_SUPPORTED.contains(&level) {
            return Err(invalid("swashLevel", level));
        }
        self.swash_level = level;
        Ok(())
    }

    /// Clamp to the slider range and snap to its step
    pub fn set_letter_spacing(&mut self, em: f32) {
        self.letter_spacing = snap_letter_spacing(em);
    }

    pub fn toggle_text_style(&mut self, selector: &str) -> bool {
        let selector = selector.trim();
        if selector.is_empty() {
            return false;
        }
        if self.text_styles.remove(selector) {
            false
        } else {
            self.text_styles.insert(selector.to_string())
        }
    }

    /// Switch to a new font, remembering the outgoing one in the undo slot
    /// when it differs
    pub fn commit_font(&mut self, font_name: &str, weight: FontWeight) {
        let outgoing = self.full_font_name();
        self.font_name = font_name.trim().to_string();
        self.font_weight = weight;
        if !outgoing.is_empty() && outgoing != self.full_font_name() {
            self.previous_font_name = Some(outgoing);
        }
    }

    /// Swap current and previous fonts. Repeating toggles between the same two
    /// states. Returns `false` when there is nothing to revert to.
    pub fn swap_with_previous(&mut self) -> bool {
        let Some(parsed) = self.previous_font_name.as_deref().and_then(parse_font_name) else {
            return false;
        };
        let outgoing = self.full_font_name();
        self.font_name = parsed.base_name;
        self.font_weight = parsed.weight.unwrap_or_default();
        self.previous_font_name = (!outgoing.is_empty()).then_some(outgoing);
        true
    }

    /// Drop out-of-range values that can only come from an old or edited blob
    pub fn sanitized(mut self) -> Self {
        self.font_name = self.font_name.trim().to_string();
        self.stylistic_sets.retain(|&n| is_valid_stylistic_set(n));
        if !SWASH_LEVELS_SUPPORTED.contains(&self.swash_level) {
            self.swash_level = 0;
        }
        self.letter_spacing = snap_letter_spacing(self.letter_spacing);
        self.text_styles = self
            .text_styles
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    pub fn to_json(&self) -> TypeswapResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored blob; failures yield defaults
    pub fn from_json_or_default(json: &str) -> Self {
        match serde_json::from_str::<StyleSelection>(json) {
            Ok(selection) => selection.sanitized(),
            Err(e) => {
                warn!("stored selection unreadable, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub async fn load<S: SettingsStore + ?Sized>(store: &S, key: &str) -> Self {
        match store.load(key).await {
            Ok(Some(json)) => Self::from_json_or_default(&json),
            Ok(None) => {
                debug!("no stored selection under {:?}", key);
                Self::default()
            }
            Err(message) => {
                warn!("settings load failed: {}", message);
                Self::default()
            }
        }
    }

    pub async fn save<S: SettingsStore + ?Sized>(&self, store: &S, key: &str) -> TypeswapResult<()> {
        let json = self.to_json()?;
        store
            .save(key, &json)
            .await
            .map_err(|message| TypeswapError::Storage { message })
    }
}

fn snap_letter_spacing(em: f32) -> f32 {
    if !em.is_finite() {
        return 0.0;
    }
    let clamped = em.clamp(LETTER_SPACING_MIN_EM, LETTER_SPACING_MAX_EM);
    let snapped = (clamped / LETTER_SPACING_STEP_EM).round() * LETTER_SPACING_STEP_EM;
    // keep two decimals so the CSS text stays stable
    (snapped * 100.0).round() / 100.0
}

fn invalid(field: &str, value: impl fmt::Display) -> TypeswapError {
    TypeswapError::InvalidSelection {
        field: field.to_string(),
        value: value.to_string(),
    }
}
