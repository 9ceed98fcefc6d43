// src/style.rs
//! Style injection: one `!important` override rule per page

use tracing::{debug, info, warn};

use crate::config::ExtensionConfig;
use crate::font::weights::suffixed_family_names;
use crate::font::{capitalize_font_name, quote_family, FontWeight, OpenTypeFeature};
use crate::state::{StyleSelection, TextTransform};
use crate::traits::{StyleError, StyleHost};

const UNIVERSAL_SELECTOR: &str = "*";
const FINAL_FALLBACK: &str = "sans-serif";

/// A derived override rule; identical selections derive identical rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selector: String,
    pub declarations: Vec<(&'static str, String)>,
}

impl StyleRule {
    /// `None` when the selection names no font
    pub fn from_selection(selection: &StyleSelection) -> Option<Self> {
        if !selection.has_font() {
            return None;
        }

        let selector = if selection.text_styles.is_empty() {
            UNIVERSAL_SELECTOR.to_string()
        } else {
            selection.text_styles.iter().cloned().collect::<Vec<_>>().join(", ")
        };

        let mut declarations = vec![
            ("font-family", font_family_stack(&selection.font_name, selection.font_weight).join(", ")),
            ("font-weight", selection.font_weight.css_value().to_string()),
        ];
        if selection.text_transform != TextTransform::None {
            declarations.push(("text-transform", selection.text_transform.css_value().to_string()));
        }
        declarations.push(("font-feature-settings", feature_settings(selection)));
        if selection.letter_spacing != 0.0 {
            declarations.push(("letter-spacing", format!("{}em", selection.letter_spacing)));
        }

        Some(Self { selector, declarations })
    }

    pub fn declaration(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value.as_str())
    }

    pub fn to_css(&self) -> String {
        let body: String = self
            .declarations
            .iter()
            .map(|(name, value)| format!(" {name}: {value} !important;"))
            .collect();
        format!("{} {{{} }}", self.selector, body)
    }
}

/// Quoted `font-family` entries: weight-suffixed names first for non-regular
/// weights, then case and spacing permutations of the base, then the generic
pub fn font_family_stack(font_name: &str, weight: FontWeight) -> Vec<String> {
    let base = font_name.trim();
    let mut names = Vec::new();
    if weight != FontWeight::Regular {
        names.extend(suffixed_family_names(base, weight));
    }
    names.extend([
        base.to_string(),
        capitalize_font_name(base),
        base.to_lowercase(),
        base.replace([' ', '-'], ""),
        base.replace(' ', "-"),
        base.replace('-', " "),
    ]);

    let mut stack: Vec<String> = Vec::with_capacity(names.len() + 1);
    for name in names.iter().filter(|name| !name.is_empty()) {
        let quoted = quote_family(name);
        if !stack.contains(&quoted) {
            stack.push(quoted);
        }
    }
    stack.push(FINAL_FALLBACK.to_string());
    stack
}

/// Active stylistic sets ascending, swash when on, then ligatures,
/// discretionary ligatures and contextual alternates always explicit
pub fn feature_settings(selection: &StyleSelection) -> String {
    let mut entries: Vec<String> = selection
        .stylistic_sets
        .iter()
        .filter_map(|&n| OpenTypeFeature::stylistic_set(n))
        .map(|feature| feature.setting(true))
        .collect();
    if selection.swash_level > 0 {
        entries.push(OpenTypeFeature::Swash.setting(true));
    }
    entries.push(OpenTypeFeature::Ligatures.setting(selection.liga));
    entries.push(OpenTypeFeature::DiscretionaryLigatures.setting(selection.dlig));
    entries.push(OpenTypeFeature::ContextualAlternates.setting(selection.calt));
    entries.join(", ")
}

/// The injected element, as last written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHandle {
    pub element_id: String,
    pub css: String,
}

/// Owns the page's override element. Every apply removes first, so the page
/// never holds more than one.
pub struct StyleInjector<H: StyleHost> {
    host: H,
    element_id: String,
    current: Option<RuleHandle>,
}

impl<H: StyleHost> StyleInjector<H> {
    pub fn new(host: H, config: &ExtensionConfig) -> Self {
        Self {
            host,
            element_id: config.style_element_id.clone(),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&RuleHandle> {
        self.current.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Replace the override rule. A selection without a font clears it.
    pub fn apply(&mut self, selection: &StyleSelection) -> Result<Option<&RuleHandle>, StyleError> {
        let Some(rule) = StyleRule::from_selection(selection) else {
            debug!("empty font name, clearing override");
            self.clear();
            return Ok(None);
        };
        let css = rule.to_css();

        let removed = self.host.remove_style(&self.element_id);
        self.current = None;
        if removed > 1 {
            warn!("found {} override elements, removed all", removed);
        }

        self.host.insert_style(&self.element_id, &css)?;
        info!("override applied for {:?}", selection.font_name);
        self.current = Some(RuleHandle {
            element_id: self.element_id.clone(),
            css,
        });
        Ok(self.current.as_ref())
    }

    /// Remove the override rule; returns whether anything was removed
    pub fn clear(&mut self) -> bool {
        self.current = None;
        let removed = self.host.remove_style(&self.element_id);
        if removed > 0 {
            info!("override cleared");
        }
        removed > 0
    }
}
