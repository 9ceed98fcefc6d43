// src/panel.rs
//! Panel controller: the UI-facing state machine
//!
//! Holds the selection, the last detected capabilities and weights, and the
//! loading/error flags the widgets render from. All state sits in one
//! `RefCell` that is never borrowed across an await. Probe results carry the
//! generation they were requested under and are dropped when a newer request
//! has started since.

use std::cell::RefCell;

use futures_lite::future;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ExtensionConfig;
use crate::constants::FONT_NOT_FOUND_MESSAGE;
use crate::error::TypeswapResult;
use crate::font::{parse_font_name, FontCapabilities, FontWeight, ParsedFontName};
use crate::protocol::{CheckFontWeightsPayload, SuccessResponse};
use crate::relay::FontChannel;
use crate::state::{StyleSelection, TextTransform};
use crate::traits::{SettingsStore, Transport};

/// What the font name field asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontInput {
    /// Blank, or starting with a separator: clear locally
    Clear,
    Commit(ParsedFontName),
}

impl FontInput {
    pub fn classify(raw: &str) -> Self {
        if raw.starts_with(['-', '_', ' ', '\t']) {
            return FontInput::Clear;
        }
        match parse_font_name(raw) {
            Some(parsed) => FontInput::Commit(parsed),
            None => FontInput::Clear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CommitOutcome {
    Applied,
    Cleared,
    NotFound,
    /// A newer font name was committed while this one was probing
    Superseded,
}

/// Snapshot the widgets render from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub selection: StyleSelection,
    pub capabilities: FontCapabilities,
    pub available_weights: Vec<FontWeight>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
struct ProbeResult {
    font_name: String,
    capabilities: FontCapabilities,
    available_weights: Vec<FontWeight>,
}

#[derive(Debug)]
struct PanelState {
    selection: StyleSelection,
    capabilities: FontCapabilities,
    available_weights: Vec<FontWeight>,
    loading: bool,
    error: Option<String>,
    capability_generation: u64,
    weight_generation: u64,
    /// Font name the newest probe was requested for
    pending_font: Option<String>,
    in_flight: usize,
    cache: Option<ProbeResult>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            selection: StyleSelection::default(),
            capabilities: FontCapabilities::permissive(),
            available_weights: FontWeight::ALL.to_vec(),
            loading: false,
            error: None,
            capability_generation: 0,
            weight_generation: 0,
            pending_font: None,
            in_flight: 0,
            cache: None,
        }
    }
}

enum Probe {
    Current(ProbeResult),
    Missing(String),
    Stale,
}

pub struct PanelController<T: Transport, S: SettingsStore> {
    channel: FontChannel<T>,
    store: S,
    storage_key: String,
    state: RefCell<PanelState>,
}

impl<T: Transport, S: SettingsStore> PanelController<T, S> {
    pub fn new(channel: FontChannel<T>, store: S) -> Self {
        Self::with_config(channel, store, &ExtensionConfig::default())
    }

    pub fn with_config(channel: FontChannel<T>, store: S, config: &ExtensionConfig) -> Self {
        Self {
            channel,
            store,
            storage_key: config.storage_key.clone(),
            state: RefCell::new(PanelState::default()),
        }
    }

    pub fn view(&self) -> PanelView {
        let state = self.state.borrow();
        PanelView {
            selection: state.selection.clone(),
            capabilities: state.capabilities.clone(),
            available_weights: state.available_weights.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Restore the persisted selection
    pub async fn load(&self) -> StyleSelection {
        let selection = StyleSelection::load(&self.store, &self.storage_key).await;
        self.state.borrow_mut().selection = selection.clone();
        selection
    }

    /// Commit the font name field (Enter key)
    pub async fn commit_font_name(&self, raw: &str) -> TypeswapResult<CommitOutcome> {
        let parsed = match FontInput::classify(raw) {
            FontInput::Clear => {
                self.clear_font().await;
                return Ok(CommitOutcome::Cleared);
            }
            FontInput::Commit(parsed) => parsed,
        };
        let typed = raw.trim();

        let result = match self.probe(typed, &parsed).await? {
            Probe::Current(result) => result,
            Probe::Missing(message) => {
                let mut state = self.state.borrow_mut();
                state.error = Some(message);
                state.loading = false;
                return Ok(CommitOutcome::NotFound);
            }
            Probe::Stale => return Ok(CommitOutcome::Superseded),
        };

        {
            let mut state = self.state.borrow_mut();
            let weight = parsed
                .weight
                .unwrap_or_else(|| pick_weight(state.selection.font_weight, &result.available_weights));
            state.selection.commit_font(&parsed.base_name, weight);
            state.capabilities = result.capabilities;
            state.available_weights = result.available_weights;
        }
        self.persist().await;
        self.apply_current().await?;
        Ok(CommitOutcome::Applied)
    }

    /// Detect capabilities and weights for `typed` as two joined requests,
    /// reusing the cached result when nothing is in flight
    async fn probe(&self, typed: &str, parsed: &ParsedFontName) -> TypeswapResult<Probe> {
        let (capability_generation, weight_generation) = {
            let mut state = self.state.borrow_mut();
            if state.in_flight == 0 {
                if let Some(cached) = state.cache.as_ref().filter(|c| c.font_name == typed) {
                    debug!("capabilities for {:?} served from cache", typed);
                    let cached = cached.clone();
                    state.error = None;
                    return Ok(Probe::Current(cached));
                }
            }
            state.capability_generation += 1;
            state.weight_generation += 1;
            state.pending_font = Some(typed.to_string());
            state.in_flight += 1;
            state.loading = true;
            state.error = None;
            (state.capability_generation, state.weight_generation)
        };

        let candidates = FontWeight::ALL.to_vec();
        let weights_payload = CheckFontWeightsPayload {
            base_font_name: parsed.base_name.clone(),
            weight_suffixes: candidates.clone(),
            user_typed_font_name: parsed.weight.map(|_| typed.to_string()),
            user_weight_suffix: parsed.weight,
        };
        let (capabilities, weights) = future::zip(
            self.channel.detect_capabilities(typed, capability_generation),
            self.channel.check_font_weights(weights_payload, weight_generation),
        )
        .await;

        let mut state = self.state.borrow_mut();
        state.in_flight -= 1;
        let current = state.capability_generation == capability_generation
            && state.weight_generation == weight_generation
            && state.pending_font.as_deref() == Some(typed);
        if !current {
            debug!("dropping stale probe result for {:?}", typed);
            state.loading = state.in_flight > 0;
            return Ok(Probe::Stale);
        }
        state.loading = false;

        let response = match capabilities {
            Ok(response) => response,
            Err(e) => {
                warn!("capability detection for {:?} failed: {}", typed, e);
                state.error = Some(e.to_string());
                return Err(e);
            }
        };
        let Some(capabilities) = response.capabilities else {
            info!("{:?} not found", typed);
            return Ok(Probe::Missing(
                response.error.unwrap_or_else(|| FONT_NOT_FOUND_MESSAGE.to_string()),
            ));
        };
        let available_weights = weights.unwrap_or_else(|e| {
            warn!("weight check for {:?} failed, allowing all: {}", typed, e);
            candidates
        });

        let result = ProbeResult {
            font_name: typed.to_string(),
            capabilities,
            available_weights,
        };
        state.cache = Some(result.clone());
        Ok(Probe::Current(result))
    }

    /// Clear the font locally; the page override is left to reset
    async fn clear_font(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.selection.font_name.clear();
            state.selection.font_weight = FontWeight::Regular;
            state.capabilities = FontCapabilities::permissive();
            state.available_weights = FontWeight::ALL.to_vec();
            state.pending_font = None;
            state.error = None;
        }
        self.persist().await;
    }

    pub async fn set_weight(&self, weight: FontWeight) -> TypeswapResult<()> {
        self.update(|selection| {
            selection.font_weight = weight;
            Ok(())
        })
        .await
    }

    pub async fn set_text_transform(&self, transform: TextTransform) -> TypeswapResult<()> {
        self.update(|selection| {
            selection.text_transform = transform;
            Ok(())
        })
        .await
    }

    pub async fn toggle_stylistic_set(&self, n: u8) -> TypeswapResult<()> {
        self.update(|selection| selection.toggle_stylistic_set(n).map(|_| ())).await
    }

    pub async fn set_swash_level(&self, level: u8) -> TypeswapResult<()> {
        self.update(|selection| selection.set_swash_level(level)).await
    }

    pub async fn set_ligatures(&self, on: bool) -> TypeswapResult<()> {
        self.update(|selection| {
            selection.liga = on;
            Ok(())
        })
        .await
    }

    pub async fn set_discretionary_ligatures(&self, on: bool) -> TypeswapResult<()> {
        self.update(|selection| {
            selection.dlig = on;
            Ok(())
        })
        .await
    }

    pub async fn set_contextual_alternates(&self, on: bool) -> TypeswapResult<()> {
        self.update(|selection| {
            selection.calt = on;
            Ok(())
        })
        .await
    }

    pub async fn toggle_text_style(&self, selector: &str) -> TypeswapResult<()> {
        self.update(|selection| {
            selection.toggle_text_style(selector);
            Ok(())
        })
        .await
    }

    pub async fn set_letter_spacing(&self, em: f32) -> TypeswapResult<()> {
        self.update(|selection| {
            selection.set_letter_spacing(em);
            Ok(())
        })
        .await
    }

    /// Mutate, persist, and re-apply when a font is set
    async fn update<F>(&self, mutate: F) -> TypeswapResult<()>
    where
        F: FnOnce(&mut StyleSelection) -> TypeswapResult<()>,
    {
        let has_font = {
            let mut state = self.state.borrow_mut();
            mutate(&mut state.selection)?;
            state.selection.has_font()
        };
        self.persist().await;
        if has_font {
            self.apply_current().await?;
        }
        Ok(())
    }

    /// Swap to the previous font. Returns `false` when there is none.
    pub async fn revert_to_previous(&self) -> TypeswapResult<bool> {
        let full_name = {
            let mut state = self.state.borrow_mut();
            if !state.selection.swap_with_previous() {
                return Ok(false);
            }
            state.selection.full_font_name()
        };
        self.persist().await;

        let response = self.guarded(self.channel.revert_to_previous_font(&full_name)).await?;
        self.record_failure(&response);

        if let Some(parsed) = parse_font_name(&full_name) {
            let base = ParsedFontName {
                base_name: parsed.base_name,
                weight: None,
            };
            if let Probe::Current(result) = self.probe(&base.base_name, &base).await? {
                let mut state = self.state.borrow_mut();
                state.capabilities = result.capabilities;
                state.available_weights = result.available_weights;
            }
        }
        Ok(true)
    }

    /// Back to defaults everywhere, page override removed
    pub async fn reset_all(&self) -> TypeswapResult<()> {
        *self.state.borrow_mut() = PanelState::default();
        self.persist().await;
        let response = self.guarded(self.channel.reset_all()).await?;
        self.record_failure(&response);
        Ok(())
    }

    /// Remove the page override, keeping the selection
    pub async fn reset_fonts(&self) -> TypeswapResult<()> {
        let response = self.guarded(self.channel.reset_fonts()).await?;
        self.record_failure(&response);
        Ok(())
    }

    async fn apply_current(&self) -> TypeswapResult<()> {
        let selection = self.state.borrow().selection.clone();
        let response = self.guarded(self.channel.apply_font(&selection)).await?;
        self.record_failure(&response);
        Ok(())
    }

    /// Run a request with the loading flag set; failures become the visible
    /// error
    async fn guarded<F, R>(&self, request: F) -> TypeswapResult<R>
    where
        F: std::future::Future<Output = TypeswapResult<R>>,
    {
        self.state.borrow_mut().loading = true;
        let result = request.await;
        let mut state = self.state.borrow_mut();
        state.loading = state.in_flight > 0;
        if let Err(e) = &result {
            warn!("request failed: {}", e);
            state.error = Some(e.to_string());
        }
        result
    }

    fn record_failure(&self, response: &SuccessResponse) {
        if !response.success {
            let message = response.error.clone().unwrap_or_else(|| "Request failed".to_string());
            self.state.borrow_mut().error = Some(message);
        }
    }

    async fn persist(&self) {
        let selection = self.state.borrow().selection.clone();
        if let Err(e) = selection.save(&self.store, &self.storage_key).await {
            warn!("{}", e);
        }
    }
}

/// Keep the current weight if the new font has it, else regular, else the
/// first available
fn pick_weight(current: FontWeight, available: &[FontWeight]) -> FontWeight {
    if available.is_empty() || available.contains(&current) {
        current
    } else if available.contains(&FontWeight::Regular) {
        FontWeight::Regular
    } else {
        available[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_classification() {
        assert_eq!(FontInput::classify(""), FontInput::Clear);
        assert_eq!(FontInput::classify("   "), FontInput::Clear);
        assert_eq!(FontInput::classify("-bold"), FontInput::Clear);
        assert_eq!(FontInput::classify(" Georgia"), FontInput::Clear);
        assert_eq!(FontInput::classify("_private"), FontInput::Clear);
        assert_eq!(
            FontInput::classify("Georgia-Bold"),
            FontInput::Commit(ParsedFontName {
                base_name: "Georgia".to_string(),
                weight: Some(FontWeight::Bold),
            })
        );
    }

    #[test]
    fn test_pick_weight() {
        assert_eq!(pick_weight(FontWeight::Bold, &FontWeight::ALL), FontWeight::Bold);
        assert_eq!(pick_weight(FontWeight::Bold, &[FontWeight::Light, FontWeight::Regular]), FontWeight::Regular);
        assert_eq!(pick_weight(FontWeight::Bold, &[FontWeight::Black]), FontWeight::Black);
        assert_eq!(pick_weight(FontWeight::Bold, &[]), FontWeight::Bold);
    }
}
