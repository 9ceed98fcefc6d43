// src/content.rs
//! Page-side request handling: probing and style injection live here

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{ExtensionConfig, ProbeConfig};
use crate::constants::FONT_NOT_FOUND_MESSAGE;
use crate::error::TypeswapError;
use crate::font::{
    detect_capabilities, parse_font_name, resolve_weights, supports_feature, Detection, OpenTypeFeature, Prober,
    WeightQuery,
};
use crate::protocol::{
    CapabilitiesResponse, CheckFeatureSupportPayload, CheckFontWeightsPayload, Envelope, FeatureSupportResponse,
    Request, SuccessResponse, WeightsResponse,
};
use crate::relay::Responder;
use crate::state::StyleSelection;
use crate::style::StyleInjector;
use crate::traits::{SettingsStore, StyleHost, TextMeasurer};

/// Serves protocol requests against one page
pub struct ContentHandler<M: TextMeasurer, H: StyleHost> {
    measurer: M,
    probe_config: ProbeConfig,
    injector: StyleInjector<H>,
    last_applied: Option<StyleSelection>,
}

impl<M: TextMeasurer, H: StyleHost> ContentHandler<M, H> {
    pub fn new(measurer: M, host: H) -> Self {
        Self::with_config(measurer, host, ProbeConfig::default(), &ExtensionConfig::default())
    }

    pub fn with_config(measurer: M, host: H, probe_config: ProbeConfig, extension: &ExtensionConfig) -> Self {
        Self {
            measurer,
            probe_config,
            injector: StyleInjector::new(host, extension),
            last_applied: None,
        }
    }

    pub fn injector(&self) -> &StyleInjector<H> {
        &self.injector
    }

    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    pub fn last_applied(&self) -> Option<&StyleSelection> {
        self.last_applied.as_ref()
    }

    /// Re-apply the stored selection when the page loads
    pub async fn restore<S: SettingsStore + ?Sized>(&mut self, store: &S, key: &str) -> bool {
        let selection = StyleSelection::load(store, key).await;
        if !selection.has_font() {
            debug!("nothing stored to restore");
            return false;
        }
        self.apply(selection).success
    }

    pub fn handle(&mut self, envelope: Envelope) -> Value {
        debug!("content request {}", envelope.kind());
        match envelope.request {
            Request::DetectCapabilities(payload) => to_response(self.detect(&payload.font_name)),
            Request::CheckFontWeights(payload) => to_response(self.check_weights(payload)),
            Request::ApplyFont(selection) => to_response(self.apply(selection)),
            Request::CheckFeatureSupport(payload) => to_response(self.check_feature(&payload)),
            Request::ResetFonts => {
                self.injector.clear();
                to_response(SuccessResponse::ok())
            }
            Request::ResetAll => {
                self.injector.clear();
                self.last_applied = None;
                to_response(SuccessResponse::ok())
            }
            Request::RevertToPreviousFont(payload) => to_response(self.revert(&payload.font_name)),
        }
    }

    fn prober(&self) -> Prober<'_, M> {
        Prober::new(&self.measurer, &self.probe_config)
    }

    fn detect(&self, font_name: &str) -> CapabilitiesResponse {
        match detect_capabilities(&self.prober(), font_name) {
            Detection::Blank(caps) | Detection::Found(caps) => CapabilitiesResponse::found(caps),
            Detection::Missing => CapabilitiesResponse::failed(FONT_NOT_FOUND_MESSAGE),
        }
    }

    fn check_weights(&self, payload: CheckFontWeightsPayload) -> WeightsResponse {
        let mut query = WeightQuery::new(&payload.base_font_name, &payload.weight_suffixes);
        if let Some(typed) = payload.user_typed_font_name.as_deref() {
            query = query.with_user_typed(typed, payload.user_weight_suffix);
        }
        let resolution = resolve_weights(&self.prober(), &query);
        debug!("weight resolution for {:?}: {:?}", query.base_font_name, resolution);
        WeightsResponse::resolved(resolution.available(&query.candidates))
    }

    fn check_feature(&self, payload: &CheckFeatureSupportPayload) -> FeatureSupportResponse {
        let is_supported = match payload.feature.parse::<OpenTypeFeature>() {
            Ok(feature) => supports_feature(&self.prober(), &payload.font_family, feature),
            Err(e) => {
                warn!("{}", e);
                false
            }
        };
        FeatureSupportResponse { is_supported }
    }

    fn apply(&mut self, selection: StyleSelection) -> SuccessResponse {
        match self.injector.apply(&selection) {
            Ok(_) => {
                self.last_applied = selection.has_font().then_some(selection);
                SuccessResponse::ok()
            }
            Err(e) => {
                let err = TypeswapError::from(e);
                warn!("apply failed: {}", err);
                SuccessResponse::failed(&err.to_string())
            }
        }
    }

    /// Re-apply the last selection with its font swapped for `full_font_name`
    fn revert(&mut self, full_font_name: &str) -> SuccessResponse {
        let Some(parsed) = parse_font_name(full_font_name) else {
            return SuccessResponse::failed("No previous font");
        };
        let selection = self
            .last_applied
            .clone()
            .unwrap_or_default()
            .with_font(&parsed.base_name, parsed.weight.unwrap_or_default());
        info!("reverting to {:?}", full_font_name);
        self.apply(selection)
    }
}

impl<M: TextMeasurer, H: StyleHost> Responder for ContentHandler<M, H> {
    async fn respond(&mut self, envelope: Envelope) -> Value {
        self.handle(envelope)
    }
}

fn to_response<T: Serialize>(response: T) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}
