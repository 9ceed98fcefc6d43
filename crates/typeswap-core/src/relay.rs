// src/relay.rs
//! Typed request/response channel between extension contexts
//!
//! `FontChannel` wraps any `Transport` with one method per request type and
//! decodes each response into its typed shape. `LocalTransport` carries
//! envelopes to a `Responder` over `async-channel`, which is how contexts are
//! wired together in-process.

use async_channel::{Receiver, Sender};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{TypeswapError, TypeswapResult};
use crate::font::FontWeight;
use crate::protocol::{
    CapabilitiesResponse, CheckFeatureSupportPayload, CheckFontWeightsPayload, DetectCapabilitiesPayload, Envelope,
    FeatureSupportResponse, Request, RevertPayload, SuccessResponse, WeightsResponse,
};
use crate::state::StyleSelection;
use crate::traits::Transport;

/// Something that answers envelopes: the content handler or the background
/// relay
#[allow(async_fn_in_trait)]
pub trait Responder {
    async fn respond(&mut self, envelope: Envelope) -> Value;
}

type Exchange = (Envelope, Sender<Value>);

/// In-process `Transport` backed by an unbounded request queue
#[derive(Clone)]
pub struct LocalTransport {
    destination: String,
    requests: Sender<Exchange>,
}

/// Receiving end of a `LocalTransport`
pub struct LocalEndpoint {
    requests: Receiver<Exchange>,
}

/// Connected transport/endpoint pair
pub fn local_channel(destination: &str) -> (LocalTransport, LocalEndpoint) {
    let (tx, rx) = async_channel::unbounded::<Exchange>();
    (
        LocalTransport {
            destination: destination.to_string(),
            requests: tx,
        },
        LocalEndpoint { requests: rx },
    )
}

impl Transport for LocalTransport {
    async fn send(&self, envelope: Envelope) -> Result<Value, TypeswapError> {
        let kind = envelope.kind();
        let (reply_tx, reply_rx) = async_channel::bounded::<Value>(1);
        self.requests
            .send((envelope, reply_tx))
            .await
            .map_err(|_| TypeswapError::ChannelClosed {
                destination: self.destination.clone(),
            })?;
        reply_rx.recv().await.map_err(|_| TypeswapError::NoResponder {
            request: kind.to_string(),
        })
    }
}

impl LocalEndpoint {
    /// Answer one pending request. Returns `false` once every transport is gone.
    pub async fn serve_one<R: Responder + ?Sized>(&self, responder: &mut R) -> bool {
        let Ok((envelope, reply)) = self.requests.recv().await else {
            return false;
        };
        let kind = envelope.kind();
        trace!("serving {}", kind);
        let response = responder.respond(envelope).await;
        if reply.send(response).await.is_err() {
            debug!("requester for {} went away before the reply", kind);
        }
        true
    }

    /// Answer requests until every transport is dropped
    pub async fn serve<R: Responder + ?Sized>(&self, responder: &mut R) {
        while self.serve_one(responder).await {}
        debug!("local endpoint closed");
    }
}

/// Typed client for the request protocol
pub struct FontChannel<T: Transport> {
    transport: T,
    tab_id: Option<u32>,
}

impl<T: Transport> FontChannel<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, tab_id: None }
    }

    /// Address every request to a specific tab
    pub fn with_tab(mut self, tab_id: u32) -> Self {
        self.tab_id = Some(tab_id);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call<R: DeserializeOwned>(&self, request: Request, generation: Option<u64>) -> TypeswapResult<R> {
        let mut envelope = Envelope::new(request);
        envelope.tab_id = self.tab_id;
        envelope.generation = generation;
        let kind = envelope.kind();

        let value = self.transport.send(envelope).await?;
        serde_json::from_value(value).map_err(|e| {
            warn!("malformed {} response: {}", kind, e);
            TypeswapError::UnexpectedResponse {
                request: kind.to_string(),
                message: e.to_string(),
            }
        })
    }

    pub async fn detect_capabilities(&self, font_name: &str, generation: u64) -> TypeswapResult<CapabilitiesResponse> {
        let payload = DetectCapabilitiesPayload {
            font_name: font_name.to_string(),
        };
        self.call(Request::DetectCapabilities(payload), Some(generation)).await
    }

    pub async fn check_font_weights(
        &self,
        payload: CheckFontWeightsPayload,
        generation: u64,
    ) -> TypeswapResult<Vec<FontWeight>> {
        let response: WeightsResponse = self.call(Request::CheckFontWeights(payload), Some(generation)).await?;
        match response.error {
            Some(message) => Err(TypeswapError::DeliveryFailed { message }),
            None => Ok(response.available_weights),
        }
    }

    pub async fn apply_font(&self, selection: &StyleSelection) -> TypeswapResult<SuccessResponse> {
        self.call(Request::ApplyFont(selection.clone()), None).await
    }

    pub async fn check_feature_support(&self, font_family: &str, feature: &str) -> TypeswapResult<bool> {
        let payload = CheckFeatureSupportPayload {
            font_family: font_family.to_string(),
            feature: feature.to_string(),
        };
        let response: FeatureSupportResponse = self.call(Request::CheckFeatureSupport(payload), None).await?;
        Ok(response.is_supported)
    }

    pub async fn reset_all(&self) -> TypeswapResult<SuccessResponse> {
        self.call(Request::ResetAll, None).await
    }

    pub async fn reset_fonts(&self) -> TypeswapResult<SuccessResponse> {
        self.call(Request::ResetFonts, None).await
    }

    pub async fn revert_to_previous_font(&self, full_font_name: &str) -> TypeswapResult<SuccessResponse> {
        let payload = RevertPayload {
            font_name: full_font_name.to_string(),
        };
        self.call(Request::RevertToPreviousFont(payload), None).await
    }
}

#[cfg(test)]
mod tests {
    use futures_lite::future;
    use serde_json::json;

    use super::*;

    struct Echo {
        seen: Vec<Envelope>,
    }

    impl Responder for Echo {
        async fn respond(&mut self, envelope: Envelope) -> Value {
            let response = match &envelope.request {
                Request::CheckFeatureSupport(_) => json!({"isSupported": true}),
                Request::CheckFontWeights(_) => json!({"availableWeights": ["bold"]}),
                Request::DetectCapabilities(_) => json!({"capabilities": 42}),
                _ => json!({"success": true}),
            };
            self.seen.push(envelope);
            response
        }
    }

    #[test]
    fn test_round_trip_through_local_channel() {
        smol::block_on(async {
            let (transport, endpoint) = local_channel("content");
            let channel = FontChannel::new(transport).with_tab(9);
            let mut echo = Echo { seen: Vec::new() };

            let (supported, served) = future::zip(
                channel.check_feature_support("Georgia", "liga"),
                endpoint.serve_one(&mut echo),
            )
            .await;
            assert!(supported.unwrap());
            assert!(served);
            assert_eq!(echo.seen[0].tab_id, Some(9));
        });
    }

    #[test]
    fn test_generation_travels_with_request() {
        smol::block_on(async {
            let (transport, endpoint) = local_channel("content");
            let channel = FontChannel::new(transport);
            let mut echo = Echo { seen: Vec::new() };
            let payload = CheckFontWeightsPayload {
                base_font_name: "Inter".to_string(),
                weight_suffixes: vec![FontWeight::Bold],
                user_typed_font_name: None,
                user_weight_suffix: None,
            };

            let (weights, _) = future::zip(channel.check_font_weights(payload, 5), endpoint.serve_one(&mut echo)).await;
            assert_eq!(weights.unwrap(), vec![FontWeight::Bold]);
            assert_eq!(echo.seen[0].generation, Some(5));
        });
    }

    #[test]
    fn test_malformed_response_is_unexpected() {
        smol::block_on(async {
            let (transport, endpoint) = local_channel("content");
            let channel = FontChannel::new(transport);
            let mut echo = Echo { seen: Vec::new() };

            let (result, _) = future::zip(channel.detect_capabilities("Georgia", 1), endpoint.serve_one(&mut echo)).await;
            assert!(matches!(result, Err(TypeswapError::UnexpectedResponse { .. })));
        });
    }

    #[test]
    fn test_closed_endpoint_is_reported() {
        smol::block_on(async {
            let (transport, endpoint) = local_channel("content");
            drop(endpoint);
            let channel = FontChannel::new(transport);
            let err = channel.reset_all().await.unwrap_err();
            assert!(matches!(err, TypeswapError::ChannelClosed { ref destination } if destination == "content"));
        });
    }

    struct Unreachable;

    impl Responder for Unreachable {
        async fn respond(&mut self, envelope: Envelope) -> Value {
            envelope.request.failure_response("Could not establish connection")
        }
    }

    #[test]
    fn test_failed_weight_answer_is_an_error() {
        smol::block_on(async {
            let (transport, endpoint) = local_channel("content");
            let channel = FontChannel::new(transport);
            let payload = CheckFontWeightsPayload {
                base_font_name: "Georgia".to_string(),
                weight_suffixes: FontWeight::ALL.to_vec(),
                user_typed_font_name: None,
                user_weight_suffix: None,
            };

            let (weights, _) =
                future::zip(channel.check_font_weights(payload, 1), endpoint.serve_one(&mut Unreachable)).await;
            assert!(matches!(
                weights,
                Err(TypeswapError::DeliveryFailed { ref message }) if message == "Could not establish connection"
            ));
        });
    }
}
