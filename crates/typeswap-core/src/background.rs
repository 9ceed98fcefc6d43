// src/background.rs
//! Background relay: routes panel requests to the page's content handler

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TypeswapError;
use crate::protocol::Envelope;
use crate::relay::Responder;
use crate::traits::TabRouter;

/// Forwards every envelope to its tab and turns delivery failures into the
/// error-shaped response the requester expects
pub struct BackgroundRelay<R: TabRouter> {
    router: R,
}

impl<R: TabRouter> BackgroundRelay<R> {
    pub fn new(router: R) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub async fn forward(&self, envelope: Envelope) -> Value {
        let kind = envelope.kind();
        let tab_id = match envelope.tab_id {
            Some(tab_id) => Some(tab_id),
            None => self.router.active_tab().await,
        };
        let Some(tab_id) = tab_id else {
            warn!("{}: no target tab", kind);
            return envelope.request.failure_response(&TypeswapError::NoActiveTab.to_string());
        };

        let request = envelope.request.clone();
        match self.router.send_to_tab(tab_id, envelope).await {
            Ok(response) => {
                debug!("{} answered by tab {}", kind, tab_id);
                response
            }
            Err(e) => {
                warn!("{} to tab {} failed: {}", kind, tab_id, e);
                request.failure_response(&e.to_string())
            }
        }
    }
}

impl<R: TabRouter> Responder for BackgroundRelay<R> {
    async fn respond(&mut self, envelope: Envelope) -> Value {
        self.forward(envelope).await
    }
}
