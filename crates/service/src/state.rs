use std::sync::Arc;

use common::prelude::{
    ExchangeController, ExchangeId, MemoryBlobStore, MemoryMetadataStore, TrustVerifier,
};
use common::trust::TrustVerifierError;

use crate::config::Config;

/// Shared application state: the lifecycle controller plus the config it
/// was built from. Cheap to clone; handlers receive it via axum `State`.
#[derive(Debug, Clone)]
pub struct AppState {
    controller: Arc<ExchangeController>,
    config: Arc<Config>,
}

impl AppState {
    /// Build state backed by in-memory stores.
    ///
    /// The storage collaborators are swappable behind the provider traits;
    /// an external KV/blob deployment plugs in through
    /// [`AppState::with_controller`].
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let verifier = TrustVerifier::new(config.trust_gateway.clone())?;
        let controller = ExchangeController::new(
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(verifier),
        );
        Ok(Self::with_controller(config.clone(), controller))
    }

    pub fn with_controller(config: Config, controller: ExchangeController) -> Self {
        Self {
            controller: Arc::new(controller),
            config: Arc::new(config),
        }
    }

    pub fn controller(&self) -> &ExchangeController {
        &self.controller
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Retrieval locator for an exchange, under the external base URL.
    pub fn retrieval_url(&self, id: &ExchangeId) -> String {
        let mut url = self.config.external_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("exchange").push(id.as_str());
        }
        url.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to construct trust verifier: {0}")]
    Verifier(#[from] TrustVerifierError),
}
