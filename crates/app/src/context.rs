//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::GatewayConfig,
    gateway::{GatewayError, GeminiClient, StickerGateway},
    payments::{PaymentGateway, SimulatedPaymentGateway},
};

/// Errors raised while building the application context.
#[derive(Debug, Error)]
pub enum AppInitError {
    /// The gateway HTTP client could not be constructed.
    #[error("failed to initialise the gateway client")]
    Gateway(#[source] GatewayError),
}

/// Shared service handles for the shell.
#[derive(Clone)]
pub struct AppContext {
    /// Generative model boundary.
    pub gateway: Arc<dyn StickerGateway>,
    /// Payment provider boundary.
    pub payments: Arc<dyn PaymentGateway>,
}

impl AppContext {
    /// Build the application context from gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn from_config(config: GatewayConfig) -> Result<Self, AppInitError> {
        let client = GeminiClient::new(config).map_err(AppInitError::Gateway)?;

        Ok(Self {
            gateway: Arc::new(client),
            payments: Arc::new(SimulatedPaymentGateway::default()),
        })
    }
}
