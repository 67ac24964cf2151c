//! Store context
//!
//! Explicit dependency wiring for the checkout flow: every collaborator is
//! an injected trait object, never ambient state, so tests can swap any of
//! them for mocks.

use std::sync::Arc;

use thiserror::Error;

use crate::api::carts::{CartApi, HttpCartApi};
use crate::api::discounts::{DiscountApi, HttpDiscountApi};
use crate::api::exchange::{ExchangeRateApi, HttpExchangeRateApi};
use crate::api::orders::{HttpOrdersApi, OrdersApi};
use crate::api::products::{HttpProductsApi, ProductsApi};
use crate::api::{ApiClient, ApiError};
use crate::checkout::CheckoutFlow;
use crate::config::ClientConfig;
use crate::session::{CartSession, SessionError};
use crate::storage::{CartStorage, JsonFileStorage};

/// Errors from building the context.
#[derive(Debug, Error)]
pub enum ContextInitError {
    #[error("failed to build the http client")]
    Http(#[source] ApiError),
}

/// The storefront's wired-up collaborators.
#[derive(Clone)]
pub struct StoreContext {
    pub carts: Arc<dyn CartApi>,
    pub discounts: Arc<dyn DiscountApi>,
    pub exchange_rates: Arc<dyn ExchangeRateApi>,
    pub orders: Arc<dyn OrdersApi>,
    pub products: Arc<dyn ProductsApi>,
    pub storage: Arc<dyn CartStorage>,
}

impl StoreContext {
    /// Builds the context against the configured backend, with the
    /// file-backed cart store.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ContextInitError> {
        let client = ApiClient::new(config).map_err(ContextInitError::Http)?;

        Ok(Self {
            carts: Arc::new(HttpCartApi::new(client.clone())),
            discounts: Arc::new(HttpDiscountApi::new(client.clone())),
            exchange_rates: Arc::new(HttpExchangeRateApi::new(client.clone())),
            orders: Arc::new(HttpOrdersApi::new(client.clone())),
            products: Arc::new(HttpProductsApi::new(client)),
            storage: Arc::new(JsonFileStorage::new(config.cart_path.clone())),
        })
    }

    /// Starts a cart session from the stored anonymous cart.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored cart cannot be read.
    pub fn cart_session(&self) -> Result<CartSession, SessionError> {
        CartSession::begin(self.carts.clone(), self.storage.clone())
    }

    /// Starts a checkout attempt, loading the session exchange rate.
    pub async fn checkout(&self) -> CheckoutFlow {
        CheckoutFlow::begin(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_builds_from_config() {
        let config = ClientConfig::new("http://localhost:3000", "/tmp/cart.json");

        let context = StoreContext::from_config(&config);

        assert!(context.is_ok());
    }
}
