//! Exchange rate client.

use async_trait::async_trait;
use mockall::automock;

use bodegon_core::money::ExchangeRate;

use super::{ApiClient, ApiError};

/// The current USD→VES rate. Fetched once per checkout session; a failure
/// here is non-fatal (the UI degrades to USD-only display).
#[automock]
#[async_trait]
pub trait ExchangeRateApi: Send + Sync {
    async fn current(&self) -> Result<ExchangeRate, ApiError>;
}

/// HTTP implementation of [`ExchangeRateApi`].
#[derive(Debug, Clone)]
pub struct HttpExchangeRateApi {
    client: ApiClient,
}

impl HttpExchangeRateApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExchangeRateApi for HttpExchangeRateApi {
    async fn current(&self) -> Result<ExchangeRate, ApiError> {
        let response = self
            .client
            .http()
            .get(self.client.url("/exchange-rate/current"))
            .send()
            .await?;

        Ok(ApiClient::checked(response).await?.json().await?)
    }
}
