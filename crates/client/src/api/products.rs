//! Product catalog client.

use async_trait::async_trait;
use mockall::automock;

use bodegon_core::products::ProductPage;

use super::{ApiClient, ApiError};

/// The published-products listing, used to price anonymous carts. Always
/// filtered to published products; unpublished ones must never price a
/// cart line.
#[automock]
#[async_trait]
pub trait ProductsApi: Send + Sync {
    async fn list_published(&self, page: u32, limit: u32) -> Result<ProductPage, ApiError>;
}

/// HTTP implementation of [`ProductsApi`].
#[derive(Debug, Clone)]
pub struct HttpProductsApi {
    client: ApiClient,
}

impl HttpProductsApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProductsApi for HttpProductsApi {
    async fn list_published(&self, page: u32, limit: u32) -> Result<ProductPage, ApiError> {
        let response = self
            .client
            .http()
            .get(self.client.url("/products"))
            .query(&[
                ("page", page.to_string().as_str()),
                ("limit", limit.to_string().as_str()),
                ("published", "true"),
            ])
            .send()
            .await?;

        Ok(ApiClient::checked(response).await?.json().await?)
    }
}
