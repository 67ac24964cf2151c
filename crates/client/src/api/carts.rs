//! Server cart client.

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use bodegon_core::cart::{LocalCart, ServerCart};

use super::{AccessToken, ApiClient, ApiError};

/// The authenticated shopper's cart resource.
///
/// Every mutation returns the full updated cart; callers replace their
/// snapshot wholesale rather than patching it.
#[automock]
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Fetch the current cart.
    async fn get_cart(&self, token: &AccessToken) -> Result<ServerCart, ApiError>;

    /// Add a quantity of a product.
    async fn add_item(
        &self,
        token: &AccessToken,
        product_uuid: Uuid,
        quantity: u32,
    ) -> Result<ServerCart, ApiError>;

    /// Set the absolute quantity of an existing cart item.
    async fn update_item(
        &self,
        token: &AccessToken,
        item_uuid: Uuid,
        quantity: u32,
    ) -> Result<ServerCart, ApiError>;

    /// Delete a cart item.
    async fn remove_item(&self, token: &AccessToken, item_uuid: Uuid)
    -> Result<ServerCart, ApiError>;

    /// Empty the cart.
    async fn clear_cart(&self, token: &AccessToken) -> Result<(), ApiError>;

    /// Fold a local cart into the server cart. The server owns the merge
    /// policy; the response is the merged cart.
    async fn sync_cart(
        &self,
        token: &AccessToken,
        local: &LocalCart,
    ) -> Result<ServerCart, ApiError>;
}

/// HTTP implementation of [`CartApi`].
#[derive(Debug, Clone)]
pub struct HttpCartApi {
    client: ApiClient,
}

impl HttpCartApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn get_cart(&self, token: &AccessToken) -> Result<ServerCart, ApiError> {
        let response = self
            .client
            .http()
            .get(self.client.url("/cart"))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Ok(ApiClient::checked(response).await?.json().await?)
    }

    async fn add_item(
        &self,
        token: &AccessToken,
        product_uuid: Uuid,
        quantity: u32,
    ) -> Result<ServerCart, ApiError> {
        let body = serde_json::json!({
            "productUuid": product_uuid,
            "quantity": quantity,
        });

        let response = self
            .client
            .http()
            .post(self.client.url("/cart/items"))
            .bearer_auth(token.as_str())
            .json(&body)
            .send()
            .await?;

        Ok(ApiClient::checked(response).await?.json().await?)
    }

    async fn update_item(
        &self,
        token: &AccessToken,
        item_uuid: Uuid,
        quantity: u32,
    ) -> Result<ServerCart, ApiError> {
        let body = serde_json::json!({ "quantity": quantity });

        let response = self
            .client
            .http()
            .patch(self.client.url(&format!("/cart/items/{item_uuid}")))
            .bearer_auth(token.as_str())
            .json(&body)
            .send()
            .await?;

        Ok(ApiClient::checked(response).await?.json().await?)
    }

    async fn remove_item(
        &self,
        token: &AccessToken,
        item_uuid: Uuid,
    ) -> Result<ServerCart, ApiError> {
        let response = self
            .client
            .http()
            .delete(self.client.url(&format!("/cart/items/{item_uuid}")))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Ok(ApiClient::checked(response).await?.json().await?)
    }

    async fn clear_cart(&self, token: &AccessToken) -> Result<(), ApiError> {
        let response = self
            .client
            .http()
            .delete(self.client.url("/cart"))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        ApiClient::checked(response).await?;

        Ok(())
    }

    async fn sync_cart(
        &self,
        token: &AccessToken,
        local: &LocalCart,
    ) -> Result<ServerCart, ApiError> {
        let response = self
            .client
            .http()
            .post(self.client.url("/cart/sync"))
            .bearer_auth(token.as_str())
            .json(local)
            .send()
            .await?;

        Ok(ApiClient::checked(response).await?.json().await?)
    }
}
