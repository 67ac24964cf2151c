//! Order submission client.
//!
//! Order placement is two calls: create the order record, then upload the
//! payment receipt against the returned identifier. The two are exposed
//! separately on purpose: a failed upload must be retryable without
//! re-creating the order.

use async_trait::async_trait;
use mockall::automock;
use reqwest::multipart::{Form, Part};
use uuid::Uuid;

use bodegon_core::checkout::form::ReceiptFile;
use bodegon_core::orders::{CreateOrderRequest, Order};

use super::{AccessToken, ApiClient, ApiError};

/// Order creation and receipt upload. The token is optional because guests
/// place orders too; when present it lets the backend resolve the
/// session-bound cart.
#[automock]
#[async_trait]
pub trait OrdersApi: Send + Sync {
    /// Phase one: create the order record.
    async fn create(
        &self,
        request: &CreateOrderRequest,
        token: Option<AccessToken>,
    ) -> Result<Order, ApiError>;

    /// Phase two: attach the payment receipt to an existing order.
    async fn upload_receipt(
        &self,
        order_uuid: Uuid,
        receipt: &ReceiptFile,
        token: Option<AccessToken>,
    ) -> Result<Order, ApiError>;
}

/// HTTP implementation of [`OrdersApi`].
#[derive(Debug, Clone)]
pub struct HttpOrdersApi {
    client: ApiClient,
}

impl HttpOrdersApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrdersApi for HttpOrdersApi {
    async fn create(
        &self,
        request: &CreateOrderRequest,
        token: Option<AccessToken>,
    ) -> Result<Order, ApiError> {
        let mut builder = self
            .client
            .http()
            .post(self.client.url("/orders"))
            .json(request);

        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }

        let response = builder.send().await?;

        Ok(ApiClient::checked(response).await?.json().await?)
    }

    async fn upload_receipt(
        &self,
        order_uuid: Uuid,
        receipt: &ReceiptFile,
        token: Option<AccessToken>,
    ) -> Result<Order, ApiError> {
        let part = Part::bytes(receipt.bytes.clone())
            .file_name(receipt.file_name.clone())
            .mime_str(&receipt.content_type)?;

        let form = Form::new().part("receipt", part);

        let mut builder = self
            .client
            .http()
            .post(self.client.url(&format!("/orders/{order_uuid}/receipt")))
            .multipart(form);

        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }

        let response = builder.send().await?;

        Ok(ApiClient::checked(response).await?.json().await?)
    }
}
