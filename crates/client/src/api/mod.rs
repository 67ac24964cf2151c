//! REST clients for the storefront backend.
//!
//! One [`ApiClient`] carries the base URL and the underlying HTTP client;
//! per-resource traits ([`CartApi`], [`DiscountApi`], [`ExchangeRateApi`],
//! [`OrdersApi`], [`ProductsApi`]) describe the calls and are mockable for
//! tests. Authenticated endpoints take the bearer token per call.
//!
//! [`CartApi`]: carts::CartApi
//! [`DiscountApi`]: discounts::DiscountApi
//! [`ExchangeRateApi`]: exchange::ExchangeRateApi
//! [`OrdersApi`]: orders::OrdersApi
//! [`ProductsApi`]: products::ProductsApi

pub mod carts;
pub mod discounts;
pub mod exchange;
pub mod orders;
pub mod products;

use std::fmt;

use reqwest::{Client, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::config::ClientConfig;

/// Errors from communicating with the backend.
///
/// Transport failures and backend rejections deliberately share one type:
/// callers treat "the server said no" and "the request never arrived"
/// identically, surfacing the message and moving on.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend returned a non-2xx response or unexpected body.
    #[error("unexpected response from the storefront API: {0}")]
    UnexpectedResponse(String),
}

/// A bearer token for authenticated endpoints.
///
/// Opaque to the client; it is forwarded verbatim and never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(…)")
    }
}

/// Shared HTTP plumbing for the per-resource clients.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    /// Builds the underlying HTTP client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();

        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            http: builder.build()?,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Passes 2xx responses through; turns anything else into
    /// [`ApiError::UnexpectedResponse`] with the backend's message.
    pub(crate) async fn checked(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let message = Self::error_message(response).await;

        Err(ApiError::UnexpectedResponse(format!(
            "request failed with status {status}: {message}"
        )))
    }

    /// Extracts the backend's human-readable error message, falling back to
    /// the raw body.
    pub(crate) async fn error_message(response: Response) -> String {
        let text = response.text().await.unwrap_or_default();

        serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
