//! Discount validation client.

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use serde::Deserialize;

use bodegon_core::discounts::{DiscountOutcome, ValidatedDiscount, normalize_code};

use super::{ApiClient, ApiError};

/// Server-side validation of a discount code against an order subtotal.
///
/// A rejected code is an expected outcome carried in the
/// [`DiscountOutcome`], not an error: 4xx responses on this endpoint become
/// `Invalid` with the backend's message. Only transport failures and 5xx
/// responses are errors. Validation is idempotent; it is re-invoked on
/// every code submission and on every subtotal change.
#[automock]
#[async_trait]
pub trait DiscountApi: Send + Sync {
    async fn validate(
        &self,
        code: &str,
        order_total: Decimal,
    ) -> Result<DiscountOutcome, ApiError>;
}

/// HTTP implementation of [`DiscountApi`].
#[derive(Debug, Clone)]
pub struct HttpDiscountApi {
    client: ApiClient,
}

impl HttpDiscountApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateDiscountResponse {
    valid: bool,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    discount_amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    discount_amount_ves: Option<Decimal>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl DiscountApi for HttpDiscountApi {
    async fn validate(
        &self,
        code: &str,
        order_total: Decimal,
    ) -> Result<DiscountOutcome, ApiError> {
        let response = self
            .client
            .http()
            .get(self.client.url("/discounts/validate"))
            .query(&[("code", code), ("orderTotal", order_total.to_string().as_str())])
            .send()
            .await?;

        if response.status().is_client_error() {
            let reason = ApiClient::error_message(response).await;

            return Ok(DiscountOutcome::Invalid { reason });
        }

        let parsed: ValidateDiscountResponse = ApiClient::checked(response).await?.json().await?;

        if !parsed.valid {
            return Ok(DiscountOutcome::Invalid {
                reason: parsed
                    .message
                    .unwrap_or_else(|| "invalid discount code".to_owned()),
            });
        }

        let amount_usd = parsed.discount_amount.ok_or_else(|| {
            ApiError::UnexpectedResponse("discount validated without an amount".to_owned())
        })?;

        Ok(DiscountOutcome::Valid(ValidatedDiscount {
            code: normalize_code(code),
            amount_usd,
            amount_ves: parsed.discount_amount_ves,
        }))
    }
}
