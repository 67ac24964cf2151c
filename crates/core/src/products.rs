//! Products
//!
//! The published-product projection the storefront consumes. Local carts
//! store no prices, so checkout joins cart lines against a freshly fetched
//! page of these to price them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published product as served by the catalog endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub uuid: Uuid,
    pub name: String,
    /// Unit price in USD, string-encoded on the wire.
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// Units currently in stock. Quantity clamping against this value is a
    /// UI concern; the cart itself does not reject over-stock adds.
    pub stock: u32,
    pub published: bool,
}

/// One page of the paginated product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub page_count: u32,
}

impl ProductPage {
    /// Whether pages remain after this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.page < self.page_count
    }
}
