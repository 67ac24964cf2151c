//! Carts
//!
//! The storefront has two cart representations. Anonymous shoppers get a
//! [`LocalCart`]: product/quantity pairs only, persisted on the client,
//! priced lazily against a fresh product list so stale prices are never
//! cached. Authenticated shoppers get a [`ServerCart`]: the backend-owned
//! cart with authoritative prices and subtotals, deserialized verbatim.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::products::Product;

/// Errors from cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Quantities start at 1. Removing a line is an explicit, separate
    /// operation, never inferred from a zero quantity.
    #[error("quantity must be at least 1; use remove to delete a line")]
    InvalidQuantity,
}

/// One line of an anonymous cart. No price: prices are resolved at read
/// time by joining against the product list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCartItem {
    pub product_uuid: Uuid,
    pub quantity: u32,
}

/// An anonymous shopper's cart.
///
/// Product UUIDs are unique within the list: adding a product that is
/// already present merges quantities instead of appending a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCart {
    items: Vec<LocalCartItem>,
}

impl LocalCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[LocalCartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `quantity` of a product, merging into an existing line if the
    /// product is already in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] when `quantity` is zero.
    pub fn add_item(&mut self, product_uuid: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        match self.line_mut(product_uuid) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.items.push(LocalCartItem {
                product_uuid,
                quantity,
            }),
        }

        Ok(())
    }

    /// Sets the absolute quantity of an existing line.
    ///
    /// Updating a product that is not in the cart is a no-op; an update
    /// never creates a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] when `quantity` is zero.
    pub fn update_item(&mut self, product_uuid: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        if let Some(line) = self.line_mut(product_uuid) {
            line.quantity = quantity;
        }

        Ok(())
    }

    /// Deletes the line for a product, if present.
    pub fn remove_item(&mut self, product_uuid: Uuid) {
        self.items.retain(|line| line.product_uuid != product_uuid);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |sum, line| sum.saturating_add(line.quantity))
    }

    /// Quantity for a product, `0` if absent.
    #[must_use]
    pub fn item_quantity(&self, product_uuid: Uuid) -> u32 {
        self.line(product_uuid).map_or(0, |line| line.quantity)
    }

    fn line(&self, product_uuid: Uuid) -> Option<&LocalCartItem> {
        self.items
            .iter()
            .find(|line| line.product_uuid == product_uuid)
    }

    fn line_mut(&mut self, product_uuid: Uuid) -> Option<&mut LocalCartItem> {
        self.items
            .iter_mut()
            .find(|line| line.product_uuid == product_uuid)
    }
}

/// One line of the backend-owned cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCartItem {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    pub quantity: u32,
    /// Unit price in USD, string-encoded on the wire.
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    /// Unit price in VES as computed by the backend, when it had a rate.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub unit_price_ves: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub subtotal_ves: Option<Decimal>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The backend-owned cart of an authenticated shopper.
///
/// One per user; created lazily on first authenticated mutation. The client
/// treats its copy as a provisional snapshot, replaced wholesale by every
/// mutation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCart {
    pub uuid: Uuid,
    pub items: Vec<ServerCartItem>,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub subtotal_ves: Option<Decimal>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ServerCart {
    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |sum, line| sum.saturating_add(line.quantity))
    }

    /// Quantity for a product, `0` if absent.
    #[must_use]
    pub fn item_quantity(&self, product_uuid: Uuid) -> u32 {
        self.items
            .iter()
            .find(|line| line.product_uuid == product_uuid)
            .map_or(0, |line| line.quantity)
    }

    /// Empties the snapshot after the backend confirmed a clear. The real
    /// state lives server-side; this only keeps the local copy coherent.
    pub fn mark_cleared(&mut self) {
        self.items.clear();
        self.subtotal = Decimal::ZERO;
        self.subtotal_ves = None;
    }
}

/// A local cart line joined against the product list.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_uuid: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// The result of pricing a [`LocalCart`].
///
/// Lines whose product is missing from the list (unpublished since the add,
/// or beyond the fetched pages) are reported in `unpriced` and excluded from
/// the subtotal, so the caller can surface them instead of silently
/// undercharging.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub unpriced: Vec<Uuid>,
    pub subtotal: Decimal,
}

/// Prices a local cart against a fetched product list.
#[must_use]
pub fn price_local_cart(cart: &LocalCart, products: &[Product]) -> PricedCart {
    let mut lines = Vec::with_capacity(cart.items().len());
    let mut unpriced = Vec::new();
    let mut subtotal = Decimal::ZERO;

    for item in cart.items() {
        let Some(product) = products.iter().find(|p| p.uuid == item.product_uuid) else {
            unpriced.push(item.product_uuid);
            continue;
        };

        let line_subtotal = product.price * Decimal::from(item.quantity);

        subtotal += line_subtotal;
        lines.push(PricedLine {
            product_uuid: item.product_uuid,
            name: product.name.clone(),
            quantity: item.quantity,
            unit_price: product.price,
            subtotal: line_subtotal,
        });
    }

    PricedCart {
        lines,
        unpriced,
        subtotal,
    }
}
