//! Cart session orchestration.
//!
//! One cart interface regardless of who is shopping. Anonymous mutations go
//! to durable local storage; authenticated mutations go to the server cart,
//! whose response replaces the in-memory snapshot. Login performs the
//! local→server merge at most once per login event: the guard (a non-empty
//! local cart) re-evaluates on every login, and a failed merge leaves the
//! local cart intact for the next attempt.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use bodegon_core::cart::{CartError, LocalCart, ServerCart};

use crate::api::carts::CartApi;
use crate::api::{AccessToken, ApiError};
use crate::storage::{CartStorage, StorageError};

/// Errors from cart session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An authenticated mutation was attempted on a line with no server
    /// item reference.
    #[error("cart line has no server item reference")]
    MissingItemRef,
}

/// The two shopper states and their backing carts, as one tagged union.
/// Exactly one store is ever active; routing is a pure function of this
/// variant.
#[derive(Debug)]
pub enum Shopper {
    Guest { cart: LocalCart },
    Authenticated { token: AccessToken, cart: ServerCart },
}

/// What happened to the local cart at login.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Local items were folded into the server cart; local storage is now
    /// empty.
    Merged,

    /// The local cart was empty; nothing to do.
    NothingToMerge,

    /// The merge call failed. Non-fatal: the session is authenticated, the
    /// local cart is untouched, and the next login will retry.
    Failed(ApiError),
}

/// One line of the unified cart read model. `item_uuid` is present only for
/// server-backed lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item_uuid: Option<Uuid>,
    pub product_uuid: Uuid,
    pub quantity: u32,
}

/// The cart orchestrator.
///
/// Callers serialize mutations by awaiting each one; reads never fail, they
/// operate on the held snapshot.
pub struct CartSession {
    api: Arc<dyn CartApi>,
    storage: Arc<dyn CartStorage>,
    shopper: Shopper,
}

impl CartSession {
    /// Starts an anonymous session from whatever local storage holds.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored cart cannot be read.
    pub fn begin(
        api: Arc<dyn CartApi>,
        storage: Arc<dyn CartStorage>,
    ) -> Result<Self, SessionError> {
        let cart = storage.load()?;

        Ok(Self {
            api,
            storage,
            shopper: Shopper::Guest { cart },
        })
    }

    #[must_use]
    pub fn shopper(&self) -> &Shopper {
        &self.shopper
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.shopper, Shopper::Authenticated { .. })
    }

    #[must_use]
    pub fn token(&self) -> Option<&AccessToken> {
        match &self.shopper {
            Shopper::Guest { .. } => None,
            Shopper::Authenticated { token, .. } => Some(token),
        }
    }

    /// Sum of all line quantities in the active cart.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        match &self.shopper {
            Shopper::Guest { cart } => cart.total_items(),
            Shopper::Authenticated { cart, .. } => cart.total_items(),
        }
    }

    /// Quantity of a product in the active cart, `0` if absent.
    #[must_use]
    pub fn item_quantity(&self, product_uuid: Uuid) -> u32 {
        match &self.shopper {
            Shopper::Guest { cart } => cart.item_quantity(product_uuid),
            Shopper::Authenticated { cart, .. } => cart.item_quantity(product_uuid),
        }
    }

    /// The active cart as unified lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        match &self.shopper {
            Shopper::Guest { cart } => cart
                .items()
                .iter()
                .map(|item| CartLine {
                    item_uuid: None,
                    product_uuid: item.product_uuid,
                    quantity: item.quantity,
                })
                .collect(),
            Shopper::Authenticated { cart, .. } => cart
                .items
                .iter()
                .map(|item| CartLine {
                    item_uuid: Some(item.uuid),
                    product_uuid: item.product_uuid,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }

    /// Adds a quantity of a product to the active cart.
    ///
    /// Quantity must be at least 1. Clamping against inventory is the
    /// caller's concern: stock can change between render and submit, so the
    /// backend has the final word anyway.
    ///
    /// # Errors
    ///
    /// Propagates API, storage and quantity errors; the in-memory snapshot
    /// is only replaced after the backing store succeeded.
    pub async fn add_item(&mut self, product_uuid: Uuid, quantity: u32) -> Result<(), SessionError> {
        debug!(product = %product_uuid, quantity, "adding item to cart");

        match &mut self.shopper {
            Shopper::Guest { cart } => {
                cart.add_item(product_uuid, quantity)?;
                self.storage.store(cart)?;
            }
            Shopper::Authenticated { token, cart } => {
                *cart = self.api.add_item(token, product_uuid, quantity).await?;
            }
        }

        Ok(())
    }

    /// Sets the absolute quantity of a line.
    ///
    /// A zero quantity is rejected, never treated as removal; call
    /// [`remove_item`](Self::remove_item) to delete a line.
    ///
    /// # Errors
    ///
    /// Propagates API, storage and quantity errors. Authenticated carts
    /// additionally require the line's server item reference.
    pub async fn update_quantity(
        &mut self,
        line: &CartLine,
        quantity: u32,
    ) -> Result<(), SessionError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity.into());
        }

        match &mut self.shopper {
            Shopper::Guest { cart } => {
                cart.update_item(line.product_uuid, quantity)?;
                self.storage.store(cart)?;
            }
            Shopper::Authenticated { token, cart } => {
                let item_uuid = line.item_uuid.ok_or(SessionError::MissingItemRef)?;

                *cart = self.api.update_item(token, item_uuid, quantity).await?;
            }
        }

        Ok(())
    }

    /// Removes a line from the active cart.
    ///
    /// # Errors
    ///
    /// Propagates API and storage errors. Authenticated carts require the
    /// line's server item reference.
    pub async fn remove_item(&mut self, line: &CartLine) -> Result<(), SessionError> {
        match &mut self.shopper {
            Shopper::Guest { cart } => {
                cart.remove_item(line.product_uuid);
                self.storage.store(cart)?;
            }
            Shopper::Authenticated { token, cart } => {
                let item_uuid = line.item_uuid.ok_or(SessionError::MissingItemRef)?;

                *cart = self.api.remove_item(token, item_uuid).await?;
            }
        }

        Ok(())
    }

    /// Empties the active cart.
    ///
    /// # Errors
    ///
    /// Propagates API and storage errors.
    pub async fn clear(&mut self) -> Result<(), SessionError> {
        match &mut self.shopper {
            Shopper::Guest { cart } => {
                cart.clear();
                self.storage.store(cart)?;
            }
            Shopper::Authenticated { token, cart } => {
                self.api.clear_cart(token).await?;
                cart.mark_cleared();
            }
        }

        Ok(())
    }

    /// Authenticates the session, merging the local cart into the server
    /// cart when there is one to merge.
    ///
    /// The durable local cart is the guard: non-empty means sync. On
    /// success it is destroyed; on failure it survives untouched and the
    /// next login re-triggers the merge. A failed merge does not fail the
    /// login; the session still comes up authenticated on the current
    /// server cart.
    ///
    /// # Errors
    ///
    /// Returns an error only when no server cart could be established at
    /// all; the session then remains in its previous state.
    pub async fn login(&mut self, token: AccessToken) -> Result<SyncOutcome, SessionError> {
        let local = self.storage.load()?;

        if local.is_empty() {
            let cart = self.api.get_cart(&token).await?;

            self.shopper = Shopper::Authenticated { token, cart };

            return Ok(SyncOutcome::NothingToMerge);
        }

        match self.api.sync_cart(&token, &local).await {
            Ok(cart) => {
                self.storage.clear()?;
                info!(items = local.total_items(), "local cart merged into server cart");

                self.shopper = Shopper::Authenticated { token, cart };

                Ok(SyncOutcome::Merged)
            }
            Err(error) => {
                warn!(%error, "cart sync failed; keeping local cart for the next login");

                let cart = self.api.get_cart(&token).await?;

                self.shopper = Shopper::Authenticated { token, cart };

                Ok(SyncOutcome::Failed(error))
            }
        }
    }

    /// Returns to an anonymous session backed by whatever local storage
    /// holds (empty after any successful sync).
    ///
    /// # Errors
    ///
    /// Returns an error when the stored cart cannot be read.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        let cart = self.storage.load()?;

        self.shopper = Shopper::Guest { cart };

        Ok(())
    }
}
