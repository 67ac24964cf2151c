//! Checkout flow.
//!
//! Drives one checkout attempt end to end: the wizard and its form, the
//! session-scoped exchange rate, dual-currency totals, the discount
//! lifecycle (validate, hold bound to the subtotal, re-validate on drift),
//! and the two-phase order submission with a receipt-only retry.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use bodegon_core::cart::price_local_cart;
use bodegon_core::checkout::form::{CheckoutForm, ReceiptFile};
use bodegon_core::checkout::steps::{CheckoutWizard, Step, StepError};
use bodegon_core::discounts::{AppliedDiscount, DiscountOutcome, normalize_code};
use bodegon_core::money::{ExchangeRate, derive_ves};
use bodegon_core::orders::{Order, OrderAssemblyError, OrderParty, assemble_order};
use bodegon_core::products::Product;

use crate::api::discounts::DiscountApi;
use crate::api::exchange::ExchangeRateApi;
use crate::api::orders::OrdersApi;
use crate::api::products::ProductsApi;
use crate::api::{AccessToken, ApiError};
use crate::context::StoreContext;
use crate::session::{CartSession, SessionError, Shopper};

const PRODUCT_PAGE_LIMIT: u32 = 100;

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Assembly(#[from] OrderAssemblyError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// Submission only happens from the payment step.
    #[error("submission is only available from the payment step")]
    NotAtPaymentStep,

    /// An order already exists and its receipt upload failed; retry the
    /// upload instead of resubmitting.
    #[error("a receipt upload is pending; retry it instead of resubmitting")]
    ReceiptPending,

    /// Nothing to retry.
    #[error("no receipt upload is pending")]
    NothingPending,
}

/// Dual-currency totals for display.
///
/// VES subtotal and total are derived from USD with the session rate. The
/// discount's VES amount is the server's authoritative figure; when a
/// discount is applied but its VES amount is missing, the VES total is
/// withheld rather than computed from mismatched numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutTotals {
    pub subtotal_usd: Decimal,
    pub subtotal_ves: Option<Decimal>,
    pub discount_usd: Decimal,
    pub discount_ves: Option<Decimal>,
    pub total_usd: Decimal,
    pub total_ves: Option<Decimal>,
}

/// The result of a submission attempt.
#[derive(Debug)]
pub enum Submission {
    /// Order created and receipt attached.
    Completed(Order),

    /// Order created but the receipt upload failed. The order exists
    /// without proof of payment; only the upload should be retried.
    ReceiptPending { order: Order, error: ApiError },
}

#[derive(Debug)]
struct PendingReceipt {
    order: Order,
    receipt: ReceiptFile,
    token: Option<AccessToken>,
}

/// One checkout attempt.
pub struct CheckoutFlow {
    discounts: Arc<dyn DiscountApi>,
    orders: Arc<dyn OrdersApi>,
    products: Arc<dyn ProductsApi>,
    /// The wizard's accumulated form state; the UI writes to it directly.
    pub form: CheckoutForm,
    wizard: CheckoutWizard,
    rate: Option<ExchangeRate>,
    applied: Option<AppliedDiscount>,
    pending: Option<PendingReceipt>,
    product_cache: Option<Vec<Product>>,
}

impl CheckoutFlow {
    /// Starts a checkout attempt, loading the exchange rate for the
    /// session. Rate failures are non-fatal; display degrades to USD-only.
    pub async fn begin(ctx: &StoreContext) -> Self {
        let rate = match ctx.exchange_rates.current().await {
            Ok(rate) => Some(rate),
            Err(error) => {
                warn!(%error, "exchange rate unavailable; showing USD only");

                None
            }
        };

        Self {
            discounts: ctx.discounts.clone(),
            orders: ctx.orders.clone(),
            products: ctx.products.clone(),
            form: CheckoutForm::default(),
            wizard: CheckoutWizard::new(),
            rate,
            applied: None,
            pending: None,
            product_cache: None,
        }
    }

    #[must_use]
    pub fn exchange_rate(&self) -> Option<&ExchangeRate> {
        self.rate.as_ref()
    }

    #[must_use]
    pub fn current_step(&self) -> Step {
        self.wizard.current_step()
    }

    #[must_use]
    pub fn wizard(&self) -> &CheckoutWizard {
        &self.wizard
    }

    /// Validates the current step against the form and moves forward.
    ///
    /// # Errors
    ///
    /// Returns the violated step gate.
    pub fn advance(&mut self) -> Result<Step, StepError> {
        self.wizard.advance(&self.form)
    }

    /// Moves back one step, unconditionally.
    pub fn back(&mut self) -> Step {
        self.wizard.back()
    }

    #[must_use]
    pub fn applied_discount(&self) -> Option<&AppliedDiscount> {
        self.applied.as_ref()
    }

    /// Drops the applied discount without talking to the backend.
    pub fn remove_discount(&mut self) {
        self.applied = None;
    }

    /// The created-but-unreceipted order, when the last submission left one.
    #[must_use]
    pub fn pending_order(&self) -> Option<&Order> {
        self.pending.as_ref().map(|pending| &pending.order)
    }

    /// The current order subtotal in USD: the server cart's figure for
    /// authenticated shoppers, a product-list join for guests.
    ///
    /// # Errors
    ///
    /// Returns an error when the guest product listing cannot be fetched.
    pub async fn subtotal(&mut self, session: &CartSession) -> Result<Decimal, CheckoutError> {
        match session.shopper() {
            Shopper::Authenticated { cart, .. } => Ok(cart.subtotal),
            Shopper::Guest { cart } => {
                let products = self.published_products().await?;

                Ok(price_local_cart(cart, products).subtotal)
            }
        }
    }

    /// Dual-currency totals for the current cart and discount.
    ///
    /// # Errors
    ///
    /// Returns an error when the guest product listing cannot be fetched.
    pub async fn totals(&mut self, session: &CartSession) -> Result<CheckoutTotals, CheckoutError> {
        let subtotal_usd = self.subtotal(session).await?;
        let subtotal_ves = derive_ves(subtotal_usd, self.rate.as_ref());

        let (discount_usd, discount_ves) = match &self.applied {
            None => (Decimal::ZERO, None),
            Some(applied) => (applied.amount_usd, applied.amount_ves),
        };

        let total_usd = (subtotal_usd - discount_usd).max(Decimal::ZERO);

        let total_ves = if self.applied.is_none() {
            subtotal_ves
        } else {
            // The discount's VES amount is authoritative from the server;
            // without it there is no honest VES total to show.
            subtotal_ves
                .zip(discount_ves)
                .map(|(subtotal, discount)| (subtotal - discount).max(Decimal::ZERO))
        };

        Ok(CheckoutTotals {
            subtotal_usd,
            subtotal_ves,
            discount_usd,
            discount_ves,
            total_usd,
            total_ves,
        })
    }

    /// Validates a discount code against the current subtotal and holds the
    /// result on success. Safe to call repeatedly with the same inputs.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure; a rejected code is a normal
    /// [`DiscountOutcome::Invalid`].
    pub async fn apply_discount(
        &mut self,
        session: &CartSession,
        code: &str,
    ) -> Result<DiscountOutcome, CheckoutError> {
        let code = normalize_code(code);
        let subtotal = self.subtotal(session).await?;
        let outcome = self.discounts.validate(&code, subtotal).await?;

        match &outcome {
            DiscountOutcome::Valid(validated) => {
                self.applied = Some(AppliedDiscount::bind(validated.clone(), subtotal));
            }
            DiscountOutcome::Invalid { .. } => {
                self.applied = None;
            }
        }

        Ok(outcome)
    }

    /// Re-validates the applied discount when the subtotal has drifted
    /// since it was validated.
    ///
    /// The stale discount is cleared before the new validation resolves, so
    /// an amount computed against the old subtotal is never shown or
    /// honored, not even transiently.
    ///
    /// # Errors
    ///
    /// Returns an error when the subtotal cannot be computed or the
    /// validation call fails; the discount stays cleared in that case.
    pub async fn refresh_discount(
        &mut self,
        session: &CartSession,
    ) -> Result<Option<DiscountOutcome>, CheckoutError> {
        let Some(applied) = self.applied.clone() else {
            return Ok(None);
        };

        let subtotal = self.subtotal(session).await?;

        if !applied.is_stale(subtotal) {
            return Ok(None);
        }

        self.applied = None;

        let outcome = self.discounts.validate(&applied.code, subtotal).await?;

        if let DiscountOutcome::Valid(validated) = &outcome {
            self.applied = Some(AppliedDiscount::bind(validated.clone(), subtotal));
        }

        Ok(Some(outcome))
    }

    /// Submits the order from the payment step.
    ///
    /// Phase one creates the order; on success the active cart is cleared
    /// and the order is final. Phase two uploads the receipt; its failure
    /// yields [`Submission::ReceiptPending`], after which only
    /// [`retry_receipt`](Self::retry_receipt) is allowed; the order is
    /// never re-created.
    ///
    /// # Errors
    ///
    /// Local validation failures ([`OrderAssemblyError`]) are returned
    /// before any network call. Phase-one failures leave no order behind
    /// and are safe to resubmit.
    pub async fn submit(&mut self, session: &mut CartSession) -> Result<Submission, CheckoutError> {
        if self.pending.is_some() {
            return Err(CheckoutError::ReceiptPending);
        }

        if !self.wizard.is_final_step() {
            return Err(CheckoutError::NotAtPaymentStep);
        }

        // A discount validated against an outdated subtotal must not ride
        // into the order.
        self.refresh_discount(session).await?;

        let draft = match session.shopper() {
            Shopper::Authenticated { .. } => {
                assemble_order(&self.form, OrderParty::Authenticated, self.applied.as_ref())?
            }
            Shopper::Guest { cart } => {
                assemble_order(&self.form, OrderParty::Guest { cart }, self.applied.as_ref())?
            }
        };

        let token = session.token().cloned();
        let order = self.orders.create(&draft.request, token.clone()).await?;

        info!(order = %order.uuid, "order created");

        if let Err(error) = session.clear().await {
            // The order exists; an unclean cart is recoverable, losing the
            // order identifier is not.
            warn!(%error, "cart clear after order creation failed");
        }

        match self
            .orders
            .upload_receipt(order.uuid, &draft.receipt, token.clone())
            .await
        {
            Ok(updated) => Ok(Submission::Completed(updated)),
            Err(error) => {
                warn!(order = %order.uuid, %error, "receipt upload failed; retry available");

                self.pending = Some(PendingReceipt {
                    order: order.clone(),
                    receipt: draft.receipt,
                    token,
                });

                Ok(Submission::ReceiptPending { order, error })
            }
        }
    }

    /// Retries the receipt upload for a pending order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NothingPending`] when no upload is pending,
    /// or the API error when the retry fails (the pending state is kept for
    /// another attempt).
    pub async fn retry_receipt(&mut self) -> Result<Order, CheckoutError> {
        let pending = self.pending.as_ref().ok_or(CheckoutError::NothingPending)?;

        let updated = self
            .orders
            .upload_receipt(pending.order.uuid, &pending.receipt, pending.token.clone())
            .await?;

        info!(order = %updated.uuid, "receipt uploaded");
        self.pending = None;

        Ok(updated)
    }

    async fn published_products(&mut self) -> Result<&[Product], CheckoutError> {
        if self.product_cache.is_none() {
            let mut products = Vec::new();
            let mut page = 1;

            loop {
                let batch = self.products.list_published(page, PRODUCT_PAGE_LIMIT).await?;
                let has_more = batch.has_more();

                products.extend(batch.items);

                if !has_more {
                    break;
                }

                page += 1;
            }

            self.product_cache = Some(products);
        }

        Ok(self.product_cache.as_deref().unwrap_or_default())
    }
}
