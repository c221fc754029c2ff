//! Cart resolution, synchronization and checkout.
//!
//! # Architecture
//!
//! - [`CartResolver`] decides which server cart this device uses
//! - [`CartSynchronizer`] mirrors that cart's items and applies mutations
//! - [`Storefront`] composes both into the flows a front end needs
//!
//! All three talk to the backend only through the gateway traits.

mod resolver;
mod sync;
mod totals;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing;

pub use resolver::{CartResolver, DEFAULT_MAX_UNVALIDATED_USES, Selection, select_cart};
pub use sync::{
    CartMirror, CartSynchronizer, ClearReport, MirrorState, QuantityChange, QuantityStep,
    merge_update,
};
pub use totals::{CheckoutSummary, SHIPPING_FEE, TAX_RATE};

use std::sync::Arc;

use biblio_core::{CartId, CurrencyCode, UserId};
use tracing::{info, instrument};

use crate::api::{ApiClient, CartItem, Order, Product};
use crate::error::CartError;
use crate::gateway::{CartGateway, OrderGateway, ProductGateway};
use crate::store::CartPointerStore;

/// What a completed checkout did.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub summary: CheckoutSummary,
    /// The placed order, when one was requested.
    pub order: Option<Order>,
    pub report: ClearReport,
}

/// Cart flows for one device session.
pub struct Storefront {
    resolver: CartResolver,
    sync: CartSynchronizer,
    orders: Arc<dyn OrderGateway>,
    currency: CurrencyCode,
}

impl Storefront {
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartGateway>,
        products: Arc<dyn ProductGateway>,
        orders: Arc<dyn OrderGateway>,
        pointer: Arc<dyn CartPointerStore>,
    ) -> Self {
        Self {
            resolver: CartResolver::new(Arc::clone(&carts), Arc::clone(&pointer)),
            sync: CartSynchronizer::new(carts, products, pointer),
            orders,
            currency: CurrencyCode::default(),
        }
    }

    /// Wire every gateway to one API client.
    #[must_use]
    pub fn from_api(api: ApiClient, pointer: Arc<dyn CartPointerStore>) -> Self {
        let api = Arc::new(api);
        Self::new(api.clone(), api.clone(), api, pointer)
    }

    #[must_use]
    pub fn with_max_unvalidated_uses(mut self, max: u32) -> Self {
        self.resolver = self.resolver.with_max_unvalidated_uses(max);
        self
    }

    #[must_use]
    pub const fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = currency;
        self
    }

    #[must_use]
    pub const fn resolver(&self) -> &CartResolver {
        &self.resolver
    }

    #[must_use]
    pub const fn synchronizer(&self) -> &CartSynchronizer {
        &self.sync
    }

    /// Resolve the session's cart and load its items.
    ///
    /// # Errors
    ///
    /// Returns an error if no cart can be resolved or its items cannot be
    /// listed.
    #[instrument(skip(self))]
    pub async fn open_cart(
        &self,
        user: Option<UserId>,
    ) -> Result<(CartId, Vec<CartItem>), CartError> {
        let cart_id = self.resolver.resolve_cart(user).await?;
        let items = self.sync.load(cart_id).await?;
        Ok((cart_id, items))
    }

    /// Resolve the session's cart and add `product` to it.
    ///
    /// # Errors
    ///
    /// Returns an error if no cart can be resolved or the item is rejected.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(
        &self,
        user: Option<UserId>,
        product: &Product,
        quantity: u32,
    ) -> Result<CartItem, CartError> {
        let cart_id = self.resolver.resolve_cart(user).await?;
        self.sync.add(cart_id, product, quantity).await
    }

    /// Totals for the mirrored items.
    #[must_use]
    pub fn summary(&self) -> CheckoutSummary {
        CheckoutSummary::from_items(&self.sync.items(), self.currency)
    }

    /// Check out the mirrored items.
    ///
    /// With `place_order`, an order for the current totals is created first;
    /// if that fails nothing is cleared. The cart is then cleared best effort.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EmptyCart`] when nothing is mirrored, or the
    /// order creation error.
    #[instrument(skip(self))]
    pub async fn checkout(
        &self,
        user: Option<UserId>,
        place_order: bool,
    ) -> Result<CheckoutReceipt, CartError> {
        let items = self.sync.items();
        if items.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let summary = CheckoutSummary::from_items(&items, self.currency);

        let order = if place_order {
            let order = self
                .orders
                .create_order(&summary.to_order(&items, user))
                .await?;
            Some(order)
        } else {
            None
        };

        let report = self.sync.clear_all(&items).await;
        info!(total = %summary.total, order = ?order.as_ref().map(|o| o.id), "Checkout complete");

        Ok(CheckoutReceipt {
            summary,
            order,
            report,
        })
    }
}
