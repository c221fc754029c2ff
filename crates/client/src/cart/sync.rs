//! Cart item synchronization.
//!
//! [`CartSynchronizer`] owns the local mirror of one cart's items and keeps it
//! in step with what the server has confirmed. A mutation touches the mirror
//! only after the server accepted it; a failed mutation leaves the mirror as it
//! was and returns the error.
//!
//! The mirror is published on a `tokio::sync::watch` channel so a front end
//! can render every transition.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use biblio_core::{CartId, ProductId};
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::{CartItem, CartItemPatch, CartItemUpdate, NewCartItem, Product};
use crate::error::CartError;
use crate::gateway::{CartGateway, ProductGateway};
use crate::store::CartPointerStore;

/// Lifecycle of the local mirror.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MirrorState {
    /// Nothing loaded yet.
    #[default]
    Idle,
    /// A load is in flight.
    Loading,
    /// Items confirmed by the server.
    Populated(Vec<CartItem>),
    /// The server confirmed the cart has no items.
    Empty,
    /// The first load failed.
    Failed(String),
}

impl MirrorState {
    /// Items currently mirrored (empty unless populated).
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        match self {
            Self::Populated(items) => items,
            _ => &[],
        }
    }

    /// Whether a load has succeeded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Populated(_) | Self::Empty)
    }

    fn from_items(items: Vec<CartItem>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Populated(items)
        }
    }
}

/// Snapshot of the mirror published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartMirror {
    pub cart_id: Option<CartId>,
    pub state: MirrorState,
}

/// Result of a best-effort bulk delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Items the server deleted.
    pub deleted: Vec<CartItem>,
    /// Items whose delete failed, with the error message.
    pub failed: Vec<(CartItem, String)>,
}

impl ClearReport {
    /// Whether every delete succeeded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One-unit quantity change requested by a front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityStep {
    Increment,
    Decrement,
}

/// Outcome of [`CartSynchronizer::adjust_quantity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityChange {
    /// The server accepted the new quantity.
    Updated(CartItem),
    /// The quantity reached zero and the item was deleted.
    Removed,
    /// No more stock; nothing was sent.
    OutOfStock { available: u32 },
}

/// Keeps a local mirror of a cart's items consistent with the server.
pub struct CartSynchronizer {
    carts: Arc<dyn CartGateway>,
    products: Arc<dyn ProductGateway>,
    pointer: Arc<dyn CartPointerStore>,
    mirror: watch::Sender<CartMirror>,
}

impl CartSynchronizer {
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartGateway>,
        products: Arc<dyn ProductGateway>,
        pointer: Arc<dyn CartPointerStore>,
    ) -> Self {
        Self {
            carts,
            products,
            pointer,
            mirror: watch::Sender::new(CartMirror::default()),
        }
    }

    /// Observe mirror transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartMirror> {
        self.mirror.subscribe()
    }

    /// Current mirror snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartMirror {
        self.mirror.borrow().clone()
    }

    /// Items currently mirrored.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.mirror.borrow().state.items().to_vec()
    }

    /// Load the cart's items, repairing missing products.
    ///
    /// Items with neither an inline product nor a product array get their
    /// product fetched, one concurrent request per distinct product id. A
    /// failed fetch leaves that item unresolved; it never fails the load.
    ///
    /// # Errors
    ///
    /// Returns an error if the item list cannot be fetched. The mirror then
    /// keeps its previous contents if an earlier load succeeded, and becomes
    /// [`MirrorState::Failed`] otherwise.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn load(&self, cart_id: CartId) -> Result<Vec<CartItem>, CartError> {
        let previous = self.mirror.send_replace(CartMirror {
            cart_id: Some(cart_id),
            state: MirrorState::Loading,
        });

        let raw = match self.carts.list_cart_items(Some(cart_id)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to load cart items");
                let restored = if previous.state.is_loaded() {
                    previous
                } else {
                    CartMirror {
                        cart_id: Some(cart_id),
                        state: MirrorState::Failed(e.to_string()),
                    }
                };
                self.mirror.send_replace(restored);
                return Err(e.into());
            }
        };

        let items = self.repair_products(raw).await;
        debug!(count = items.len(), "Loaded cart items");

        self.mirror.send_replace(CartMirror {
            cart_id: Some(cart_id),
            state: MirrorState::from_items(items.clone()),
        });
        Ok(items)
    }

    /// Fill in embedded products, fetching the ones the server omitted.
    async fn repair_products(&self, raw: Vec<CartItem>) -> Vec<CartItem> {
        let items: Vec<CartItem> = raw
            .into_iter()
            .map(CartItem::with_resolved_product)
            .collect();

        let missing: BTreeSet<ProductId> = items
            .iter()
            .filter(|item| item.is_unresolved())
            .map(|item| item.product_id)
            .collect();

        if missing.is_empty() {
            return items;
        }

        let fetched = self.fetch_products(missing).await;

        items
            .into_iter()
            .map(|mut item| {
                if item.product.is_none() {
                    item.product = fetched.get(&item.product_id).cloned();
                }
                item
            })
            .collect()
    }

    async fn fetch_products(&self, ids: BTreeSet<ProductId>) -> HashMap<ProductId, Product> {
        debug!(count = ids.len(), "Fetching missing products");

        let products = &self.products;
        let results = join_all(
            ids.into_iter()
                .map(|id| async move { (id, products.get_product(id).await) }),
        )
        .await;

        results
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(product) => Some((id, product)),
                Err(e) => {
                    warn!(product_id = %id, error = %e, "Failed to fetch product for cart item");
                    None
                }
            })
            .collect()
    }

    /// Set an item's quantity.
    ///
    /// The server's response replaces the mirrored item, except that the
    /// local embedded product is kept when the response carries none. If the
    /// item is not in the mirror, the cart is reloaded instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the update; the mirror is
    /// unchanged.
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn change_quantity(&self, item: &CartItem, quantity: u32) -> Result<CartItem, CartError> {
        let mut response = self
            .carts
            .update_cart_item(item.id, &CartItemUpdate::quantity(quantity))
            .await?;
        response.quantity.get_or_insert(quantity);
        let merged = merge_update(item, response);

        let replaced = self.mirror.send_if_modified(|mirror| {
            let MirrorState::Populated(items) = &mut mirror.state else {
                return false;
            };
            match items.iter_mut().find(|existing| existing.id == merged.id) {
                Some(existing) => {
                    *existing = merged.clone();
                    true
                }
                None => false,
            }
        });

        if !replaced {
            let cart_id = self.mirror.borrow().cart_id.unwrap_or(merged.cart_id);
            debug!(cart_id = %cart_id, "Updated item not mirrored, reloading cart");
            if let Err(e) = self.load(cart_id).await {
                warn!(error = %e, "Reload after quantity change failed");
            }
        }

        Ok(merged)
    }

    /// Delete an item.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the delete; the mirror is
    /// unchanged.
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn remove(&self, item: &CartItem) -> Result<(), CartError> {
        self.carts.delete_cart_item(item.id).await?;

        self.mirror.send_if_modified(|mirror| {
            let MirrorState::Populated(items) = &mut mirror.state else {
                return false;
            };
            let before = items.len();
            items.retain(|existing| existing.id != item.id);
            if items.len() == before {
                return false;
            }
            if items.is_empty() {
                mirror.state = MirrorState::Empty;
            }
            true
        });

        Ok(())
    }

    /// Step an item's quantity by one.
    ///
    /// Incrementing past the product's stock is refused without a request.
    /// Decrementing to zero deletes the item.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting update or delete fails.
    pub async fn adjust_quantity(
        &self,
        item: &CartItem,
        step: QuantityStep,
    ) -> Result<QuantityChange, CartError> {
        match step {
            QuantityStep::Increment => {
                if let Some(product) = item.embedded_product() {
                    let available = u32::try_from(product.stock).unwrap_or(0);
                    if item.quantity >= available {
                        return Ok(QuantityChange::OutOfStock { available });
                    }
                }
                let updated = self
                    .change_quantity(item, item.quantity.saturating_add(1))
                    .await?;
                Ok(QuantityChange::Updated(updated))
            }
            QuantityStep::Decrement => {
                if item.quantity <= 1 {
                    self.remove(item).await?;
                    Ok(QuantityChange::Removed)
                } else {
                    let updated = self.change_quantity(item, item.quantity - 1).await?;
                    Ok(QuantityChange::Updated(updated))
                }
            }
        }
    }

    /// Add `quantity` of `product` to a cart.
    ///
    /// The cart id echoed by the server is stored in the pointer. The mirror
    /// picks up the new item when it is mirroring that cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the new item.
    #[instrument(skip(self, product), fields(cart_id = %cart_id, product_id = %product.id))]
    pub async fn add(
        &self,
        cart_id: CartId,
        product: &Product,
        quantity: u32,
    ) -> Result<CartItem, CartError> {
        let request = NewCartItem {
            cart_id,
            product_id: product.id,
            quantity,
        };
        let created = self.carts.create_cart_item(&request).await?;

        if let Err(e) = self.pointer.set(created.cart_id) {
            warn!(error = %e, "Failed to store cart id returned by new item");
        }

        let mut item = created.with_resolved_product();
        if item.product.is_none() {
            item.product = Some(product.clone());
        }

        self.mirror.send_if_modified(|mirror| {
            if mirror.cart_id != Some(item.cart_id) || !mirror.state.is_loaded() {
                return false;
            }
            let mut items = mirror.state.items().to_vec();
            match items.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => *existing = item.clone(),
                None => items.push(item.clone()),
            }
            mirror.state = MirrorState::Populated(items);
            true
        });

        info!(item_id = %item.id, quantity, "Added item to cart");
        Ok(item)
    }

    /// Delete every item, best effort, then empty the mirror and erase the
    /// cart pointer.
    ///
    /// Deletes run one after another; a failure is recorded and the rest are
    /// still attempted.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn clear_all(&self, items: &[CartItem]) -> ClearReport {
        let mut report = ClearReport::default();

        for item in items {
            match self.carts.delete_cart_item(item.id).await {
                Ok(()) => report.deleted.push(item.clone()),
                Err(e) => {
                    warn!(item_id = %item.id, error = %e, "Failed to delete cart item");
                    report.failed.push((item.clone(), e.to_string()));
                }
            }
        }

        self.mirror.send_modify(|mirror| mirror.state = MirrorState::Empty);

        if let Err(e) = self.pointer.clear() {
            warn!(error = %e, "Failed to clear cart pointer");
        }

        info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Cleared cart"
        );
        report
    }
}

/// Merge an update response into the local item.
///
/// Fields present in the response win. Anything it leaves out, including the
/// embedded product, is kept from the local item.
#[must_use]
pub fn merge_update(local: &CartItem, response: CartItemPatch) -> CartItem {
    let product = response
        .product
        .or_else(|| response.product_list.and_then(|list| list.into_iter().next()))
        .or_else(|| local.embedded_product().cloned());

    CartItem {
        id: response.id.unwrap_or(local.id),
        created_at: response.created_at.or(local.created_at),
        quantity: response.quantity.unwrap_or(local.quantity),
        cart_id: response.cart_id.unwrap_or(local.cart_id),
        product_id: response.product_id.unwrap_or(local.product_id),
        product,
        product_list: None,
    }
}
