//! Cart identity resolution.
//!
//! Picks the one server-side cart a device session operates on. The server's
//! ownership records always win over the local pointer, a stored id is only
//! trusted when the server confirms it (or cannot be asked), and the pointer
//! never ends up naming another user's cart.

use std::sync::Arc;

use biblio_core::{CartId, UserId};
use tracing::{debug, info, instrument, warn};

use crate::api::Cart;
use crate::error::CartError;
use crate::gateway::CartGateway;
use crate::store::CartPointerStore;

/// Default bound on consecutive unvalidated uses of a stored cart id.
pub const DEFAULT_MAX_UNVALIDATED_USES: u32 = 3;

/// Outcome of inspecting the server's cart list against the local pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// A cart owned by the current user.
    Owned(CartId),
    /// The stored id, confirmed by the server list.
    Validated(CartId),
    /// The stored id, accepted without confirmation because the list is empty.
    Unvalidated(CartId),
    /// The stored id names another user's cart.
    Foreign(CartId),
    /// The stored id is absent from a non-empty server list.
    Stale(CartId),
    /// Nothing usable; a new cart is needed.
    Create,
}

/// Decide which cart to use, without side effects.
///
/// `carts` is the unfiltered server list in server order (empty when the list
/// request failed).
#[must_use]
pub fn select_cart(carts: &[Cart], current_user: Option<UserId>, stored: Option<CartId>) -> Selection {
    if let Some(user) = current_user
        && let Some(cart) = carts.iter().find(|c| c.owner() == Some(user))
    {
        return Selection::Owned(cart.id);
    }

    let Some(stored) = stored else {
        return Selection::Create;
    };

    if carts.is_empty() {
        return Selection::Unvalidated(stored);
    }

    match carts.iter().find(|c| c.id == stored) {
        Some(cart) => match (current_user, cart.owner()) {
            (None, _) | (_, None) => Selection::Validated(stored),
            (Some(user), Some(owner)) if user == owner => Selection::Validated(stored),
            (Some(_), Some(_)) => Selection::Foreign(stored),
        },
        None => Selection::Stale(stored),
    }
}

/// Resolves the cart id for the current session.
#[derive(Clone)]
pub struct CartResolver {
    carts: Arc<dyn CartGateway>,
    pointer: Arc<dyn CartPointerStore>,
    max_unvalidated_uses: u32,
}

impl CartResolver {
    /// Create a resolver with the default unvalidated-use bound.
    #[must_use]
    pub fn new(carts: Arc<dyn CartGateway>, pointer: Arc<dyn CartPointerStore>) -> Self {
        Self {
            carts,
            pointer,
            max_unvalidated_uses: DEFAULT_MAX_UNVALIDATED_USES,
        }
    }

    /// Set how many times in a row a stored id may be used while the server
    /// returns no carts.
    #[must_use]
    pub const fn with_max_unvalidated_uses(mut self, max: u32) -> Self {
        self.max_unvalidated_uses = max;
        self
    }

    /// Resolve the cart the session should use, creating one if needed.
    ///
    /// The chosen id is always stored in the pointer before returning. Once a
    /// stored id has gone unvalidated more than `max_unvalidated_uses` times,
    /// a replacement cart is created; if that fails too, the stored id is
    /// still returned.
    ///
    /// # Errors
    ///
    /// Returns an error if a cart has to be created and creation fails, or if
    /// the pointer cannot be written.
    #[instrument(skip(self))]
    pub async fn resolve_cart(&self, current_user: Option<UserId>) -> Result<CartId, CartError> {
        let carts = match self.carts.list_carts(None).await {
            Ok(carts) => carts,
            Err(e) => {
                warn!(error = %e, "Failed to list carts, treating list as empty");
                Vec::new()
            }
        };

        let stored = match self.pointer.get() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to read cart pointer, ignoring it");
                None
            }
        };

        debug!(carts = carts.len(), stored = ?stored, "Resolving cart");

        match select_cart(&carts, current_user, stored) {
            Selection::Owned(cart_id) => {
                debug!(cart_id = %cart_id, "Using cart owned by current user");
                self.pointer.set(cart_id)?;
                Ok(cart_id)
            }
            Selection::Validated(cart_id) => {
                debug!(cart_id = %cart_id, "Using stored cart");
                self.pointer.set(cart_id)?;
                Ok(cart_id)
            }
            Selection::Unvalidated(cart_id) => {
                let uses = self.pointer.record_unvalidated_use()?;
                if uses <= self.max_unvalidated_uses {
                    debug!(
                        cart_id = %cart_id,
                        uses,
                        "No carts returned by backend, using stored cart without validation"
                    );
                    return Ok(cart_id);
                }
                warn!(
                    cart_id = %cart_id,
                    uses,
                    max = self.max_unvalidated_uses,
                    "Stored cart could not be validated too many times, replacing it"
                );
                // The new cart's id overwrites the pointer; a failed creation
                // leaves the stored id in place.
                match self.create(current_user).await {
                    Ok(replacement) => Ok(replacement),
                    Err(e) => {
                        warn!(
                            cart_id = %cart_id,
                            error = %e,
                            "Could not create replacement cart, keeping stored cart"
                        );
                        Ok(cart_id)
                    }
                }
            }
            Selection::Foreign(cart_id) => {
                warn!(cart_id = %cart_id, "Stored cart belongs to another user, discarding it");
                self.discard_pointer();
                self.create(current_user).await
            }
            Selection::Stale(cart_id) => {
                warn!(cart_id = %cart_id, "Stored cart not found on server, discarding it");
                self.discard_pointer();
                self.create(current_user).await
            }
            Selection::Create => self.create(current_user).await,
        }
    }

    /// Forget the stored id when it names a cart owned by `user`.
    ///
    /// Called when `user` leaves the device. Anonymous carts and ids the
    /// server does not list are kept. Returns whether the pointer was cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer cannot be read or cleared, or the cart
    /// list cannot be fetched; the pointer is left untouched in that case.
    #[instrument(skip(self))]
    pub async fn release_pointer(&self, user: UserId) -> Result<bool, CartError> {
        let Some(stored) = self.pointer.get()? else {
            return Ok(false);
        };

        let carts = self.carts.list_carts(None).await?;
        let owned = carts
            .iter()
            .any(|c| c.id == stored && c.owner() == Some(user));
        if owned {
            self.pointer.clear()?;
            info!(cart_id = %stored, "Released cart pointer on logout");
        }
        Ok(owned)
    }

    async fn create(&self, current_user: Option<UserId>) -> Result<CartId, CartError> {
        if current_user.is_none() {
            info!("No user identified and no usable cart, creating anonymous cart");
        }

        let cart = self.carts.create_cart(current_user).await?;
        self.pointer.set(cart.id)?;

        info!(cart_id = %cart.id, owner = ?cart.owner(), "Created cart");
        Ok(cart.id)
    }

    fn discard_pointer(&self) {
        if let Err(e) = self.pointer.clear() {
            warn!(error = %e, "Failed to clear cart pointer");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::testing::{MockGateway, cart};
    use crate::store::MemoryCartPointerStore;

    fn resolver(gateway: &Arc<MockGateway>, pointer: &Arc<MemoryCartPointerStore>) -> CartResolver {
        CartResolver::new(gateway.clone(), pointer.clone())
    }

    #[test]
    fn test_select_prefers_owned_cart_over_stored() {
        let carts = [cart(3, None), cart(5, Some(42)), cart(6, Some(42))];
        assert_eq!(
            select_cart(&carts, Some(UserId::new(42)), Some(CartId::new(3))),
            Selection::Owned(CartId::new(5))
        );
    }

    #[test]
    fn test_select_stored_cart_rules() {
        let carts = [cart(3, None), cart(4, Some(7)), cart(5, Some(42))];
        let stored = |id| Some(CartId::new(id));

        // Anonymous cart is usable by anyone.
        assert_eq!(
            select_cart(&carts, Some(UserId::new(9)), stored(3)),
            Selection::Validated(CartId::new(3))
        );
        // Unknown user accepts any listed cart.
        assert_eq!(
            select_cart(&carts, None, stored(4)),
            Selection::Validated(CartId::new(4))
        );
        assert_eq!(
            select_cart(&carts, Some(UserId::new(9)), stored(4)),
            Selection::Foreign(CartId::new(4))
        );
        assert_eq!(
            select_cart(&carts, Some(UserId::new(9)), stored(8)),
            Selection::Stale(CartId::new(8))
        );
        assert_eq!(
            select_cart(&[], Some(UserId::new(9)), stored(8)),
            Selection::Unvalidated(CartId::new(8))
        );
        assert_eq!(select_cart(&carts, Some(UserId::new(9)), None), Selection::Create);
    }

    #[tokio::test]
    async fn test_owned_cart_replaces_stored_pointer() {
        let gateway = Arc::new(MockGateway::with_carts(vec![cart(5, Some(42))]));
        let pointer = Arc::new(MemoryCartPointerStore::with_cart(CartId::new(7)));

        let cart_id = resolver(&gateway, &pointer)
            .resolve_cart(Some(UserId::new(42)))
            .await
            .unwrap();

        assert_eq!(cart_id, CartId::new(5));
        assert_eq!(pointer.get().unwrap(), Some(CartId::new(5)));
        assert_eq!(gateway.created_carts(), 0);
    }

    #[tokio::test]
    async fn test_empty_list_accepts_stored_pointer_optimistically() {
        let gateway = Arc::new(MockGateway::default());
        gateway.fail_list_carts(true);
        let pointer = Arc::new(MemoryCartPointerStore::with_cart(CartId::new(7)));

        let cart_id = resolver(&gateway, &pointer)
            .resolve_cart(Some(UserId::new(42)))
            .await
            .unwrap();

        assert_eq!(cart_id, CartId::new(7));
        assert_eq!(pointer.get().unwrap(), Some(CartId::new(7)));
        assert_eq!(gateway.created_carts(), 0);
    }

    #[tokio::test]
    async fn test_unvalidated_pointer_is_replaced_after_bound() {
        let gateway = Arc::new(MockGateway::default());
        let pointer = Arc::new(MemoryCartPointerStore::with_cart(CartId::new(7)));
        let resolver = resolver(&gateway, &pointer).with_max_unvalidated_uses(2);

        assert_eq!(resolver.resolve_cart(None).await.unwrap(), CartId::new(7));
        assert_eq!(resolver.resolve_cart(None).await.unwrap(), CartId::new(7));

        let replaced = resolver.resolve_cart(None).await.unwrap();
        assert_ne!(replaced, CartId::new(7));
        assert_eq!(pointer.get().unwrap(), Some(replaced));
        assert_eq!(pointer.unvalidated_uses(), 0);
        assert_eq!(gateway.created_carts(), 1);
    }

    #[tokio::test]
    async fn test_outage_past_bound_keeps_stored_pointer() {
        let gateway = Arc::new(MockGateway::default());
        gateway.fail_list_carts(true);
        gateway.fail_writes(true);
        let pointer = Arc::new(MemoryCartPointerStore::with_cart(CartId::new(7)));
        let resolver = resolver(&gateway, &pointer).with_max_unvalidated_uses(1);

        for _ in 0..3 {
            assert_eq!(resolver.resolve_cart(None).await.unwrap(), CartId::new(7));
            assert_eq!(pointer.get().unwrap(), Some(CartId::new(7)));
        }
        assert_eq!(gateway.created_carts(), 0);

        gateway.fail_writes(false);
        let replaced = resolver.resolve_cart(None).await.unwrap();
        assert_ne!(replaced, CartId::new(7));
        assert_eq!(pointer.get().unwrap(), Some(replaced));
        assert_eq!(pointer.unvalidated_uses(), 0);
    }

    #[tokio::test]
    async fn test_stale_pointer_is_erased_and_never_returned() {
        let gateway = Arc::new(MockGateway::with_carts(vec![cart(5, Some(99))]));
        let pointer = Arc::new(MemoryCartPointerStore::with_cart(CartId::new(7)));

        let cart_id = resolver(&gateway, &pointer)
            .resolve_cart(Some(UserId::new(42)))
            .await
            .unwrap();

        assert_ne!(cart_id, CartId::new(7));
        assert_eq!(pointer.get().unwrap(), Some(cart_id));
        assert_eq!(gateway.created_carts(), 1);
        assert_eq!(gateway.last_created_owner(), Some(Some(UserId::new(42))));
    }

    #[tokio::test]
    async fn test_foreign_pointer_is_discarded() {
        let gateway = Arc::new(MockGateway::with_carts(vec![cart(7, Some(1))]));
        let pointer = Arc::new(MemoryCartPointerStore::with_cart(CartId::new(7)));

        let cart_id = resolver(&gateway, &pointer)
            .resolve_cart(Some(UserId::new(2)))
            .await
            .unwrap();

        assert_ne!(cart_id, CartId::new(7));
        assert_eq!(pointer.get().unwrap(), Some(cart_id));
    }

    #[tokio::test]
    async fn test_creates_anonymous_cart_without_user() {
        let gateway = Arc::new(MockGateway::default());
        let pointer = Arc::new(MemoryCartPointerStore::new());

        let cart_id = resolver(&gateway, &pointer).resolve_cart(None).await.unwrap();

        assert_eq!(pointer.get().unwrap(), Some(cart_id));
        assert_eq!(gateway.last_created_owner(), Some(None));
    }

    #[tokio::test]
    async fn test_release_clears_pointer_to_own_cart() {
        let gateway = Arc::new(MockGateway::with_carts(vec![cart(5, Some(42))]));
        let pointer = Arc::new(MemoryCartPointerStore::with_cart(CartId::new(5)));

        let released = resolver(&gateway, &pointer)
            .release_pointer(UserId::new(42))
            .await
            .unwrap();

        assert!(released);
        assert_eq!(pointer.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_release_keeps_anonymous_and_unknown_carts() {
        let gateway = Arc::new(MockGateway::with_carts(vec![cart(3, None), cart(5, Some(42))]));
        let pointer = Arc::new(MemoryCartPointerStore::with_cart(CartId::new(3)));
        let resolver = resolver(&gateway, &pointer);

        assert!(!resolver.release_pointer(UserId::new(42)).await.unwrap());
        assert_eq!(pointer.get().unwrap(), Some(CartId::new(3)));

        pointer.set(CartId::new(8)).unwrap();
        assert!(!resolver.release_pointer(UserId::new(42)).await.unwrap());
        assert_eq!(pointer.get().unwrap(), Some(CartId::new(8)));
    }

    #[tokio::test]
    async fn test_release_keeps_pointer_when_list_fails() {
        let gateway = Arc::new(MockGateway::with_carts(vec![cart(5, Some(42))]));
        gateway.fail_list_carts(true);
        let pointer = Arc::new(MemoryCartPointerStore::with_cart(CartId::new(5)));

        let result = resolver(&gateway, &pointer)
            .release_pointer(UserId::new(42))
            .await;

        assert!(result.is_err());
        assert_eq!(pointer.get().unwrap(), Some(CartId::new(5)));
    }

    #[tokio::test]
    async fn test_creation_failure_is_propagated() {
        let gateway = Arc::new(MockGateway::default());
        gateway.fail_writes(true);
        let pointer = Arc::new(MemoryCartPointerStore::new());

        let result = resolver(&gateway, &pointer).resolve_cart(None).await;

        assert!(matches!(result, Err(CartError::Gateway(_))));
        assert_eq!(pointer.get().unwrap(), None);
    }
}
