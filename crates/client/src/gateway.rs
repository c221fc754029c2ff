//! Gateway traits between the cart core and the backend.
//!
//! The resolver and synchronizer only ever talk to these traits. [`ApiClient`]
//! implements all of them over HTTP; tests substitute in-memory mocks.
//!
//! [`ApiClient`]: crate::ApiClient

use async_trait::async_trait;
use biblio_core::{CartId, CartItemId, ProductId, UserId};

use crate::api::{
    ApiError, Cart, CartItem, CartItemPatch, CartItemUpdate, NewCartItem, NewOrder, Order, Product,
};

/// Remote cart and cart-item operations.
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// List carts, optionally filtered by owner.
    async fn list_carts(&self, owner: Option<UserId>) -> Result<Vec<Cart>, ApiError>;

    /// Create a cart. `None` creates an anonymous cart.
    async fn create_cart(&self, owner: Option<UserId>) -> Result<Cart, ApiError>;

    /// List items, optionally filtered by cart.
    async fn list_cart_items(&self, cart_id: Option<CartId>) -> Result<Vec<CartItem>, ApiError>;

    /// Add a product to a cart.
    async fn create_cart_item(&self, item: &NewCartItem) -> Result<CartItem, ApiError>;

    /// Apply a partial update to an item. The response may carry only `id`
    /// and `quantity`.
    async fn update_cart_item(
        &self,
        item_id: CartItemId,
        update: &CartItemUpdate,
    ) -> Result<CartItemPatch, ApiError>;

    /// Delete an item.
    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<(), ApiError>;
}

/// Single-product lookup used to repair items without an embedded product.
#[async_trait]
pub trait ProductGateway: Send + Sync {
    async fn get_product(&self, product_id: ProductId) -> Result<Product, ApiError>;
}

/// Order placement used by checkout.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError>;
}
