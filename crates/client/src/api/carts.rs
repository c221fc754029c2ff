//! Cart and cart item endpoints (never cached - mutable state).

use async_trait::async_trait;
use biblio_core::{CartId, CartItemId, UserId};
use reqwest::Method;
use tracing::{debug, instrument};

use super::{
    ApiClient, ApiError, Cart, CartItem, CartItemPatch, CartItemUpdate, NewCart, NewCartItem,
};
use crate::gateway::CartGateway;

#[async_trait]
impl CartGateway for ApiClient {
    #[instrument(skip(self))]
    async fn list_carts(&self, owner: Option<UserId>) -> Result<Vec<Cart>, ApiError> {
        let mut url = self.store_url("cart")?;
        if let Some(owner) = owner {
            url.query_pairs_mut()
                .append_pair("user_id", &owner.to_string());
        }

        let carts: Vec<Cart> = Self::send_json(self.request(Method::GET, url)).await?;
        debug!(count = carts.len(), "Listed carts");
        Ok(carts)
    }

    #[instrument(skip(self))]
    async fn create_cart(&self, owner: Option<UserId>) -> Result<Cart, ApiError> {
        let url = self.store_url("cart")?;
        let body = NewCart::for_owner(owner);

        let cart: Cart = Self::send_json(self.request(Method::POST, url).json(&body)).await?;
        debug!(cart_id = %cart.id, "Created cart");
        Ok(cart)
    }

    #[instrument(skip(self))]
    async fn list_cart_items(&self, cart_id: Option<CartId>) -> Result<Vec<CartItem>, ApiError> {
        let mut url = self.store_url("cart_item")?;
        if let Some(cart_id) = cart_id {
            url.query_pairs_mut()
                .append_pair("cart_id", &cart_id.to_string());
        }

        let items: Vec<CartItem> = Self::send_json(self.request(Method::GET, url)).await?;
        debug!(count = items.len(), "Listed cart items");
        Ok(items)
    }

    #[instrument(skip(self), fields(cart_id = %item.cart_id, product_id = %item.product_id))]
    async fn create_cart_item(&self, item: &NewCartItem) -> Result<CartItem, ApiError> {
        let url = self.store_url("cart_item")?;
        Self::send_json(self.request(Method::POST, url).json(item)).await
    }

    #[instrument(skip(self, update), fields(item_id = %item_id))]
    async fn update_cart_item(
        &self,
        item_id: CartItemId,
        update: &CartItemUpdate,
    ) -> Result<CartItemPatch, ApiError> {
        let url = self.store_url(&format!("cart_item/{item_id}"))?;
        Self::send_json(self.request(Method::PATCH, url).json(update)).await
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
        let url = self.store_url(&format!("cart_item/{item_id}"))?;
        Self::send_empty(self.request(Method::DELETE, url)).await
    }
}

impl ApiClient {
    /// Get a single cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is not found or the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: CartId) -> Result<Cart, ApiError> {
        let url = self.store_url(&format!("cart/{cart_id}"))?;
        Self::send_json(self.request(Method::GET, url)).await
    }
}
