//! Integration test support for the Biblio storefront client.
//!
//! [`InMemoryBackend`] behaves like the REST backend: it owns carts, items,
//! products and orders, assigns ids, and never embeds products in cart item
//! responses unless told to. Every gateway call is appended to a log so tests
//! can assert on the exact traffic a flow produced.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p biblio-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use biblio_client::api::{
    ApiError, Cart, CartItem, CartItemPatch, CartItemUpdate, NewCartItem, NewOrder, Order, Product,
};
use biblio_client::cart::Storefront;
use biblio_client::{CartGateway, CartPointerStore, OrderGateway, ProductGateway};
use biblio_core::{CartId, CartItemId, OrderId, OrderStatus, ProductId, UserId};
use rust_decimal::Decimal;

/// One gateway call, as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListCarts(Option<UserId>),
    CreateCart(Option<UserId>),
    ListItems(Option<CartId>),
    CreateItem(CartId, ProductId, u32),
    UpdateItem(CartItemId, Option<u32>),
    DeleteItem(CartItemId),
    GetProduct(ProductId),
    CreateOrder,
}

#[derive(Default)]
struct State {
    carts: Vec<Cart>,
    items: Vec<CartItem>,
    products: HashMap<ProductId, Product>,
    orders: Vec<(NewOrder, Order)>,
    broken_products: HashSet<ProductId>,
    broken_items: HashSet<CartItemId>,
    calls: Vec<Call>,
}

/// Stateful in-memory backend implementing every gateway.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
    offline: AtomicBool,
    embed_products: AtomicBool,
    bare_updates: AtomicBool,
    next_id: AtomicI32,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> i32 {
        1000 + self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Add a catalogue entry.
    pub fn stock(&self, id: i32, title: &str, price: Decimal, stock: i32) -> Product {
        let product = Product {
            id: ProductId::new(id),
            title: title.to_string(),
            author: "Anonymous".to_string(),
            genre: "Fiction".to_string(),
            description: String::new(),
            price,
            stock,
            image: None,
        };
        self.state().products.insert(product.id, product.clone());
        product
    }

    /// Add a cart directly, bypassing the gateway.
    pub fn seed_cart(&self, owner: Option<i32>) -> CartId {
        let cart = Cart {
            id: CartId::new(self.next_id()),
            user_id: Some(owner.map_or(UserId::ANONYMOUS, UserId::new)),
            created_at: None,
        };
        let id = cart.id;
        self.state().carts.push(cart);
        id
    }

    /// Add an item directly, bypassing the gateway.
    pub fn seed_item(&self, cart_id: CartId, product_id: i32, quantity: u32) -> CartItemId {
        let item = CartItem {
            id: CartItemId::new(self.next_id()),
            created_at: None,
            quantity,
            cart_id,
            product_id: ProductId::new(product_id),
            product: None,
            product_list: None,
        };
        let id = item.id;
        self.state().items.push(item);
        id
    }

    /// Remove a cart as another device or an administrator would.
    pub fn drop_cart(&self, cart_id: CartId) {
        let mut state = self.state();
        state.carts.retain(|c| c.id != cart_id);
        state.items.retain(|i| i.cart_id != cart_id);
    }

    /// Make every call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Embed the product in cart item responses.
    pub fn set_embed_products(&self, embed: bool) {
        self.embed_products.store(embed, Ordering::SeqCst);
    }

    /// Answer item updates with only `id` and `quantity`.
    pub fn set_bare_updates(&self, bare: bool) {
        self.bare_updates.store(bare, Ordering::SeqCst);
    }

    /// Make product lookups for `product_id` fail.
    pub fn break_product(&self, product_id: i32) {
        self.state()
            .broken_products
            .insert(ProductId::new(product_id));
    }

    /// Make updates and deletes of `item_id` fail.
    pub fn break_item(&self, item_id: CartItemId) {
        self.state().broken_items.insert(item_id);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn reset_calls(&self) {
        self.state().calls.clear();
    }

    #[must_use]
    pub fn carts(&self) -> Vec<Cart> {
        self.state().carts.clone()
    }

    #[must_use]
    pub fn items_in(&self, cart_id: CartId) -> Vec<CartItem> {
        self.state()
            .items
            .iter()
            .filter(|i| i.cart_id == cart_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<NewOrder> {
        self.state().orders.iter().map(|(o, _)| o.clone()).collect()
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        self.state().calls.push(call);
        if self.offline.load(Ordering::SeqCst) {
            Err(ApiError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn respond(&self, state: &State, item: &CartItem) -> CartItem {
        let mut item = item.clone();
        if self.embed_products.load(Ordering::SeqCst) {
            item.product = state.products.get(&item.product_id).cloned();
        }
        item
    }
}

fn not_found(what: impl std::fmt::Display) -> ApiError {
    ApiError::NotFound(what.to_string())
}

#[async_trait]
impl CartGateway for InMemoryBackend {
    async fn list_carts(&self, owner: Option<UserId>) -> Result<Vec<Cart>, ApiError> {
        self.record(Call::ListCarts(owner))?;
        Ok(self
            .state()
            .carts
            .iter()
            .filter(|c| owner.is_none() || c.owner() == owner)
            .cloned()
            .collect())
    }

    async fn create_cart(&self, owner: Option<UserId>) -> Result<Cart, ApiError> {
        self.record(Call::CreateCart(owner))?;
        let cart = Cart {
            id: CartId::new(self.next_id()),
            user_id: Some(owner.unwrap_or(UserId::ANONYMOUS)),
            created_at: Some(1_700_000_000_000),
        };
        self.state().carts.push(cart.clone());
        Ok(cart)
    }

    async fn list_cart_items(&self, cart_id: Option<CartId>) -> Result<Vec<CartItem>, ApiError> {
        self.record(Call::ListItems(cart_id))?;
        let state = self.state();
        Ok(state
            .items
            .iter()
            .filter(|i| cart_id.is_none_or(|id| i.cart_id == id))
            .map(|i| self.respond(&state, i))
            .collect())
    }

    async fn create_cart_item(&self, item: &NewCartItem) -> Result<CartItem, ApiError> {
        self.record(Call::CreateItem(item.cart_id, item.product_id, item.quantity))?;
        let created = CartItem {
            id: CartItemId::new(self.next_id()),
            created_at: Some(1_700_000_000_000),
            quantity: item.quantity,
            cart_id: item.cart_id,
            product_id: item.product_id,
            product: None,
            product_list: None,
        };
        let mut state = self.state();
        if !state.carts.iter().any(|c| c.id == item.cart_id) {
            return Err(not_found(format!("cart/{}", item.cart_id)));
        }
        state.items.push(created.clone());
        Ok(self.respond(&state, &created))
    }

    async fn update_cart_item(
        &self,
        item_id: CartItemId,
        update: &CartItemUpdate,
    ) -> Result<CartItemPatch, ApiError> {
        self.record(Call::UpdateItem(item_id, update.quantity))?;
        let mut state = self.state();
        if state.broken_items.contains(&item_id) {
            return Err(ApiError::Api {
                status: 500,
                message: "update failed".to_string(),
            });
        }
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| not_found(format!("cart_item/{item_id}")))?;
        if let Some(quantity) = update.quantity {
            item.quantity = quantity;
        }
        let item = item.clone();
        if self.bare_updates.load(Ordering::SeqCst) {
            return Ok(CartItemPatch {
                id: Some(item.id),
                quantity: Some(item.quantity),
                ..CartItemPatch::default()
            });
        }
        Ok(self.respond(&state, &item).into())
    }

    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
        self.record(Call::DeleteItem(item_id))?;
        let mut state = self.state();
        if state.broken_items.contains(&item_id) {
            return Err(ApiError::Api {
                status: 500,
                message: "delete failed".to_string(),
            });
        }
        let before = state.items.len();
        state.items.retain(|i| i.id != item_id);
        if state.items.len() == before {
            return Err(not_found(format!("cart_item/{item_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductGateway for InMemoryBackend {
    async fn get_product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        self.record(Call::GetProduct(product_id))?;
        let state = self.state();
        if state.broken_products.contains(&product_id) {
            return Err(ApiError::Api {
                status: 500,
                message: "product lookup failed".to_string(),
            });
        }
        state
            .products
            .get(&product_id)
            .cloned()
            .ok_or_else(|| not_found(format!("product/{product_id}")))
    }
}

#[async_trait]
impl OrderGateway for InMemoryBackend {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        self.record(Call::CreateOrder)?;
        let placed = Order {
            id: OrderId::new(self.next_id()),
            user_id: order.user_id,
            total: order.total,
            status: Some(OrderStatus::Pending),
            created_at: Some(1_700_000_000_000),
        };
        self.state().orders.push((order.clone(), placed.clone()));
        Ok(placed)
    }
}

/// A storefront wired entirely to `backend`.
#[must_use]
pub fn storefront(backend: &Arc<InMemoryBackend>, pointer: Arc<dyn CartPointerStore>) -> Storefront {
    Storefront::new(backend.clone(), backend.clone(), backend.clone(), pointer)
}
