//! In-memory gateway used by the cart unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use async_trait::async_trait;
use biblio_core::{CartId, CartItemId, OrderId, ProductId, UserId};
use rust_decimal::Decimal;

use crate::api::{
    ApiError, Cart, CartItem, CartItemPatch, CartItemUpdate, NewCartItem, NewOrder, Order, Product,
};
use crate::gateway::{CartGateway, OrderGateway, ProductGateway};

pub fn cart(id: i32, owner: Option<i32>) -> Cart {
    Cart {
        id: CartId::new(id),
        user_id: owner.map(UserId::new),
        created_at: None,
    }
}

pub fn product(id: i32, price: Decimal, stock: i32) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Book {id}"),
        author: "Author".to_string(),
        genre: "Novel".to_string(),
        description: String::new(),
        price,
        stock,
        image: None,
    }
}

pub fn item(id: i32, cart_id: i32, product_id: i32, quantity: u32) -> CartItem {
    CartItem {
        id: CartItemId::new(id),
        created_at: None,
        quantity,
        cart_id: CartId::new(cart_id),
        product_id: ProductId::new(product_id),
        product: None,
        product_list: None,
    }
}

fn server_error() -> ApiError {
    ApiError::Api {
        status: 500,
        message: "boom".to_string(),
    }
}

/// Gateway whose carts, items and products live in memory.
#[derive(Default)]
pub struct MockGateway {
    carts: Mutex<Vec<Cart>>,
    items: Mutex<Vec<CartItem>>,
    products: Mutex<HashMap<ProductId, Product>>,
    failing_products: Mutex<HashSet<ProductId>>,
    failing_deletes: Mutex<HashSet<CartItemId>>,
    created_owners: Mutex<Vec<Option<UserId>>>,
    product_fetches: Mutex<Vec<ProductId>>,
    orders: Mutex<Vec<NewOrder>>,
    list_carts_fails: AtomicBool,
    list_items_fails: AtomicBool,
    writes_fail: AtomicBool,
    echo_products: AtomicBool,
    bare_updates: AtomicBool,
    next_id: AtomicI32,
}

impl MockGateway {
    pub fn with_carts(carts: Vec<Cart>) -> Self {
        let gateway = Self::default();
        *gateway.carts.lock().unwrap() = carts;
        gateway
    }

    pub fn with_items(self, items: Vec<CartItem>) -> Self {
        *self.items.lock().unwrap() = items;
        self
    }

    pub fn with_product(self, product: Product) -> Self {
        self.products.lock().unwrap().insert(product.id, product);
        self
    }

    pub fn fail_list_carts(&self, fail: bool) {
        self.list_carts_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_list_items(&self, fail: bool) {
        self.list_items_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.writes_fail.store(fail, Ordering::SeqCst);
    }

    /// Embed the product in item write responses.
    pub fn echo_products(&self, echo: bool) {
        self.echo_products.store(echo, Ordering::SeqCst);
    }

    /// Answer updates with only `id` and `quantity`.
    pub fn bare_updates(&self, bare: bool) {
        self.bare_updates.store(bare, Ordering::SeqCst);
    }

    pub fn fail_product(&self, product_id: i32) {
        self.failing_products
            .lock()
            .unwrap()
            .insert(ProductId::new(product_id));
    }

    pub fn fail_delete(&self, item_id: i32) {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert(CartItemId::new(item_id));
    }

    pub fn created_carts(&self) -> usize {
        self.created_owners.lock().unwrap().len()
    }

    pub fn last_created_owner(&self) -> Option<Option<UserId>> {
        self.created_owners.lock().unwrap().last().copied()
    }

    pub fn product_fetches(&self) -> Vec<ProductId> {
        self.product_fetches.lock().unwrap().clone()
    }

    pub fn server_items(&self) -> Vec<CartItem> {
        self.items.lock().unwrap().clone()
    }

    pub fn placed_orders(&self) -> Vec<NewOrder> {
        self.orders.lock().unwrap().clone()
    }

    fn next_id(&self) -> i32 {
        100 + self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<(), ApiError> {
        if self.writes_fail.load(Ordering::SeqCst) {
            Err(server_error())
        } else {
            Ok(())
        }
    }

    fn response_item(&self, item: &CartItem) -> CartItem {
        let mut item = item.clone();
        item.product = if self.echo_products.load(Ordering::SeqCst) {
            self.products.lock().unwrap().get(&item.product_id).cloned()
        } else {
            None
        };
        item
    }
}

#[async_trait]
impl CartGateway for MockGateway {
    async fn list_carts(&self, owner: Option<UserId>) -> Result<Vec<Cart>, ApiError> {
        if self.list_carts_fails.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        let carts = self.carts.lock().unwrap();
        Ok(carts
            .iter()
            .filter(|c| owner.is_none() || c.owner() == owner)
            .cloned()
            .collect())
    }

    async fn create_cart(&self, owner: Option<UserId>) -> Result<Cart, ApiError> {
        self.check_write()?;
        let cart = Cart {
            id: CartId::new(self.next_id()),
            user_id: Some(owner.unwrap_or(UserId::ANONYMOUS)),
            created_at: None,
        };
        self.created_owners.lock().unwrap().push(owner);
        self.carts.lock().unwrap().push(cart.clone());
        Ok(cart)
    }

    async fn list_cart_items(&self, cart_id: Option<CartId>) -> Result<Vec<CartItem>, ApiError> {
        if self.list_items_fails.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|i| cart_id.is_none_or(|id| i.cart_id == id))
            .cloned()
            .collect())
    }

    async fn create_cart_item(&self, new: &NewCartItem) -> Result<CartItem, ApiError> {
        self.check_write()?;
        let stored = item(
            self.next_id(),
            new.cart_id.as_i32(),
            new.product_id.as_i32(),
            new.quantity,
        );
        self.items.lock().unwrap().push(stored.clone());
        Ok(self.response_item(&stored))
    }

    async fn update_cart_item(
        &self,
        item_id: CartItemId,
        update: &CartItemUpdate,
    ) -> Result<CartItemPatch, ApiError> {
        self.check_write()?;
        let mut items = self.items.lock().unwrap();
        let stored = items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| ApiError::NotFound(format!("/cart_item/{item_id}")))?;
        if let Some(quantity) = update.quantity {
            stored.quantity = quantity;
        }
        let stored = stored.clone();
        drop(items);
        if self.bare_updates.load(Ordering::SeqCst) {
            return Ok(CartItemPatch {
                id: Some(stored.id),
                quantity: Some(stored.quantity),
                ..CartItemPatch::default()
            });
        }
        Ok(self.response_item(&stored).into())
    }

    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
        self.check_write()?;
        if self.failing_deletes.lock().unwrap().contains(&item_id) {
            return Err(server_error());
        }
        self.items.lock().unwrap().retain(|i| i.id != item_id);
        Ok(())
    }
}

#[async_trait]
impl ProductGateway for MockGateway {
    async fn get_product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        self.product_fetches.lock().unwrap().push(product_id);
        if self.failing_products.lock().unwrap().contains(&product_id) {
            return Err(server_error());
        }
        self.products
            .lock()
            .unwrap()
            .get(&product_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("/product/{product_id}")))
    }
}

#[async_trait]
impl OrderGateway for MockGateway {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        self.check_write()?;
        self.orders.lock().unwrap().push(order.clone());
        Ok(Order {
            id: OrderId::new(self.next_id()),
            user_id: order.user_id,
            total: order.total,
            status: None,
            created_at: None,
        })
    }
}
