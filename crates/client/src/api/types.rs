//! Wire types for the Biblio REST API.
//!
//! Field names follow the backend's snake_case JSON. Partial updates are
//! explicit structs whose `None` fields are omitted from the request body,
//! so only the attributes a caller sets are sent.

use biblio_core::{
    CartId, CartItemId, CurrencyCode, Email, OrderId, OrderStatus, Price, ProductId, Role, UserId,
    UserStatus,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Convert an epoch-milliseconds timestamp as sent by the backend.
fn millis_to_datetime(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.and_then(DateTime::from_timestamp_millis)
}

// =============================================================================
// Product Types
// =============================================================================

/// Pixel dimensions of an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// An uploaded product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Storage path, relative to the store base URL unless absolute.
    pub path: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub size: Option<i64>,
    pub mime: Option<String>,
    pub access: Option<String>,
    /// Public URL, when the backend provides one.
    pub url: Option<String>,
    pub meta: Option<ImageMeta>,
}

impl ProductImage {
    /// Best URL for displaying this image.
    ///
    /// Prefers the explicit `url`; otherwise resolves `path` against the
    /// store base URL unless it is already absolute.
    #[must_use]
    pub fn display_url(&self, base: &url::Url) -> Option<String> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Some(url.to_string());
        }
        let path = self.path.trim();
        if path.is_empty() {
            return None;
        }
        if path.starts_with("http") {
            return Some(path.to_string());
        }
        base.join(path.trim_start_matches('/'))
            .ok()
            .map(|u| u.to_string())
    }
}

/// A catalogue product (a book).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub image: Option<Vec<ProductImage>>,
}

impl Product {
    /// Unit price in the store currency.
    #[must_use]
    pub const fn unit_price(&self, currency: CurrencyCode) -> Price {
        Price::new(self.price, currency)
    }

    /// First image, if any.
    #[must_use]
    pub fn cover(&self) -> Option<&ProductImage> {
        self.image.as_ref().and_then(|images| images.first())
    }
}

/// Body for creating a product.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<ProductImage>>,
}

/// Partial product update; only `Some` fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<ProductImage>>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// A server-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    /// Raw owner as sent by the backend. `null` and `0` both mean anonymous.
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl Cart {
    /// Owning user, or `None` for an anonymous cart.
    #[must_use]
    pub fn owner(&self) -> Option<UserId> {
        self.user_id.filter(|id| !id.is_anonymous())
    }

    /// Creation time, if sent.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.created_at)
    }
}

/// One product-quantity pairing within a cart.
///
/// The backend may embed the product either as an object (`product`) or as
/// a one-element array (`_product`), or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    #[serde(default)]
    pub created_at: Option<i64>,
    pub quantity: u32,
    pub cart_id: CartId,
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    #[serde(rename = "_product", default, skip_serializing_if = "Option::is_none")]
    pub product_list: Option<Vec<Product>>,
}

impl CartItem {
    /// The embedded product: the inline object, else the first array entry.
    #[must_use]
    pub fn embedded_product(&self) -> Option<&Product> {
        self.product
            .as_ref()
            .or_else(|| self.product_list.as_ref().and_then(|list| list.first()))
    }

    /// Promote an array-embedded product into `product`.
    #[must_use]
    pub fn with_resolved_product(mut self) -> Self {
        if self.product.is_none() {
            self.product = self
                .product_list
                .as_ref()
                .and_then(|list| list.first())
                .cloned();
        }
        self
    }

    /// Whether the product is still unknown.
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        self.product.is_none()
    }

    /// Line total (unit price x quantity); zero for unresolved products.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product
            .as_ref()
            .map_or(Decimal::ZERO, |p| p.price * Decimal::from(self.quantity))
    }

    /// Creation time, if sent.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.created_at)
    }
}

/// Cart item as returned by an update.
///
/// Update responses often carry only `id` and `quantity`; every other field
/// is optional and filled from the local item by
/// [`merge_update`](crate::cart::merge_update).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CartItemPatch {
    pub id: Option<CartItemId>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub cart_id: Option<CartId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(rename = "_product", default)]
    pub product_list: Option<Vec<Product>>,
}

impl From<CartItem> for CartItemPatch {
    fn from(item: CartItem) -> Self {
        Self {
            id: Some(item.id),
            created_at: item.created_at,
            quantity: Some(item.quantity),
            cart_id: Some(item.cart_id),
            product_id: Some(item.product_id),
            product: item.product,
            product_list: item.product_list,
        }
    }
}

/// Body for creating a cart.
#[derive(Debug, Clone, Serialize)]
pub struct NewCart {
    /// Owner; the anonymous placeholder when no user is known.
    pub user_id: UserId,
}

impl NewCart {
    /// Build a request for the given owner, falling back to the placeholder.
    #[must_use]
    pub fn for_owner(owner: Option<UserId>) -> Self {
        Self {
            user_id: owner.unwrap_or(UserId::ANONYMOUS),
        }
    }
}

/// Body for adding a product to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCartItem {
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Partial cart item update; only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl CartItemUpdate {
    /// Update only the quantity.
    #[must_use]
    pub const fn quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
        }
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,
    #[serde(default, alias = "estado")]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl Order {
    /// Current status, defaulting to pending when absent.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.status.clone().unwrap_or_default()
    }

    /// Creation time, if sent.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.created_at)
    }
}

/// One line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body for placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderLine>>,
}

/// Partial order update. The backend names the status field `estado`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderUpdate {
    #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

// =============================================================================
// User & Auth Types
// =============================================================================

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Partial user update; only `Some` fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Credentials for `auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: Email,
    pub password: String,
}

/// Response of `auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "authToken")]
    pub auth_token: String,
}

/// Body for `auth/signup`.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: Email,
    pub password: String,
    pub shipping_address: String,
    pub phone: String,
}
