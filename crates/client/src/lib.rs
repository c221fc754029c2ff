//! Biblio storefront client library.
//!
//! Talks to the Biblio REST backend and keeps a device's cart consistent with
//! it:
//!
//! - [`api`]: typed HTTP client for carts, products, orders, users and auth
//! - [`gateway`]: the traits the cart core depends on
//! - [`store`]: the local cart pointer and auth session files
//! - [`cart`]: cart resolution, item synchronization and checkout

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod gateway;
pub mod store;

pub use api::{ApiClient, ApiError};
pub use cart::{CartResolver, CartSynchronizer, Storefront};
pub use config::{ClientConfig, ConfigError, LogFormat};
pub use error::CartError;
pub use gateway::{CartGateway, OrderGateway, ProductGateway};
pub use store::{CartPointerStore, FileCartPointerStore, SessionStore, StoreError};
