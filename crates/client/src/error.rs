//! Errors surfaced by cart operations.
//!
//! Read failures that the cart core can degrade around (listing carts,
//! reading the pointer, repairing products) are logged and never reach the
//! caller. Everything in [`CartError`] is a failed write the caller has to
//! decide about.

use thiserror::Error;

use crate::api::ApiError;
use crate::store::StoreError;

/// Cart operation error.
#[derive(Debug, Error)]
pub enum CartError {
    /// The backend rejected or failed a cart write.
    #[error("Cart gateway error: {0}")]
    Gateway(#[from] ApiError),

    /// The local cart pointer could not be written.
    #[error("Cart pointer store error: {0}")]
    Store(#[from] StoreError),

    /// Checkout was requested for a cart with no items.
    #[error("Cart is empty")]
    EmptyCart,
}
