//! Cart commands.
//!
//! Each command resolves the session's cart first, so the cart pointer file is
//! always validated against the backend before anything is changed.

use biblio_client::ProductGateway;
use biblio_client::api::CartItem;
use biblio_client::cart::{QuantityChange, QuantityStep, Storefront};
use biblio_core::{CartItemId, ProductId};

use super::{CommandError, Context};
use crate::output;

/// Resolve the cart and print its id.
///
/// # Errors
///
/// Returns an error if no cart can be resolved.
pub async fn resolve(ctx: &Context) -> Result<(), CommandError> {
    let storefront = ctx.storefront();
    let cart_id = storefront.resolver().resolve_cart(ctx.user_id()).await?;
    let cart = ctx.api.get_cart(cart_id).await?;

    let owner = cart
        .owner()
        .map_or_else(|| "anonymous".to_string(), |id| format!("user {id}"));
    output::line(format!("Cart {cart_id} ({owner})"));
    Ok(())
}

/// Print the cart's items and totals.
///
/// # Errors
///
/// Returns an error if the cart cannot be resolved or loaded.
pub async fn show(ctx: &Context) -> Result<(), CommandError> {
    let storefront = ctx.storefront();
    let (cart_id, items) = storefront.open_cart(ctx.user_id()).await?;

    output::line(format!("Cart {cart_id}"));
    output::cart_items(&items);
    if !items.is_empty() {
        output::line("");
        output::summary(&storefront.summary());
    }
    Ok(())
}

/// Add a product to the cart.
///
/// # Errors
///
/// Returns an error if the product does not exist or the item is rejected.
pub async fn add(ctx: &Context, product_id: ProductId, quantity: u32) -> Result<(), CommandError> {
    let product = ctx.api.get_product(product_id).await?;
    let item = ctx
        .storefront()
        .add_to_cart(ctx.user_id(), &product, quantity)
        .await?;

    output::line(format!(
        "Added {} x {} to cart {}.",
        item.quantity, product.title, item.cart_id
    ));
    Ok(())
}

/// Set an item's quantity. Zero removes the item.
///
/// # Errors
///
/// Returns an error if the item is not in the cart or the update fails.
pub async fn set_quantity(
    ctx: &Context,
    item_id: CartItemId,
    quantity: u32,
) -> Result<(), CommandError> {
    let storefront = ctx.storefront();
    let item = find_item(&storefront, ctx, item_id).await?;

    if quantity == 0 {
        storefront.synchronizer().remove(&item).await?;
        output::line(format!("Removed item {item_id}."));
    } else {
        let updated = storefront
            .synchronizer()
            .change_quantity(&item, quantity)
            .await?;
        output::line(format!("Item {item_id} quantity is now {}.", updated.quantity));
    }
    Ok(())
}

/// Step an item's quantity by one.
///
/// # Errors
///
/// Returns an error if the item is not in the cart or the update fails.
pub async fn step(ctx: &Context, item_id: CartItemId, step: QuantityStep) -> Result<(), CommandError> {
    let storefront = ctx.storefront();
    let item = find_item(&storefront, ctx, item_id).await?;

    match storefront.synchronizer().adjust_quantity(&item, step).await? {
        QuantityChange::Updated(updated) => {
            output::line(format!("Item {item_id} quantity is now {}.", updated.quantity));
        }
        QuantityChange::Removed => output::line(format!("Removed item {item_id}.")),
        QuantityChange::OutOfStock { available } => {
            output::line(format!("Only {available} in stock."));
        }
    }
    Ok(())
}

/// Remove an item.
///
/// # Errors
///
/// Returns an error if the item is not in the cart or the delete fails.
pub async fn remove(ctx: &Context, item_id: CartItemId) -> Result<(), CommandError> {
    let storefront = ctx.storefront();
    let item = find_item(&storefront, ctx, item_id).await?;
    storefront.synchronizer().remove(&item).await?;
    output::line(format!("Removed item {item_id}."));
    Ok(())
}

/// Check out: optionally place an order, then clear the cart.
///
/// # Errors
///
/// Returns an error if the cart is empty, or order placement fails.
pub async fn checkout(ctx: &Context, place_order: bool) -> Result<(), CommandError> {
    if place_order {
        ctx.require_session()?;
    }

    let storefront = ctx.storefront();
    storefront.open_cart(ctx.user_id()).await?;
    let receipt = storefront.checkout(ctx.user_id(), place_order).await?;

    output::summary(&receipt.summary);
    if let Some(order) = &receipt.order {
        output::line(format!("Order {} placed.", order.id));
    }
    output::clear_report(&receipt.report);
    Ok(())
}

async fn find_item(
    storefront: &Storefront,
    ctx: &Context,
    item_id: CartItemId,
) -> Result<CartItem, CommandError> {
    let (_, items) = storefront.open_cart(ctx.user_id()).await?;
    items
        .into_iter()
        .find(|item| item.id == item_id)
        .ok_or(CommandError::ItemNotFound(item_id))
}
