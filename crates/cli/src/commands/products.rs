//! Catalogue commands.

use biblio_client::ProductGateway;
use biblio_client::api::{NewProduct, ProductUpdate};
use biblio_core::ProductId;
use rust_decimal::Decimal;

use super::{CommandError, Context};
use crate::output;

/// List the catalogue, optionally filtered by a case-insensitive substring of
/// title, author or genre.
///
/// # Errors
///
/// Returns an error if the catalogue cannot be fetched.
pub async fn list(ctx: &Context, search: Option<&str>) -> Result<(), CommandError> {
    let products = ctx.api.list_products().await?;
    let needle = search.map(str::to_lowercase);

    let matches = products.iter().filter(|p| {
        needle.as_deref().is_none_or(|needle| {
            [&p.title, &p.author, &p.genre]
                .iter()
                .any(|field| field.to_lowercase().contains(needle))
        })
    });

    let mut count = 0usize;
    for product in matches {
        output::product_row(product);
        count += 1;
    }
    if count == 0 {
        output::line("No products found.");
    }
    Ok(())
}

/// Show one product.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched.
pub async fn show(ctx: &Context, product_id: ProductId) -> Result<(), CommandError> {
    let product = ctx.api.get_product(product_id).await?;
    output::product_detail(&product, ctx.api.store_base_url());
    Ok(())
}

/// Fields for a new catalogue entry.
pub struct NewProductArgs {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
}

/// Create a product (administrators).
///
/// # Errors
///
/// Returns an error if not an administrator or the request fails.
pub async fn create(ctx: &Context, args: NewProductArgs) -> Result<(), CommandError> {
    ctx.require_admin()?;
    let product = ctx
        .api
        .create_product(&NewProduct {
            title: args.title,
            author: args.author,
            genre: args.genre,
            description: args.description,
            price: args.price,
            stock: args.stock,
            image: None,
        })
        .await?;
    output::product_row(&product);
    Ok(())
}

/// Change a product's price and/or stock (administrators).
///
/// # Errors
///
/// Returns an error if not an administrator or the request fails.
pub async fn update(
    ctx: &Context,
    product_id: ProductId,
    price: Option<Decimal>,
    stock: Option<i32>,
) -> Result<(), CommandError> {
    ctx.require_admin()?;
    let update = ProductUpdate {
        price,
        stock,
        ..ProductUpdate::default()
    };
    let product = ctx.api.update_product(product_id, &update).await?;
    output::product_row(&product);
    Ok(())
}

/// Delete a product (administrators).
///
/// # Errors
///
/// Returns an error if not an administrator or the request fails.
pub async fn delete(ctx: &Context, product_id: ProductId) -> Result<(), CommandError> {
    ctx.require_admin()?;
    ctx.api.delete_product(product_id).await?;
    output::line(format!("Product {product_id} deleted."));
    Ok(())
}
