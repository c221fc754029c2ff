//! Plain-text rendering for command output.

use biblio_client::api::{CartItem, Order, Product, User};
use biblio_client::cart::{CheckoutSummary, ClearReport};
use biblio_core::{CurrencyCode, Price};

/// Print one line to stdout.
#[allow(clippy::print_stdout)]
pub fn line(text: impl AsRef<str>) {
    println!("{}", text.as_ref());
}

fn money(amount: rust_decimal::Decimal) -> String {
    Price::new(amount, CurrencyCode::default()).to_string()
}

pub fn product_row(product: &Product) {
    line(format!(
        "{:>5}  {:<40}  {:<24}  {:>10}  stock {}",
        product.id,
        truncate(&product.title, 40),
        truncate(&product.author, 24),
        money(product.price),
        product.stock
    ));
}

pub fn product_detail(product: &Product, base: &url::Url) {
    line(format!("#{} {}", product.id, product.title));
    line(format!("  Author: {}", product.author));
    line(format!("  Genre:  {}", product.genre));
    line(format!("  Price:  {}", money(product.price)));
    line(format!("  Stock:  {}", product.stock));
    if !product.description.is_empty() {
        line(format!("  {}", product.description));
    }
    if let Some(cover) = product.cover().and_then(|image| image.display_url(base)) {
        line(format!("  Cover:  {cover}"));
    }
}

pub fn cart_items(items: &[CartItem]) {
    if items.is_empty() {
        line("Cart is empty.");
        return;
    }
    for item in items {
        let title = item
            .product
            .as_ref()
            .map_or_else(|| format!("(product {})", item.product_id), |p| p.title.clone());
        line(format!(
            "{:>5}  {:<40}  x{:<3}  {:>10}",
            item.id,
            truncate(&title, 40),
            item.quantity,
            money(item.line_total())
        ));
    }
}

pub fn summary(summary: &CheckoutSummary) {
    line(format!("Subtotal: {}", summary.subtotal));
    line(format!("Tax (5%): {}", summary.tax));
    line(format!("Shipping: {}", summary.shipping));
    line(format!("Total:    {}", summary.total));
}

pub fn clear_report(report: &ClearReport) {
    line(format!("Removed {} item(s).", report.deleted.len()));
    for (item, error) in &report.failed {
        line(format!("  Could not remove item {}: {error}", item.id));
    }
}

pub fn order_row(order: &Order) {
    line(format!(
        "{:>5}  {:<10}  {:>10}  user {}",
        order.id,
        order.status(),
        order.total.map_or_else(|| "-".to_string(), money),
        order
            .user_id
            .map_or_else(|| "-".to_string(), |id| id.to_string())
    ));
}

pub fn user(user: &User) {
    line(format!("#{} {} <{}>", user.id, user.name, user.email));
    line(format!(
        "  Role: {}",
        user.role.clone().unwrap_or_default()
    ));
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
