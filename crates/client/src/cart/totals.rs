//! Checkout totals.

use biblio_core::{CurrencyCode, Price, UserId};
use rust_decimal::Decimal;

use crate::api::{CartItem, NewOrder, OrderLine};

/// Sales tax applied to the subtotal (5%).
pub const TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Flat shipping charged on any non-empty order (4.99).
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(499, 0, 0, false, 2);

/// Amounts shown before confirming a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub subtotal: Price,
    pub tax: Price,
    pub shipping: Price,
    pub total: Price,
}

impl CheckoutSummary {
    /// Compute totals for `items`. Unresolved products count as zero.
    #[must_use]
    pub fn from_items(items: &[CartItem], currency: CurrencyCode) -> Self {
        let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();
        let tax = subtotal * TAX_RATE;
        let shipping = if subtotal > Decimal::ZERO {
            SHIPPING_FEE
        } else {
            Decimal::ZERO
        };
        let total = subtotal + tax + shipping;

        Self {
            subtotal: Price::new(subtotal, currency).rounded(),
            tax: Price::new(tax, currency).rounded(),
            shipping: Price::new(shipping, currency).rounded(),
            total: Price::new(total, currency).rounded(),
        }
    }

    /// Build the order request for these totals.
    #[must_use]
    pub fn to_order(&self, items: &[CartItem], user_id: Option<UserId>) -> NewOrder {
        NewOrder {
            user_id,
            total: Some(self.total.amount),
            items: Some(
                items
                    .iter()
                    .map(|item| OrderLine {
                        product_id: item.product_id,
                        quantity: item.quantity,
                    })
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::testing::{item, product};

    #[test]
    fn test_totals() {
        let mut a = item(1, 9, 1, 2);
        a.product = Some(product(1, Decimal::new(1000, 2), 5));
        let mut b = item(2, 9, 2, 1);
        b.product = Some(product(2, Decimal::new(850, 2), 5));
        let unresolved = item(3, 9, 3, 4);

        let summary = CheckoutSummary::from_items(&[a, b, unresolved], CurrencyCode::USD);

        assert_eq!(summary.subtotal.amount, Decimal::new(2850, 2));
        assert_eq!(summary.tax.amount, Decimal::new(143, 2));
        assert_eq!(summary.shipping.amount, Decimal::new(499, 2));
        assert_eq!(summary.total.amount, Decimal::new(3492, 2));
        assert_eq!(summary.total.to_string(), "$34.92");
    }

    #[test]
    fn test_empty_cart_has_no_shipping() {
        let summary = CheckoutSummary::from_items(&[], CurrencyCode::USD);
        assert_eq!(summary.shipping.amount, Decimal::ZERO);
        assert_eq!(summary.total.amount, Decimal::ZERO);
    }

    #[test]
    fn test_to_order_lists_every_line() {
        let items = [item(1, 9, 1, 2), item(2, 9, 7, 1)];
        let summary = CheckoutSummary::from_items(&items, CurrencyCode::USD);
        let order = summary.to_order(&items, None);

        let lines = order.items.unwrap_or_default();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.iter().map(|l| l.quantity).sum::<u32>(), 3);
    }
}
