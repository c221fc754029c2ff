//! Order commands.

use biblio_core::{OrderId, OrderStatus};

use super::{CommandError, Context};
use crate::output;

/// List orders. Non-admin sessions only see their own.
///
/// # Errors
///
/// Returns an error if not logged in or the request fails.
pub async fn list(ctx: &Context) -> Result<(), CommandError> {
    let session = ctx.require_session()?;
    let orders = ctx.api.list_orders().await?;

    let visible: Vec<_> = if session.role.is_admin() {
        orders
    } else {
        orders
            .into_iter()
            .filter(|o| o.user_id.is_some() && o.user_id == session.user_id)
            .collect()
    };

    if visible.is_empty() {
        output::line("No orders.");
    }
    for order in &visible {
        output::order_row(order);
    }
    Ok(())
}

/// Set an order's status (administrators).
///
/// Shipping is only allowed for accepted orders.
///
/// # Errors
///
/// Returns an error if not logged in, the transition is not allowed, or the
/// request fails.
pub async fn set_status(
    ctx: &Context,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<(), CommandError> {
    ctx.require_admin()?;

    if status == OrderStatus::Shipped {
        let current = ctx
            .api
            .list_orders()
            .await?
            .into_iter()
            .find(|o| o.id == order_id)
            .map(|o| o.status())
            .unwrap_or_default();
        if !current.can_ship() {
            return Err(CommandError::InvalidTransition {
                order_id,
                from: current,
                to: status,
            });
        }
    }

    let order = ctx.api.update_order_status(order_id, status).await?;
    output::order_row(&order);
    Ok(())
}
