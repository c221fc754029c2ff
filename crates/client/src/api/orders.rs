//! Order endpoints.

use async_trait::async_trait;
use biblio_core::{OrderId, OrderStatus};
use reqwest::Method;
use tracing::{info, instrument};

use super::{ApiClient, ApiError, NewOrder, Order, OrderUpdate};
use crate::gateway::OrderGateway;

#[async_trait]
impl OrderGateway for ApiClient {
    #[instrument(skip(self, order), fields(user_id = ?order.user_id))]
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let url = self.store_url("order")?;
        let created: Order = Self::send_json(self.request(Method::POST, url).json(order)).await?;
        info!(order_id = %created.id, "Order placed");
        Ok(created)
    }
}

impl ApiClient {
    /// List orders visible to the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let url = self.store_url("order")?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the API request fails.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let url = self.store_url(&format!("order/{order_id}"))?;
        let body = OrderUpdate {
            status: Some(status),
        };
        Self::send_json(self.request(Method::PATCH, url).json(&body)).await
    }
}
