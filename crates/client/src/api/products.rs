//! Product endpoints.
//!
//! The full listing is cached for the configured TTL. Single-product reads are
//! always fetched fresh since they back cart repair and stock checks.

use async_trait::async_trait;
use biblio_core::ProductId;
use reqwest::Method;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, ApiError, NewProduct, Product, ProductUpdate};
use crate::gateway::ProductGateway;

#[async_trait]
impl ProductGateway for ApiClient {
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn get_product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        let url = self.store_url(&format!("product/{product_id}"))?;
        Self::send_json(self.request(Method::GET, url)).await
    }
}

impl ApiClient {
    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let url = self.store_url("product")?;
        let products: Vec<Product> = Self::send_json(self.request(Method::GET, url)).await?;

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, product), fields(title = %product.title))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError> {
        let url = self.store_url("product")?;
        let created: Product =
            Self::send_json(self.request(Method::POST, url).json(product)).await?;
        self.invalidate_products().await;
        Ok(created)
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self, update), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, ApiError> {
        let url = self.store_url(&format!("product/{product_id}"))?;
        let updated: Product =
            Self::send_json(self.request(Method::PATCH, url).json(update)).await?;
        self.invalidate_products().await;
        Ok(updated)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: ProductId) -> Result<(), ApiError> {
        let url = self.store_url(&format!("product/{product_id}"))?;
        Self::send_empty(self.request(Method::DELETE, url)).await?;
        self.invalidate_products().await;
        Ok(())
    }

    async fn invalidate_products(&self) {
        self.inner.cache.invalidate(&CacheKey::Products).await;
    }
}
