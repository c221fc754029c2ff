//! User administration endpoints.

use biblio_core::UserId;
use reqwest::Method;
use tracing::instrument;

use super::{ApiClient, ApiError, User, UserUpdate};

impl ApiClient {
    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let url = self.store_url("user")?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    /// Get a single user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not found or the API request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: UserId) -> Result<User, ApiError> {
        let url = self.store_url(&format!("user/{user_id}"))?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    /// Apply a partial update to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not found or the API request fails.
    #[instrument(skip(self, update), fields(user_id = %user_id))]
    pub async fn update_user(&self, user_id: UserId, update: &UserUpdate) -> Result<User, ApiError> {
        let url = self.store_url(&format!("user/{user_id}"))?;
        Self::send_json(self.request(Method::PATCH, url).json(update)).await
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), ApiError> {
        let url = self.store_url(&format!("user/{user_id}"))?;
        Self::send_empty(self.request(Method::DELETE, url)).await
    }
}
