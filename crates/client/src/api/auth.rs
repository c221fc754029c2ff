//! Authentication endpoints.

use reqwest::Method;
use secrecy::SecretString;
use tracing::{info, instrument};

use super::{ApiClient, ApiError, AuthResponse, LoginRequest, SignupRequest, User};

impl ApiClient {
    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials, or another
    /// error if the API request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<SecretString, ApiError> {
        let url = self.auth_url("auth/login")?;
        let response: AuthResponse =
            Self::send_json(self.request(Method::POST, url).json(request)).await?;
        info!("Logged in");
        Ok(SecretString::from(response.auth_token))
    }

    /// Profile of the token's owner.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] without a valid token, or another
    /// error if the API request fails.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        let url = self.auth_url("auth/me")?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    /// Register a new account. The caller logs in afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails (e.g., email already taken).
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<User, ApiError> {
        let url = self.auth_url("auth/signup")?;
        let user: User = Self::send_json(self.request(Method::POST, url).json(request)).await?;
        info!(user_id = %user.id, "Signed up");
        Ok(user)
    }
}
