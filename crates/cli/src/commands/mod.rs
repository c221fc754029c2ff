//! Command implementations.
//!
//! Every command builds a [`Context`] from the environment: the API client
//! (authenticated when a session is stored), the session store and the cart
//! pointer file.

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod users;

use std::sync::Arc;

use biblio_client::store::Session;
use biblio_client::{
    ApiClient, ApiError, CartError, ClientConfig, FileCartPointerStore, SessionStore, StoreError,
    Storefront,
};
use biblio_core::{CartItemId, EmailError, OrderId, OrderStatus, UserId};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Backend request failed.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Cart operation failed.
    #[error("{0}")]
    Cart(#[from] CartError),

    /// Local state could not be read or written.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Invalid email argument.
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    /// Command needs a logged-in session.
    #[error("Not logged in. Run `biblio login` first")]
    NotLoggedIn,

    /// The item is not in the current cart.
    #[error("Cart item {0} not found in current cart")]
    ItemNotFound(CartItemId),

    /// The order cannot move to the requested status.
    #[error("Order {order_id} is {from}; it cannot become {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Command needs an administrator session.
    #[error("This command requires an administrator account")]
    Forbidden,
}

/// Shared state for one command invocation.
pub struct Context {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub sessions: SessionStore,
    pub session: Option<Session>,
}

impl Context {
    /// Build the context, attaching the stored session's token if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the session
    /// file is unreadable.
    pub fn new(config: ClientConfig) -> Result<Self, CommandError> {
        let sessions = SessionStore::new(config.session_path());
        let session = sessions.load()?;

        let api = ApiClient::new(&config)?;
        let api = match &session {
            Some(session) => api.with_token(session.token.clone()),
            None => api,
        };

        Ok(Self {
            config,
            api,
            sessions,
            session,
        })
    }

    /// Current user id, when logged in.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.session.as_ref().and_then(|s| s.user_id)
    }

    /// Session, or [`CommandError::NotLoggedIn`].
    ///
    /// # Errors
    ///
    /// Returns an error when no session is stored.
    pub fn require_session(&self) -> Result<&Session, CommandError> {
        self.session.as_ref().ok_or(CommandError::NotLoggedIn)
    }

    /// Session with the admin role, or an error.
    ///
    /// # Errors
    ///
    /// Returns an error when not logged in or not an administrator.
    pub fn require_admin(&self) -> Result<&Session, CommandError> {
        let session = self.require_session()?;
        if session.role.is_admin() {
            Ok(session)
        } else {
            Err(CommandError::Forbidden)
        }
    }

    /// Cart flows wired to the backend and the pointer file.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        let pointer = Arc::new(FileCartPointerStore::new(self.config.cart_pointer_path()));
        Storefront::from_api(self.api.clone(), pointer)
            .with_max_unvalidated_uses(self.config.max_unvalidated_cart_uses)
    }
}
