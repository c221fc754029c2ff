//! Session commands: login, logout, whoami, signup.

use biblio_client::api::{LoginRequest, SignupRequest};
use biblio_client::store::Session;
use biblio_core::Email;
use tracing::{info, warn};

use super::{CommandError, Context};
use crate::output;

/// Log in and store the session.
///
/// # Errors
///
/// Returns an error if the credentials are rejected or the session cannot be
/// stored.
pub async fn login(ctx: &Context, email: &str, password: String) -> Result<(), CommandError> {
    let request = LoginRequest {
        email: Email::parse(email)?,
        password,
    };
    let token = ctx.api.login(&request).await?;

    let profile = ctx.api.with_token(token.clone()).me().await?;
    let session = Session::from_profile(token, &profile);
    ctx.sessions.save(&session)?;

    info!(user_id = ?session.user_id, role = %session.role, "Session stored");
    output::line(format!(
        "Logged in as {} ({})",
        session.name.as_deref().unwrap_or(request.email.as_str()),
        session.role
    ));
    Ok(())
}

/// Forget the stored session.
///
/// A cart pointer naming the user's own cart is released so the next person
/// on this device does not pick it up. Anonymous carts stay usable.
///
/// # Errors
///
/// Returns an error if the session file cannot be removed.
pub async fn logout(ctx: &Context) -> Result<(), CommandError> {
    if let Some(user_id) = ctx.user_id()
        && let Err(e) = ctx.storefront().resolver().release_pointer(user_id).await
    {
        warn!(error = %e, "Could not release cart pointer");
    }
    ctx.sessions.clear()?;
    output::line("Logged out.");
    Ok(())
}

/// Show the profile behind the stored session.
///
/// # Errors
///
/// Returns an error if not logged in or the profile request fails.
pub async fn whoami(ctx: &Context) -> Result<(), CommandError> {
    ctx.require_session()?;
    let profile = ctx.api.me().await?;
    output::user(&profile);
    Ok(())
}

/// Register a new account, then log in with it.
///
/// # Errors
///
/// Returns an error if registration or the follow-up login fails.
pub async fn signup(
    ctx: &Context,
    name: String,
    email: &str,
    password: String,
    shipping_address: String,
    phone: String,
) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let request = SignupRequest {
        name,
        email: email.clone(),
        password: password.clone(),
        shipping_address,
        phone,
    };
    let user = ctx.api.signup(&request).await?;
    output::line(format!("Account #{} created.", user.id));

    login(ctx, email.as_str(), password).await
}
