//! User administration commands.

use biblio_client::api::UserUpdate;
use biblio_core::{UserId, UserStatus};

use super::{CommandError, Context};
use crate::output;

/// List all users.
///
/// # Errors
///
/// Returns an error if not an administrator or the request fails.
pub async fn list(ctx: &Context) -> Result<(), CommandError> {
    ctx.require_admin()?;
    let users = ctx.api.list_users().await?;
    for user in &users {
        let status = user.status.unwrap_or_default();
        output::line(format!(
            "{:>5}  {:<30}  {:<30}  {:<8}  {status}",
            user.id,
            user.name,
            user.email,
            user.role.clone().unwrap_or_default().as_str()
        ));
    }
    Ok(())
}

/// Show one user.
///
/// # Errors
///
/// Returns an error if not an administrator or the request fails.
pub async fn show(ctx: &Context, user_id: UserId) -> Result<(), CommandError> {
    ctx.require_admin()?;
    let user = ctx.api.get_user(user_id).await?;
    output::user(&user);
    Ok(())
}

/// Block or unblock a user.
///
/// # Errors
///
/// Returns an error if not an administrator or the request fails.
pub async fn set_status(
    ctx: &Context,
    user_id: UserId,
    status: UserStatus,
) -> Result<(), CommandError> {
    ctx.require_admin()?;
    let update = UserUpdate {
        status: Some(status),
        ..UserUpdate::default()
    };
    let user = ctx.api.update_user(user_id, &update).await?;
    output::user(&user);
    Ok(())
}

/// Delete a user.
///
/// # Errors
///
/// Returns an error if not an administrator or the request fails.
pub async fn delete(ctx: &Context, user_id: UserId) -> Result<(), CommandError> {
    ctx.require_admin()?;
    ctx.api.delete_user(user_id).await?;
    output::line(format!("User {user_id} deleted."));
    Ok(())
}
