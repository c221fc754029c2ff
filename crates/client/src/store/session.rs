//! Persisted auth session.

use std::path::PathBuf;

use biblio_core::{Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{StoreError, read_json, remove_file, write_json};
use crate::api::User;

/// A logged-in session.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    pub token: SecretString,
    pub user_id: Option<UserId>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish()
    }
}

impl Session {
    /// Build a session from a token and the profile returned by `auth/me`.
    #[must_use]
    pub fn from_profile(token: SecretString, user: &User) -> Self {
        Self {
            token,
            user_id: Some(user.id).filter(|id| !id.is_anonymous()),
            name: Some(user.name.clone()).filter(|s| !s.is_empty()),
            email: Some(user.email.clone()).filter(|s| !s.is_empty()),
            role: user.role.clone().unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SessionFile {
    token: String,
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Role,
}

/// Session persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn load(&self) -> Result<Option<Session>, StoreError> {
        let file: Option<SessionFile> = read_json(&self.path)?;
        Ok(file.map(|f| Session {
            token: SecretString::from(f.token),
            user_id: f.user_id,
            name: f.name,
            email: f.email,
            role: f.role,
        }))
    }

    /// Replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        write_json(
            &self.path,
            &SessionFile {
                token: session.token.expose_secret().to_string(),
                user_id: session.user_id,
                name: session.name.clone(),
                email: session.email.clone(),
                role: session.role.clone(),
            },
        )
    }

    /// Forget the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<(), StoreError> {
        remove_file(&self.path)
    }
}
