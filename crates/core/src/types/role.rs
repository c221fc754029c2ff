//! Role and status enums for users and orders.
//!
//! The backend stores these as free-form uppercase strings (some of them in
//! Spanish). Parsing is case-insensitive and unknown values are preserved
//! rather than rejected, so a new backend status never breaks deserialization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Account role returned by the auth profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Store administrator.
    Admin,
    /// Regular customer.
    #[default]
    Client,
    /// Any other role string, normalized to uppercase.
    Other(String),
}

impl Role {
    /// Normalize a raw role string (`" admin "` -> `Admin`).
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("ADMIN") {
            Self::Admin
        } else if trimmed.eq_ignore_ascii_case("CLIENT") {
            Self::Client
        } else {
            Self::Other(trimmed.to_uppercase())
        }
    }

    /// Uppercase wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "ADMIN",
            Self::Client => "CLIENT",
            Self::Other(s) => s,
        }
    }

    /// Whether this role grants store administration.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::normalize(&raw))
    }
}

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserStatus {
    #[default]
    #[serde(rename = "ACTIVO", alias = "ACTIVE")]
    Active,
    #[serde(rename = "BLOQUEADO", alias = "BLOCKED")]
    Blocked,
}

impl UserStatus {
    /// Wire representation understood by the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVO",
            Self::Blocked => "BLOQUEADO",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "activo" => Ok(Self::Active),
            "blocked" | "bloqueado" => Ok(Self::Blocked),
            _ => Err(format!("invalid user status: {s}")),
        }
    }
}

/// Order lifecycle status.
///
/// Orders are created `Pending`, accepted or rejected by an administrator,
/// and only accepted orders may be marked as shipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Shipped,
    Other(String),
}

impl OrderStatus {
    /// Parse a raw status string, accepting Spanish and English spellings.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        if upper.contains("ACEPT") || upper.contains("ACCEPT") {
            Self::Accepted
        } else if upper.contains("RECHAZ") || upper.contains("REJECT") {
            Self::Rejected
        } else if upper.contains("ENVIA") || upper.contains("SHIP") {
            Self::Shipped
        } else if upper.contains("PENDIENTE") || upper.contains("PENDING") || upper.is_empty() {
            Self::Pending
        } else {
            Self::Other(upper)
        }
    }

    /// Wire representation understood by the backend.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDIENTE",
            Self::Accepted => "ACEPTADA",
            Self::Rejected => "RECHAZADA",
            Self::Shipped => "ENVIADA",
            Self::Other(s) => s,
        }
    }

    /// Whether an order in this status may be marked as shipped.
    #[must_use]
    pub const fn can_ship(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::normalize(&raw))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_normalize() {
        assert_eq!(Role::normalize(" admin "), Role::Admin);
        assert_eq!(Role::normalize("Client"), Role::Client);
        assert_eq!(Role::normalize("editor"), Role::Other("EDITOR".to_string()));
        assert!(Role::Admin.is_admin());
    }

    #[test]
    fn test_role_serde() {
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"ADMIN\"");
    }

    #[test]
    fn test_user_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&UserStatus::Blocked).unwrap(),
            "\"BLOQUEADO\""
        );
        let status: UserStatus = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(status, UserStatus::Active);
        assert_eq!("bloqueado".parse::<UserStatus>().unwrap(), UserStatus::Blocked);
    }

    #[test]
    fn test_order_status_normalize() {
        assert_eq!(OrderStatus::normalize("aceptada"), OrderStatus::Accepted);
        assert_eq!(OrderStatus::normalize("ACCEPTED"), OrderStatus::Accepted);
        assert_eq!(OrderStatus::normalize("enviada"), OrderStatus::Shipped);
        assert_eq!(OrderStatus::normalize(""), OrderStatus::Pending);
        assert!(OrderStatus::Accepted.can_ship());
        assert!(!OrderStatus::Pending.can_ship());
    }
}
