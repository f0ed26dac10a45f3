//! Account role enumeration.
//!
//! The backend stores roles as free-form strings (`user`, `admin`,
//! `superadmin`). On the client they are a closed enum so that every
//! role-conditional branch is checked exhaustively by the compiler; a
//! payload carrying an unknown role is a deserialization error, not a
//! silently unprivileged account.

use serde::{Deserialize, Serialize};

/// Account role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A shopper: browses the catalog and owns a cart.
    User,
    /// Store staff: manages the catalog and views customer carts.
    Admin,
    /// Full access including user accounts and admin provisioning.
    SuperAdmin,
}

impl Role {
    /// Whether this role owns a shopping cart.
    #[must_use]
    pub const fn is_shopper(self) -> bool {
        matches!(self, Self::User)
    }

    /// Human-readable label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "Shopper",
            Self::Admin => "Admin",
            Self::SuperAdmin => "Super Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
            Self::SuperAdmin => write!(f, "superadmin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::SuperAdmin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
