//! User account model.

use serde::{Deserialize, Serialize};

use crate::types::email::Email;
use crate::types::id::UserId;
use crate::types::role::Role;

/// A user account as returned by the backend.
///
/// The authoritative copy lives server-side; this is the client's cached
/// snapshot, replaced wholesale on login and refreshed by session
/// revalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address (validated by the backend).
    pub email: Email,
    /// Account role.
    pub role: Role,
}
