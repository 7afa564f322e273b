//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopfront_core::{Email, Role, UserId};

/// A registered account.
///
/// The password hash is never part of this type; it only travels between
/// the store and the auth service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email (unique).
    pub email: Email,
    /// Access role.
    pub role: Role,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
    /// When the account was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub role: Role,
}

/// Partial update applied by an admin. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub role: Option<Role>,
}
