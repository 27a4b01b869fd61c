use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub pass_hash: String,
    pub is_activated: bool,
    pub is_admin: bool,
    /// Pending activation / password-reset token. Replaced, never cleared.
    #[serde(skip_serializing)]
    pub activation_token: String,
}

/// Row to insert at registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub pass_hash: String,
    pub activation_token: String,
}
