use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::User;

// Missing fields decode as empty so the validator reports them as 422.

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Password", default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    #[serde(rename = "CurrentPassword", default)]
    pub current_password: String,
    #[serde(rename = "NewPassword", default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminChangePasswordRequest {
    #[serde(rename = "UserID", default)]
    pub user_id: Option<i64>,
    #[serde(rename = "NewPassword", default)]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    #[serde(rename = "AuthenticationToken")]
    pub token: String,
    #[serde(rename = "AuthenticationTokenExpiry", with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
}

/// Public part of the user; no password hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "IsAdmin")]
    pub is_admin: bool,
    #[serde(rename = "CreatedAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            is_admin: u.is_admin,
            created_at: u.created_at,
        }
    }
}
