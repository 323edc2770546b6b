use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(alias = "password")]
    pub pass: String,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Response returned after registration.
#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub user_id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Account details shown to the account owner. Never carries the hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub user_id: i64,
    pub username: String,
    pub forename: String,
    pub surname: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            forename: user.forename,
            surname: user.surname,
            email: user.email,
        }
    }
}
