use serde::{Deserialize, Serialize};

/// JWT payload carrying the caller's identity for the lifetime of the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,         // user ID
    pub username: String, // shown to trade partners
    pub email: String,    // contact address for trade offers
    pub iat: usize,       // issued at (unix timestamp)
    pub exp: usize,       // expires at (unix timestamp)
    pub iss: String,      // issuer
    pub aud: String,      // audience
}
