use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::{claims::Claims, repo_types::User},
    config::JwtConfig,
    error::{AppError, AppResult},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from(&state.config.jwt)
    }
}

impl JwtKeys {
    /// Issue a session token carrying the user's id, username and email.
    pub fn sign(&self, user: &User) -> AppResult<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("jwt sign: {e}")))?;
        debug!(user_id = user.user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AppError::Auth("invalid or expired token".into()))?;
        debug!(user_id = data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(issuer: &str) -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            issuer: issuer.into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
        }
    }

    fn user() -> User {
        User {
            user_id: 42,
            username: "doej".into(),
            password: String::new(),
            forename: "john".into(),
            surname: "doe".into(),
            email: "johndoe@email.com".into(),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("johndoe@email.com"));
        assert!(!is_valid_email("johndoe"));
        assert!(!is_valid_email("john doe@email.com"));
        assert!(!is_valid_email("johndoe@email"));
    }

    #[test]
    fn sign_and_verify_carries_identity() {
        let keys = JwtKeys::from(&config("test-issuer"));
        let token = keys.sign(&user()).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "doej");
        assert_eq!(claims.email, "johndoe@email.com");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn verify_rejects_other_issuer() {
        let token = JwtKeys::from(&config("issuer-a")).sign(&user()).expect("sign");
        let err = JwtKeys::from(&config("issuer-b")).verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = JwtKeys::from(&config("test-issuer"));
        assert!(keys.verify("not.a.token").is_err());
    }
}
