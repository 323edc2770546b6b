use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{AppError, AppResult};

/// Salted Argon2id hash in PHC string form; this is what lands in `user.password`.
pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AppError::Internal(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Compare `plain` against a stored PHC hash. The comparison inside argon2 is
/// constant time; a malformed stored hash is an internal error, not a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        AppError::Internal(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_never_contains_plaintext() {
        let hash = hash_password("password").expect("hashing should succeed");
        assert!(!hash.contains("password"));
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("password").expect("hash a");
        let b = hash_password("password").expect("hash b");
        assert_ne!(a, b);
        assert!(verify_password("password", &a).expect("verify a"));
        assert!(verify_password("password", &b).expect("verify b"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("password").expect("hashing should succeed");
        assert!(!verify_password("wrong", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
