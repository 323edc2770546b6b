use std::fmt::Display;

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::{
    auth::{
        password::{hash_password, verify_password},
        repo_types::User,
        services::is_valid_email,
    },
    db,
    error::{AppError, AppResult},
    validation::{max_len, parse_id, require},
};

/// Identity store: owns the `user` table.
#[derive(Clone)]
pub struct Accounts {
    db: SqlitePool,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Accounts {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Open (and migrate) the database at `database_url` and bind a store to it.
    pub async fn open(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::new(db::open(database_url).await?))
    }

    /// Register a new account and return its id.
    ///
    /// Uniqueness of username and email is enforced by the insert itself; the
    /// constraint that fired decides which conflict is reported.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        forename: &str,
        surname: &str,
        email: &str,
    ) -> AppResult<i64> {
        let username = username.trim();
        let forename = forename.trim();
        let surname = surname.trim();

        require(username, "username")?;
        require(password, "password")?;
        require(forename, "forename")?;
        require(surname, "surname")?;
        require(email, "email")?;

        max_len(username, "username", 32)?;
        max_len(forename, "forename", 32)?;
        max_len(surname, "surname", 32)?;

        let email = normalize_email(email);
        max_len(&email, "email", 50)?;
        if !is_valid_email(&email) {
            return Err(AppError::Validation(format!("invalid email \"{email}\"")));
        }

        let hash = hash_password(password)?;

        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO user (username, password, forename, surname, email)
            VALUES (?, ?, ?, ?, ?)
            RETURNING user_id
            "#,
        )
        .bind(username)
        .bind(&hash)
        .bind(forename)
        .bind(surname)
        .bind(&email)
        .fetch_one(&self.db)
        .await;

        match inserted {
            Ok(user_id) => {
                info!(user_id, username, "user registered");
                Ok(user_id)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                if e.message().contains("user.username") {
                    warn!(username, "username already registered");
                    Err(AppError::Conflict(format!(
                        "username \"{username}\" already in use"
                    )))
                } else {
                    warn!(email = %email, "email already registered");
                    Err(AppError::Conflict(format!("email \"{email}\" already in use")))
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check `password` against the account registered under `email`.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<()> {
        let user = self.get_user_data(email).await?;
        if !verify_password(password, &user.password)? {
            warn!(user_id = user.user_id, "login invalid password");
            return Err(AppError::Auth(format!(
                "invalid password for account \"{}\"",
                user.email
            )));
        }
        debug!(user_id = user.user_id, "credentials verified");
        Ok(())
    }

    pub async fn get_user_data(&self, email: &str) -> AppResult<User> {
        let email = normalize_email(email);
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, password, forename, surname, email
            FROM user
            WHERE email = ?
            "#,
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?;
        user.ok_or_else(|| AppError::NotFound(format!("email \"{email}\" not found")))
    }

    pub async fn get_user_data_from_id(&self, user_id: impl Display) -> AppResult<User> {
        let user_id = parse_id(user_id, "user_id")?;
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, password, forename, surname, email
            FROM user
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        user.ok_or_else(|| AppError::NotFound(format!("user with id \"{user_id}\" not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn accounts() -> Accounts {
        Accounts::open("sqlite::memory:").await.expect("open store")
    }

    async fn register_doej(accounts: &Accounts) -> i64 {
        accounts
            .register("doej", "password", "john", "doe", "johndoe@email.com")
            .await
            .expect("register doej")
    }

    #[tokio::test]
    async fn register_then_login() {
        let accounts = accounts().await;
        register_doej(&accounts).await;

        accounts
            .login("johndoe@email.com", "password")
            .await
            .expect("correct password");

        let err = accounts
            .login("johndoe@email.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)), "got {err:?}");

        let err = accounts
            .login("nobody@email.com", "password")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let accounts = accounts().await;
        register_doej(&accounts).await;
        let err = accounts
            .register("doej", "password", "jane", "doe", "janedoe@email.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "username \"doej\" already in use");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let accounts = accounts().await;
        register_doej(&accounts).await;
        let err = accounts
            .register("janed", "password", "jane", "doe", "JohnDoe@email.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "email \"johndoe@email.com\" already in use");
    }

    #[tokio::test]
    async fn padded_username_is_the_same_account_name() {
        let accounts = accounts().await;
        let id = accounts
            .register(" doej ", "password", " john ", "doe\t", "a@email.com")
            .await
            .unwrap();
        let stored = accounts.get_user_data_from_id(id).await.unwrap();
        assert_eq!(stored.username, "doej");
        assert_eq!(stored.forename, "john");
        assert_eq!(stored.surname, "doe");

        let err = accounts
            .register("doej", "password", "jane", "doe", "b@email.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "username \"doej\" already in use");
    }

    #[tokio::test]
    async fn empty_fields_are_named() {
        let accounts = accounts().await;
        let cases = [
            (["", "password", "john", "doe", "j@e.com"], "username is empty"),
            (["doej", "", "john", "doe", "j@e.com"], "password is empty"),
            (["doej", "password", "", "doe", "j@e.com"], "forename is empty"),
            (["doej", "password", "john", "", "j@e.com"], "surname is empty"),
            (["doej", "password", "john", "doe", ""], "email is empty"),
        ];
        for ([u, p, f, s, e], expected) in cases {
            let err = accounts.register(u, p, f, s, e).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
            assert_eq!(err.to_string(), expected);
        }
    }

    #[tokio::test]
    async fn overlong_and_malformed_input_is_rejected() {
        let accounts = accounts().await;
        let long_name = "x".repeat(33);
        let err = accounts
            .register(&long_name, "password", "john", "doe", "j@e.com")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "username exceeds maximum length of 32 characters"
        );

        let err = accounts
            .register("doej", "password", "john", "doe", "not-an-email")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn password_is_stored_hashed() {
        let accounts = accounts().await;
        let id = register_doej(&accounts).await;
        let user = accounts.get_user_data_from_id(id).await.expect("user");
        assert_ne!(user.password, "password");
        assert!(user.password.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn get_user_data_by_email_is_case_insensitive() {
        let accounts = accounts().await;
        let id = register_doej(&accounts).await;
        let user = accounts
            .get_user_data(" JohnDoe@Email.com ")
            .await
            .expect("user");
        assert_eq!(user.user_id, id);
        assert_eq!(user.username, "doej");
        assert_eq!(user.forename, "john");
        assert_eq!(user.surname, "doe");

        let err = accounts.get_user_data("nobody@email.com").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_user_data_from_id_cases() {
        let accounts = accounts().await;

        let err = accounts.get_user_data_from_id(1).await.unwrap_err();
        assert_eq!(err.to_string(), "user with id \"1\" not found");

        let err = accounts.get_user_data_from_id("dsadas").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "non-numeric user_id provided");

        let id = register_doej(&accounts).await;
        let user = accounts
            .get_user_data_from_id(id.to_string())
            .await
            .expect("user by string id");
        assert_eq!(user.email, "johndoe@email.com");
    }
}
