use std::str::FromStr;

use anyhow::Context;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the database behind `database_url` and bring its schema up to date.
///
/// `sqlite::memory:` databases live as long as their connection, so they get a
/// single connection that the pool never recycles.
pub async fn open(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parse database url {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:");
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let db = pool_options
        .connect_with(options)
        .await
        .context("open sqlite database")?;

    MIGRATOR.run(&db).await.context("run migrations")?;
    info!(in_memory, "database ready");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_schema_survives_between_queries() {
        let db = open("sqlite::memory:").await.expect("open");
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('user', 'item') ORDER BY name",
        )
        .fetch_all(&db)
        .await
        .expect("list tables");
        assert_eq!(tables, vec!["item".to_string(), "user".to_string()]);
    }

    #[tokio::test]
    async fn file_database_is_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("exchangebay.db").display());
        let db = open(&url).await.expect("open");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user")
            .fetch_one(&db)
            .await
            .expect("count");
        assert_eq!(count, 0);
    }
}
