use std::fmt::Display;

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{
    db,
    error::{AppError, AppResult},
    listings::repo_types::{ItemRow, ListingMetadata},
    validation::{max_len, parse_id, require},
};

/// Listing store: owns the `item` table and reads `user` only to name listers.
#[derive(Clone)]
pub struct Listings {
    db: SqlitePool,
}

/// Escape LIKE wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Listings {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Open (and migrate) the database at `database_url` and bind a store to it.
    pub async fn open(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::new(db::open(database_url).await?))
    }

    /// Insert a listing owned by `user_id` and return its id.
    pub async fn create(
        &self,
        user_id: impl Display,
        item_name: &str,
        item_description: &str,
        img_location: &str,
    ) -> AppResult<i64> {
        let user_id = parse_id(user_id, "user_id")?;
        require(item_name, "item_name")?;
        require(item_description, "item_description")?;
        require(img_location, "img_location")?;

        max_len(item_name, "item_name", 50)?;
        max_len(item_description, "item_description", 250)?;
        max_len(img_location, "img_location", 50)?;

        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO item (user_id, item_name, item_description, item_img_loc)
            VALUES (?, ?, ?, ?)
            RETURNING item_id
            "#,
        )
        .bind(user_id)
        .bind(item_name)
        .bind(item_description)
        .bind(img_location)
        .fetch_one(&self.db)
        .await;

        match inserted {
            Ok(item_id) => {
                info!(item_id, user_id, "listing created");
                Ok(item_id)
            }
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(
                AppError::Validation(format!("user with id \"{user_id}\" does not exist")),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Detail view of one listing. Ids that are not integers cannot match any
    /// row and are reported as not found.
    pub async fn get_metadata(&self, listing_id: impl Display) -> AppResult<ListingMetadata> {
        let raw = listing_id.to_string();
        let not_found = || AppError::NotFound(format!("listing with ID \"{raw}\" not found"));
        let item_id = raw.parse::<i64>().map_err(|_| not_found())?;

        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT i.item_id, i.user_id, i.item_name, i.item_description, i.item_img_loc,
                   u.username
            FROM item i
            LEFT JOIN user u ON u.user_id = i.user_id
            WHERE i.item_id = ?
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(ListingMetadata::detailed).ok_or_else(not_found)
    }

    /// Every listing in insertion order, lister details withheld.
    pub async fn get_listings(&self) -> AppResult<Vec<ListingMetadata>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT item_id, user_id, item_name, item_description, item_img_loc,
                   NULL AS username
            FROM item
            ORDER BY item_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound("no listings found".into()));
        }
        Ok(rows.into_iter().map(ListingMetadata::summary).collect())
    }

    /// Names of the listings owned by `user_id`; empty when they have none.
    pub async fn get_listing_names_from_user_id(
        &self,
        user_id: impl Display,
    ) -> AppResult<Vec<String>> {
        let user_id = parse_id(user_id, "user_id")?;
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT item_name
            FROM item
            WHERE user_id = ?
            ORDER BY item_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        debug!(user_id, count = names.len(), "listing names loaded");
        Ok(names)
    }

    /// Case-insensitive substring search over names and descriptions.
    pub async fn query_search_term(&self, term: &str) -> AppResult<Vec<ListingMetadata>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = like_pattern(term);
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT item_id, user_id, item_name, item_description, item_img_loc,
                   NULL AS username
            FROM item
            WHERE item_name LIKE ? ESCAPE '\'
               OR item_description LIKE ? ESCAPE '\'
            ORDER BY item_id
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.db)
        .await?;
        debug!(term, matches = rows.len(), "search");
        Ok(rows.into_iter().map(ListingMetadata::summary).collect())
    }
}
