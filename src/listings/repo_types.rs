use serde::Serialize;
use sqlx::FromRow;

/// Stand-in for a listing's swap history; nothing records trades yet.
pub const SWAPLIST_PLACEHOLDER: &str = "Placeholder, Placeholder Second, Placeholder Third";

/// `item` row, optionally joined with its lister's username.
#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    pub item_id: i64,
    pub user_id: i64,
    pub item_name: String,
    pub item_description: String,
    pub item_img_loc: String,
    pub username: Option<String>,
}

/// What a listing page renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lister_id: Option<i64>,
    pub id: i64,
    #[serde(rename = "itemname")]
    pub item_name: String,
    #[serde(rename = "itemdescription")]
    pub item_description: String,
    #[serde(rename = "imgloc")]
    pub img_loc: String,
    #[serde(rename = "listerusername")]
    pub lister_username: String,
    pub swaplist: String,
}

impl ListingMetadata {
    /// Full detail view: owner id, owner name and swap list included.
    pub fn detailed(row: ItemRow) -> Self {
        Self {
            lister_id: Some(row.user_id),
            id: row.item_id,
            item_name: row.item_name,
            item_description: row.item_description,
            img_loc: row.item_img_loc,
            lister_username: row.username.unwrap_or_default(),
            swaplist: SWAPLIST_PLACEHOLDER.to_string(),
        }
    }

    /// Aggregate views (home page, search) withhold who listed the item.
    pub fn summary(row: ItemRow) -> Self {
        Self {
            lister_id: None,
            id: row.item_id,
            item_name: row.item_name,
            item_description: row.item_description,
            img_loc: row.item_img_loc,
            lister_username: String::new(),
            swaplist: String::new(),
        }
    }
}
