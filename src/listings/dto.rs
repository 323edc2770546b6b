use serde::{Deserialize, Serialize};

use crate::listings::repo_types::ListingMetadata;

/// One of the caller's own listings, offered as a swap candidate. `id` is
/// its position in the caller's listing names.
#[derive(Debug, Serialize)]
pub struct OwnListing {
    pub id: usize,
    pub name: String,
}

/// Listing detail page: the listing plus what the caller could swap for it.
#[derive(Debug, Serialize)]
pub struct ListingPage {
    #[serde(flatten)]
    pub listing: ListingMetadata,
    pub own_listings: Vec<OwnListing>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(rename = "searchTerm", alias = "q", default)]
    pub search_term: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedListingResponse {
    pub id: i64,
    pub imgloc: String,
}
