use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{CreatedListingResponse, ListingPage, OwnListing, SearchQuery};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::ApiQuery,
    images::{ensure_image, generated_stem, upload_image, Form},
    listings::{repo::Listings, repo_types::ListingMetadata},
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/listings/search", get(search_listings))
        .route("/listings/:id", get(get_listing))
        .route("/me/listings", get(my_listing_names))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(list_listings).post(create_listing))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

// --- handlers ---

/// Home page feed. An empty marketplace renders as an empty list.
#[instrument(skip(state))]
pub async fn list_listings(State(state): State<AppState>) -> AppResult<Json<Vec<ListingMetadata>>> {
    match Listings::new(state.db.clone()).get_listings().await {
        Ok(listings) => Ok(Json(listings)),
        Err(AppError::NotFound(_)) => Ok(Json(Vec::new())),
        Err(e) => Err(e),
    }
}

#[instrument(skip(state))]
pub async fn search_listings(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<SearchQuery>,
) -> AppResult<Json<Vec<ListingMetadata>>> {
    let hits = Listings::new(state.db.clone())
        .query_search_term(&q.search_term)
        .await?;
    Ok(Json(hits))
}

#[instrument(skip(state))]
pub async fn get_listing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ListingPage>> {
    let listings = Listings::new(state.db.clone());
    let own_listings = listings
        .get_listing_names_from_user_id(user.user_id)
        .await?
        .into_iter()
        .enumerate()
        .map(|(id, name)| OwnListing { id, name })
        .collect();
    let listing = listings.get_metadata(&id).await?;
    Ok(Json(ListingPage {
        listing,
        own_listings,
    }))
}

#[instrument(skip(state))]
pub async fn my_listing_names(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<String>>> {
    let names = Listings::new(state.db.clone())
        .get_listing_names_from_user_id(user.user_id)
        .await?;
    Ok(Json(names))
}

/// POST /listings (multipart)
/// Fields: `item_name`, `item_description`, `item_img` (image file).
#[instrument(skip(state, form))]
pub async fn create_listing(
    State(state): State<AppState>,
    user: AuthUser,
    mut form: Form,
) -> AppResult<(StatusCode, HeaderMap, Json<CreatedListingResponse>)> {
    let image = form
        .take_file("item_img")
        .ok_or_else(|| AppError::empty("item_img"))?;
    ensure_image(&image, "item_img")?;

    let key = upload_image(
        state.storage.as_ref(),
        "images",
        &generated_stem(),
        "item_img",
        image,
    )
    .await?;

    let created = Listings::new(state.db.clone())
        .create(
            user.user_id,
            form.text("item_name"),
            form.text("item_description"),
            &key,
        )
        .await;
    let id = match created {
        Ok(id) => id,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete_object(&key).await {
                warn!(error = %cleanup, key = %key, "failed to remove orphaned image");
            }
            return Err(e);
        }
    };

    info!(id, user_id = user.user_id, "listing published");
    let mut headers = HeaderMap::new();
    let location = HeaderValue::from_str(&format!("/api/v1/listings/{id}"))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    headers.insert(header::LOCATION, location);

    Ok((
        StatusCode::CREATED,
        headers,
        Json(CreatedListingResponse { id, imgloc: key }),
    ))
}
