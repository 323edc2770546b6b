use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::offer::TradeOffer;
use crate::{
    auth::{Accounts, AuthUser},
    error::{AppError, AppResult},
    extract::ApiJson,
    listings::Listings,
    state::AppState,
};

pub const OFFER_SENT: &str = "Your trade offer has been sent successfully!";

#[derive(Debug, Deserialize)]
pub struct OfferRequest {
    /// Index into the caller's own listing names.
    #[serde(alias = "swapitem")]
    pub swap_item: usize,
}

#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub message: &'static str,
}

pub fn offer_routes() -> Router<AppState> {
    Router::new().route("/listings/:id/offers", post(send_offer))
}

/// Offer one of the caller's listings in exchange for listing `id`. The email
/// to the lister is sent in the background; the caller gets the confirmation
/// whether or not it is delivered.
#[instrument(skip(state))]
pub async fn send_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<OfferRequest>,
) -> AppResult<(StatusCode, Json<OfferResponse>)> {
    let listings = Listings::new(state.db.clone());
    let own = listings.get_listing_names_from_user_id(user.user_id).await?;
    let wanted = listings.get_metadata(&id).await?;

    let lister_id = wanted
        .lister_id
        .ok_or_else(|| AppError::Internal(format!("listing {} has no lister", wanted.id)))?;
    if lister_id == user.user_id {
        return Err(AppError::Validation(
            "Cannot make an offer on an item you own".into(),
        ));
    }

    let offered_item = own.get(body.swap_item).cloned().ok_or_else(|| {
        AppError::Validation("swap_item does not refer to one of your listings".into())
    })?;

    let lister = Accounts::new(state.db.clone())
        .get_user_data_from_id(lister_id)
        .await?;

    let offer = TradeOffer {
        lister_username: lister.username,
        buyer_username: user.username,
        buyer_email: user.email,
        offered_item,
        wanted_item: wanted.item_name,
        listing_id: wanted.id,
    };

    state.outbox.dispatch(
        lister.email,
        offer.subject(),
        offer.body(&state.config.public_base_url),
    );

    info!(listing_id = offer.listing_id, buyer = user.user_id, "trade offer dispatched");
    Ok((
        StatusCode::ACCEPTED,
        Json(OfferResponse {
            message: OFFER_SENT,
        }),
    ))
}
