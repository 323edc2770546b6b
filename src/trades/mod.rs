pub mod handlers;
pub mod offer;

use crate::state::AppState;
use axum::Router;

pub use offer::TradeOffer;

pub fn router() -> Router<AppState> {
    handlers::offer_routes()
}
