use axum::routing::get;
use axum::Router;

use crate::handlers::hotel;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/hotel", get(hotel::get_hotel))
}
