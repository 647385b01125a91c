pub mod handlers;
pub mod repo;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(handlers::list_ingredients))
        .route("/ingredients/:id", get(handlers::get_ingredient))
}
