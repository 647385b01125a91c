pub mod handlers;
pub mod repo;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(handlers::list_tags))
        .route("/tags/:id", get(handlers::get_tag))
}
