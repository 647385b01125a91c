pub mod dto;
pub mod handlers;
pub mod repo;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/subscriptions", get(handlers::list_subscriptions))
        .route("/users/:id", get(handlers::get_user))
        .route(
            "/users/:id/subscribe",
            post(handlers::subscribe).delete(handlers::unsubscribe),
        )
}
