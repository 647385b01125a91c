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
        .route("/recipes", get(handlers::list_recipes).post(handlers::create_recipe))
        .route(
            "/recipes/:id",
            get(handlers::get_recipe)
                .patch(handlers::update_recipe)
                .delete(handlers::delete_recipe),
        )
        .route(
            "/recipes/:id/favorite",
            post(handlers::add_favorite).delete(handlers::remove_favorite),
        )
}
