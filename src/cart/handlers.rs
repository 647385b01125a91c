use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::{
    auth::jwt::AuthUser,
    cart::{repo, shopping_list},
    error::{is_unique_violation, ApiError},
    recipes::dto::RecipeShort,
    recipes::repo::find_row,
    state::AppState,
};

#[instrument(skip(state))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<RecipeShort>), ApiError> {
    let row = find_row(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;

    repo::add_entry(&state.db, user_id, id).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::conflict("Recipe is already in the shopping cart")
        } else {
            ApiError::Database(e)
        }
    })?;

    info!(user_id = %user_id, recipe_id = id, "recipe added to cart");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[instrument(skip(state))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !repo::remove_entry(&state.db, user_id, id).await? {
        return Err(ApiError::not_found("Recipe is not in the shopping cart"));
    }
    info!(user_id = %user_id, recipe_id = id, "recipe removed from cart");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /recipes/download_shopping_cart — aggregated ingredient totals for
/// everything in the caller's cart, as an attached products.txt.
#[instrument(skip(state))]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(HeaderMap, String), ApiError> {
    let rows = repo::cart_ingredient_rows(&state.db, user_id).await?;
    let names = repo::cart_recipe_names(&state.db, user_id).await?;
    let report = shopping_list::build_report(rows, &names, OffsetDateTime::now_utc());

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"products.txt\""),
    );

    info!(user_id = %user_id, recipes = names.len(), "shopping list downloaded");
    Ok((headers, report))
}
