use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::jwt::{AuthUser, OptionalAuthUser},
    error::{is_unique_violation, ApiError},
    recipes::{
        dto::{RecipeDetails, RecipeListQuery, RecipePayload, RecipeShort},
        repo,
    },
    state::AppState,
};

impl From<repo::RecipeRow> for RecipeShort {
    fn from(row: repo::RecipeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            image: row.image,
            cooking_time: row.cooking_time,
        }
    }
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<RecipeDetails>>, ApiError> {
    let query = RecipeListQuery::from_pairs(&pairs).map_err(ApiError::BadRequest)?;
    let rows = repo::list_rows(&state.db, &query, viewer).await?;
    let details = repo::load_details(&state.db, rows, viewer).await?;
    Ok(Json(details))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetails>, ApiError> {
    let row = repo::find_row(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    let mut details = repo::load_details(&state.db, vec![row], viewer).await?;
    Ok(Json(details.remove(0)))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeDetails>), ApiError> {
    payload.validate()?;
    let recipe_id = repo::create(&state.db, user_id, &payload).await?;
    info!(user_id = %user_id, recipe_id, "recipe created");

    let row = repo::find_row(&state.db, recipe_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    let mut details = repo::load_details(&state.db, vec![row], Some(user_id)).await?;
    Ok((StatusCode::CREATED, Json(details.remove(0))))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<RecipeDetails>, ApiError> {
    payload.validate()?;
    let row = repo::find_row(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    if row.author_id != user_id {
        warn!(user_id = %user_id, recipe_id = id, "non-author update rejected");
        return Err(ApiError::Forbidden("Only the author can edit a recipe".into()));
    }

    repo::update(&state.db, id, &payload).await?;
    info!(user_id = %user_id, recipe_id = id, "recipe updated");

    let row = repo::find_row(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    let mut details = repo::load_details(&state.db, vec![row], Some(user_id)).await?;
    Ok(Json(details.remove(0)))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let row = repo::find_row(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    if row.author_id != user_id {
        warn!(user_id = %user_id, recipe_id = id, "non-author delete rejected");
        return Err(ApiError::Forbidden("Only the author can delete a recipe".into()));
    }
    repo::delete(&state.db, id).await?;
    info!(user_id = %user_id, recipe_id = id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<RecipeShort>), ApiError> {
    let row = repo::find_row(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;

    repo::add_favorite(&state.db, user_id, id).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::conflict("Recipe is already in favorites")
        } else {
            ApiError::Database(e)
        }
    })?;

    info!(user_id = %user_id, recipe_id = id, "recipe favorited");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[instrument(skip(state))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !repo::remove_favorite(&state.db, user_id, id).await? {
        return Err(ApiError::not_found("Recipe is not in favorites"));
    }
    info!(user_id = %user_id, recipe_id = id, "favorite removed");
    Ok(StatusCode::NO_CONTENT)
}
