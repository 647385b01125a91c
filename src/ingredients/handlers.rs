use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{error::ApiError, ingredients::repo::Ingredient, state::AppState};

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(q): Query<IngredientQuery>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let rows = Ingredient::list(&state.db, q.name.as_deref()).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Ingredient>, ApiError> {
    let row = Ingredient::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient not found"))?;
    Ok(Json(row))
}
