use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;

use crate::{error::ApiError, state::AppState, tags::repo::Tag};

#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(Tag::list(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Tag>, ApiError> {
    let tag = Tag::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tag not found"))?;
    Ok(Json(tag))
}
