use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        jwt::{AuthUser, OptionalAuthUser},
        repo::User,
    },
    error::{is_unique_violation, ApiError},
    state::AppState,
    users::{
        dto::{PublicUser, RecipesLimitQuery, SubscriptionQuery, SubscriptionUser},
        repo,
    },
};

async fn subscription_user(
    state: &AppState,
    author: User,
    is_subscribed: bool,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionUser, ApiError> {
    let recipes = repo::recipes_by_author(&state.db, author.id, recipes_limit).await?;
    let recipes_count = repo::recipes_count(&state.db, author.id).await?;
    Ok(SubscriptionUser {
        user: PublicUser::from_user(author, is_subscribed),
        recipes,
        recipes_count,
    })
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let is_subscribed = repo::is_subscribed(&state.db, viewer, user.id).await?;
    Ok(Json(PublicUser::from_user(user, is_subscribed)))
}

#[instrument(skip(state))]
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<RecipesLimitQuery>,
) -> Result<(StatusCode, Json<SubscriptionUser>), ApiError> {
    q.validate()?;
    if id == user_id {
        return Err(ApiError::bad_request("Cannot subscribe to yourself"));
    }
    let author = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    repo::subscribe(&state.db, user_id, author.id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!(user_id = %user_id, author_id = %author.id, "duplicate subscription");
                ApiError::conflict("Already subscribed to this author")
            } else {
                ApiError::Database(e)
            }
        })?;

    info!(user_id = %user_id, author_id = %author.id, "subscribed");
    let body = subscription_user(&state, author, true, q.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[instrument(skip(state))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !repo::unsubscribe(&state.db, user_id, id).await? {
        return Err(ApiError::not_found("Subscription not found"));
    }
    info!(user_id = %user_id, author_id = %id, "unsubscribed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<SubscriptionQuery>,
) -> Result<Json<Vec<SubscriptionUser>>, ApiError> {
    q.validate()?;
    let authors = repo::list_subscribed_authors(&state.db, user_id, q.limit, q.offset).await?;
    let mut items = Vec::with_capacity(authors.len());
    for author in authors {
        items.push(subscription_user(&state, author, true, q.recipes_limit).await?);
    }
    Ok(Json(items))
}
