use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::recipes::dto::RecipeShort;

pub async fn subscribe(db: &PgPool, user_id: Uuid, author_id: Uuid) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(author_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Returns false when no subscription row existed.
pub async fn unsubscribe(db: &PgPool, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn is_subscribed(
    db: &PgPool,
    viewer: Option<Uuid>,
    author_id: Uuid,
) -> anyhow::Result<bool> {
    let Some(viewer) = viewer else {
        return Ok(false);
    };
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM subscriptions WHERE user_id = $1 AND author_id = $2)",
    )
    .bind(viewer)
    .bind(author_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

/// Which of `author_ids` the viewer follows. Empty set for anonymous viewers.
pub async fn subscribed_ids(
    db: &PgPool,
    viewer: Option<Uuid>,
    author_ids: &[Uuid],
) -> anyhow::Result<HashSet<Uuid>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT author_id FROM subscriptions WHERE user_id = $1 AND author_id = ANY($2)",
    )
    .bind(viewer)
    .bind(author_ids)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn list_subscribed_authors(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<User>> {
    let rows = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
               u.password_hash, u.created_at
        FROM users u
        JOIN subscriptions s ON s.author_id = u.id
        WHERE s.user_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn recipes_by_author(
    db: &PgPool,
    author_id: Uuid,
    limit: Option<i64>,
) -> anyhow::Result<Vec<RecipeShort>> {
    let rows = sqlx::query_as::<_, RecipeShort>(
        r#"
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC
        LIMIT $2
        "#,
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn recipes_count(db: &PgPool, author_id: Uuid) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}
