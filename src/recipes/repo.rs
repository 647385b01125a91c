use std::collections::{HashMap, HashSet};

use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;
use crate::recipes::dto::{
    RecipeDetails, RecipeIngredientEntry, RecipeListQuery, RecipePayload,
};
use crate::tags::repo::Tag;
use crate::users::dto::PublicUser;
use crate::users::repo::subscribed_ids;

#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub author_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: OffsetDateTime,
}

const RECIPE_COLUMNS: &str = "id, author_id, name, image, text, cooking_time, pub_date";

pub async fn find_row(db: &PgPool, id: i64) -> anyhow::Result<Option<RecipeRow>> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Newest-first page of recipes matching the filters. Viewer-relative
/// filters are no-ops for anonymous callers.
pub async fn list_rows(
    db: &PgPool,
    query: &RecipeListQuery,
    viewer: Option<Uuid>,
) -> anyhow::Result<Vec<RecipeRow>> {
    let only_favorited = query.is_favorited && viewer.is_some();
    let only_in_cart = query.is_in_shopping_cart && viewer.is_some();
    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        SELECT {RECIPE_COLUMNS}
        FROM recipes r
        WHERE ($1::uuid IS NULL OR r.author_id = $1)
          AND (cardinality($2::text[]) = 0 OR EXISTS (
                SELECT 1 FROM recipe_tags rt
                JOIN tags t ON t.id = rt.tag_id
                WHERE rt.recipe_id = r.id AND t.slug = ANY($2)))
          AND (NOT $3 OR EXISTS (
                SELECT 1 FROM favorites f
                WHERE f.recipe_id = r.id AND f.user_id = $4))
          AND (NOT $5 OR EXISTS (
                SELECT 1 FROM shopping_cart sc
                WHERE sc.recipe_id = r.id AND sc.user_id = $4))
        ORDER BY r.pub_date DESC, r.id DESC
        LIMIT $6 OFFSET $7
        "#
    ))
    .bind(query.author)
    .bind(&query.tags)
    .bind(only_favorited)
    .bind(viewer)
    .bind(only_in_cart)
    .bind(query.limit)
    .bind(query.offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Replaces the recipe's tag and ingredient links inside the given
/// transaction. Old rows are deleted first, so edits never leave a
/// partial mix of old and new entries.
async fn replace_links(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    payload: &RecipePayload,
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    let mut tag_ids = payload.tags.clone();
    tag_ids.sort_unstable();
    tag_ids.dedup();

    let known_tags: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(&tag_ids)
        .fetch_one(&mut **tx)
        .await?;
    if known_tags != tag_ids.len() as i64 {
        return Err(ApiError::bad_request("Unknown tag"));
    }

    let ingredient_ids: Vec<i64> = payload.ingredients.iter().map(|i| i.id).collect();
    let amounts: Vec<i32> = payload.ingredients.iter().map(|i| i.amount).collect();

    let known_ingredients: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
            .bind(&ingredient_ids)
            .fetch_one(&mut **tx)
            .await?;
    if known_ingredients != ingredient_ids.len() as i64 {
        return Err(ApiError::bad_request("Unknown ingredient"));
    }

    sqlx::query(
        "INSERT INTO recipe_tags (recipe_id, tag_id) SELECT $1, unnest($2::bigint[])",
    )
    .bind(recipe_id)
    .bind(&tag_ids)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
        SELECT $1, ingredient_id, amount
        FROM unnest($2::bigint[], $3::int[]) AS t(ingredient_id, amount)
        "#,
    )
    .bind(recipe_id)
    .bind(&ingredient_ids)
    .bind(&amounts)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn create(
    db: &PgPool,
    author_id: Uuid,
    payload: &RecipePayload,
) -> Result<i64, ApiError> {
    let mut tx = db.begin().await?;
    let recipe_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO recipes (author_id, name, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(author_id)
    .bind(payload.name.trim())
    .bind(&payload.text)
    .bind(&payload.image)
    .bind(payload.cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    replace_links(&mut tx, recipe_id, payload).await?;
    tx.commit().await?;
    Ok(recipe_id)
}

pub async fn update(db: &PgPool, recipe_id: i64, payload: &RecipePayload) -> Result<(), ApiError> {
    let mut tx = db.begin().await?;
    sqlx::query(
        r#"
        UPDATE recipes
        SET name = $2, text = $3, image = $4, cooking_time = $5
        WHERE id = $1
        "#,
    )
    .bind(recipe_id)
    .bind(payload.name.trim())
    .bind(&payload.text)
    .bind(&payload.image)
    .bind(payload.cooking_time)
    .execute(&mut *tx)
    .await?;

    replace_links(&mut tx, recipe_id, payload).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn delete(db: &PgPool, recipe_id: i64) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct IngredientLine {
    recipe_id: i64,
    id: i64,
    name: String,
    measurement_unit: String,
    amount: i32,
}

#[derive(Debug, FromRow)]
struct TagLine {
    recipe_id: i64,
    id: i64,
    name: String,
    slug: String,
    color: String,
}

async fn flagged_ids(
    db: &PgPool,
    table: &str,
    viewer: Option<Uuid>,
    recipe_ids: &[i64],
) -> anyhow::Result<HashSet<i64>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    let rows: Vec<(i64,)> = sqlx::query_as(&format!(
        "SELECT recipe_id FROM {table} WHERE user_id = $1 AND recipe_id = ANY($2)"
    ))
    .bind(viewer)
    .bind(recipe_ids)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Joins a page of recipe rows with their tags, ingredient lines, author
/// profiles and viewer-relative flags. Input order is preserved.
pub async fn load_details(
    db: &PgPool,
    rows: Vec<RecipeRow>,
    viewer: Option<Uuid>,
) -> Result<Vec<RecipeDetails>, ApiError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let recipe_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<Uuid> = rows.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let ingredient_lines = sqlx::query_as::<_, IngredientLine>(
        r#"
        SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY ri.recipe_id, ri.id
        "#,
    )
    .bind(&recipe_ids)
    .fetch_all(db)
    .await?;

    let tag_lines = sqlx::query_as::<_, TagLine>(
        r#"
        SELECT rt.recipe_id, t.id, t.name, t.slug, t.color
        FROM recipe_tags rt
        JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY rt.recipe_id, t.id
        "#,
    )
    .bind(&recipe_ids)
    .fetch_all(db)
    .await?;

    let authors = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, username, first_name, last_name, password_hash, created_at
        FROM users
        WHERE id = ANY($1)
        "#,
    )
    .bind(&author_ids)
    .fetch_all(db)
    .await?;

    let favorited = flagged_ids(db, "favorites", viewer, &recipe_ids).await?;
    let in_cart = flagged_ids(db, "shopping_cart", viewer, &recipe_ids).await?;
    let followed = subscribed_ids(db, viewer, &author_ids).await?;

    let mut ingredients_by_recipe: HashMap<i64, Vec<RecipeIngredientEntry>> = HashMap::new();
    for line in ingredient_lines {
        ingredients_by_recipe
            .entry(line.recipe_id)
            .or_default()
            .push(RecipeIngredientEntry {
                id: line.id,
                name: line.name,
                measurement_unit: line.measurement_unit,
                amount: line.amount,
            });
    }

    let mut tags_by_recipe: HashMap<i64, Vec<Tag>> = HashMap::new();
    for line in tag_lines {
        tags_by_recipe.entry(line.recipe_id).or_default().push(Tag {
            id: line.id,
            name: line.name,
            slug: line.slug,
            color: line.color,
        });
    }

    let authors_by_id: HashMap<Uuid, User> =
        authors.into_iter().map(|u| (u.id, u)).collect();

    let mut details = Vec::with_capacity(rows.len());
    for row in rows {
        let author = authors_by_id
            .get(&row.author_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Recipe author not found"))?;
        let is_subscribed = followed.contains(&author.id);
        details.push(RecipeDetails {
            id: row.id,
            tags: tags_by_recipe.remove(&row.id).unwrap_or_default(),
            author: PublicUser::from_user(author, is_subscribed),
            ingredients: ingredients_by_recipe.remove(&row.id).unwrap_or_default(),
            is_favorited: favorited.contains(&row.id),
            is_in_shopping_cart: in_cart.contains(&row.id),
            name: row.name,
            image: row.image,
            text: row.text,
            cooking_time: row.cooking_time,
        });
    }
    Ok(details)
}

pub async fn add_favorite(db: &PgPool, user_id: Uuid, recipe_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Returns false when the recipe was not favorited.
pub async fn remove_favorite(db: &PgPool, user_id: Uuid, recipe_id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
