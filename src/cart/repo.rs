use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::cart::shopping_list::IngredientRow;

pub async fn add_entry(db: &PgPool, user_id: Uuid, recipe_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO shopping_cart (user_id, recipe_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Returns false when the recipe was not in the cart.
pub async fn remove_entry(db: &PgPool, user_id: Uuid, recipe_id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, FromRow)]
struct CartIngredientLine {
    name: String,
    measurement_unit: String,
    amount: i32,
}

/// Flat (name, unit, amount) lines for every recipe in the user's cart.
/// The unique (user, recipe) constraint on shopping_cart guarantees each
/// recipe contributes exactly once; grouping happens in `shopping_list`.
pub async fn cart_ingredient_rows(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<IngredientRow>> {
    let lines = sqlx::query_as::<_, CartIngredientLine>(
        r#"
        SELECT i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        JOIN shopping_cart sc ON sc.recipe_id = ri.recipe_id
        WHERE sc.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(lines
        .into_iter()
        .map(|l| IngredientRow {
            name: l.name,
            measurement_unit: l.measurement_unit,
            amount: l.amount,
        })
        .collect())
}

pub async fn cart_recipe_names(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<String>> {
    let names: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT r.name
        FROM recipes r
        JOIN shopping_cart sc ON sc.recipe_id = r.id
        WHERE sc.user_id = $1
        ORDER BY r.name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(names.into_iter().map(|(name,)| name).collect())
}
