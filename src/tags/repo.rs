use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub color: String,
}

impl Tag {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Tag>> {
        let rows = sqlx::query_as::<_, Tag>(
            "SELECT id, name, slug, color FROM tags ORDER BY id",
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(
            "SELECT id, name, slug, color FROM tags WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(tag)
    }
}
