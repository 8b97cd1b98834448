use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TemplateCategory {
    pub category_id: i32,
    pub category_name: String,
    pub category_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CategoryData {
    pub category_name: String,
    pub category_description: Option<String>,
}

impl TemplateCategory {
    pub async fn create(pool: &PgPool, data: CategoryData) -> Result<Self, sqlx::Error> {
        let category = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO template_categories (category_name, category_description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&data.category_name)
        .bind(&data.category_description)
        .fetch_one(pool)
        .await?;

        Ok(category)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let category = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM template_categories WHERE category_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(category)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let categories = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM template_categories ORDER BY category_name
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(categories)
    }

    /// Case-insensitive name check, optionally ignoring one category (for updates)
    pub async fn name_taken(
        pool: &PgPool,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, sqlx::Error> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM template_categories
                WHERE LOWER(category_name) = LOWER($1)
                  AND ($2::INTEGER IS NULL OR category_id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        data: CategoryData,
    ) -> Result<Option<Self>, sqlx::Error> {
        let category = sqlx::query_as::<_, Self>(
            r#"
            UPDATE template_categories
            SET category_name = $2, category_description = $3, updated_at = NOW()
            WHERE category_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.category_name)
        .bind(&data.category_description)
        .fetch_optional(pool)
        .await?;

        Ok(category)
    }

    pub async fn template_count(pool: &PgPool, id: i32) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM card_templates WHERE category_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM template_categories WHERE category_id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
