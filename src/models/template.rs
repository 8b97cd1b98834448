use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::category::TemplateCategory;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTemplate {
    pub template_id: i32,
    pub category_id: i32,
    pub title: String,
    pub card_template_description: Option<String>,
    pub file_path: String,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TemplateCategory>,
}

#[derive(Debug, Clone)]
pub struct TemplateData {
    pub category_id: i32,
    pub title: String,
    pub card_template_description: Option<String>,
    pub file_path: String,
    pub is_premium: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateFilter {
    pub premium: Option<bool>,
    pub category_id: Option<i32>,
}

// Template joined with its category; category columns are aliased to avoid
// clashing with the template's own timestamps.
#[derive(FromRow)]
struct TemplateRow {
    template_id: i32,
    category_id: i32,
    title: String,
    card_template_description: Option<String>,
    file_path: String,
    is_premium: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_name: String,
    category_description: Option<String>,
    category_created_at: DateTime<Utc>,
    category_updated_at: DateTime<Utc>,
}

impl From<TemplateRow> for CardTemplate {
    fn from(row: TemplateRow) -> Self {
        Self {
            template_id: row.template_id,
            category_id: row.category_id,
            title: row.title,
            card_template_description: row.card_template_description,
            file_path: row.file_path,
            is_premium: row.is_premium,
            created_at: row.created_at,
            updated_at: row.updated_at,
            category: Some(TemplateCategory {
                category_id: row.category_id,
                category_name: row.category_name,
                category_description: row.category_description,
                created_at: row.category_created_at,
                updated_at: row.category_updated_at,
            }),
        }
    }
}

const SELECT_WITH_CATEGORY: &str = r#"
    SELECT
        t.template_id, t.category_id, t.title, t.card_template_description,
        t.file_path, t.is_premium, t.created_at, t.updated_at,
        c.category_name, c.category_description,
        c.created_at AS category_created_at, c.updated_at AS category_updated_at
    FROM card_templates t
    JOIN template_categories c ON c.category_id = t.category_id
"#;

impl CardTemplate {
    pub async fn create(pool: &PgPool, data: TemplateData) -> Result<Self, sqlx::Error> {
        let template_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO card_templates (
                category_id, title, card_template_description, file_path, is_premium
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING template_id
            "#,
        )
        .bind(data.category_id)
        .bind(&data.title)
        .bind(&data.card_template_description)
        .bind(&data.file_path)
        .bind(data.is_premium)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, template_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds a template with its category embedded
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{SELECT_WITH_CATEGORY} WHERE t.template_id = $1");
        let row = sqlx::query_as::<_, TemplateRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Self::from))
    }

    pub async fn list(pool: &PgPool, filter: TemplateFilter) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "{SELECT_WITH_CATEGORY}
            WHERE ($1::BOOLEAN IS NULL OR t.is_premium = $1)
              AND ($2::INTEGER IS NULL OR t.category_id = $2)
            ORDER BY t.template_id"
        );
        let rows = sqlx::query_as::<_, TemplateRow>(&query)
            .bind(filter.premium)
            .bind(filter.category_id)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Self::from).collect())
    }

    /// Full replacement of the editable fields; stamps `updated_at`
    pub async fn update(pool: &PgPool, id: i32, data: TemplateData) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE card_templates
            SET
                category_id = $2,
                title = $3,
                card_template_description = $4,
                file_path = $5,
                is_premium = $6,
                updated_at = NOW()
            WHERE template_id = $1
            "#,
        )
        .bind(id)
        .bind(data.category_id)
        .bind(&data.title)
        .bind(&data.card_template_description)
        .bind(&data.file_path)
        .bind(data.is_premium)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM card_templates WHERE template_id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM card_templates")
            .fetch_one(pool)
            .await
    }

    pub async fn newest(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("{SELECT_WITH_CATEGORY} ORDER BY t.created_at DESC LIMIT $1");
        let rows = sqlx::query_as::<_, TemplateRow>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Self::from).collect())
    }
}
