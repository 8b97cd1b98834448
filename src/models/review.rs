use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub review_id: i32,
    pub user_id: i32,
    pub template_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateReviewData {
    pub user_id: i32,
    pub template_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
}

impl Review {
    pub async fn create(pool: &PgPool, data: CreateReviewData) -> Result<Self, sqlx::Error> {
        let review = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO reviews (user_id, template_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(data.template_id)
        .bind(data.rating)
        .bind(&data.comment)
        .fetch_one(pool)
        .await?;

        Ok(review)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let review = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM reviews WHERE review_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(review)
    }

    pub async fn list(pool: &PgPool, template_id: Option<i32>) -> Result<Vec<Self>, sqlx::Error> {
        let reviews = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM reviews
            WHERE ($1::INTEGER IS NULL OR template_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(template_id)
        .fetch_all(pool)
        .await?;

        Ok(reviews)
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        rating: i32,
        comment: Option<String>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE reviews SET rating = $2, comment = $3 WHERE review_id = $1
            "#,
        )
        .bind(id)
        .bind(rating)
        .bind(comment)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM reviews WHERE review_id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
