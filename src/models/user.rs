use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_premium: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Minimal user projection embedded in payment and contact listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: i32,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct CreateUserData {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_premium: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUserData {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_premium: Option<bool>,
    pub is_admin: Option<bool>,
}

impl UserDetail {
    pub async fn create(pool: &PgPool, data: CreateUserData) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO user_details (username, email, password_hash, is_premium, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.is_premium)
        .bind(data.is_admin)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM user_details WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Email lookups ignore case
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM user_details WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM user_details ORDER BY user_id
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Applies the provided fields and stamps `updated_at`.
    /// Returns `None` when the user does not exist.
    pub async fn update(
        pool: &PgPool,
        id: i32,
        data: UpdateUserData,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            UPDATE user_details
            SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                is_premium = COALESCE($5, is_premium),
                is_admin = COALESCE($6, is_admin),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.is_premium)
        .bind(data.is_admin)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Returns whether a row was deleted
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_details WHERE user_id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets the premium flag inside a caller-owned transaction
    pub async fn set_premium(
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
        is_premium: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            UPDATE user_details
            SET is_premium = $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(is_premium)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(user)
    }

    /// (total users, premium users, users created since `active_since`)
    pub async fn counts(
        pool: &PgPool,
        active_since: DateTime<Utc>,
    ) -> Result<(i64, i64, i64), sqlx::Error> {
        sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE is_premium),
                COUNT(*) FILTER (WHERE created_at > $1)
            FROM user_details
            "#,
        )
        .bind(active_since)
        .fetch_one(pool)
        .await
    }

    pub async fn newest(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM user_details ORDER BY created_at DESC LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Downgrades non-admin premium users whose newest payment is older than
    /// the cutoff. Users without any payment keep their flag.
    pub async fn expire_premium_paid_before(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<i32>, sqlx::Error> {
        let ids = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE user_details u
            SET is_premium = FALSE, updated_at = NOW()
            WHERE u.is_premium = TRUE
              AND u.is_admin = FALSE
              AND (SELECT MAX(p.payment_date) FROM payments p WHERE p.user_id = u.user_id) < $1
            RETURNING u.user_id
            "#,
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }
}
