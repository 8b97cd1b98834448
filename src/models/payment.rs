use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_id: i32,
    pub user_id: i32,
    pub account_last_four: String,
    #[serde(skip)]
    pub account_number_encrypted: Vec<u8>,
    pub card_expiry_date: String,
    pub amount: f64,
    pub payment_date: DateTime<Utc>,
}

/// Payment with the paying user embedded, for admin listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWithUser {
    #[serde(flatten)]
    pub payment: Payment,
    pub user: UserSummary,
}

#[derive(FromRow)]
struct PaymentUserRow {
    #[sqlx(flatten)]
    payment: Payment,
    username: String,
    email: String,
}

impl From<PaymentUserRow> for PaymentWithUser {
    fn from(row: PaymentUserRow) -> Self {
        let user = UserSummary {
            user_id: row.payment.user_id,
            username: row.username,
            email: row.email,
        };
        Self {
            payment: row.payment,
            user,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePaymentData {
    pub user_id: i32,
    pub account_last_four: String,
    pub account_number_encrypted: Vec<u8>,
    pub card_expiry_date: String,
    pub amount: f64,
}

impl Payment {
    /// Inserts a payment inside a caller-owned transaction
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        data: CreatePaymentData,
    ) -> Result<Self, sqlx::Error> {
        let payment = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO payments (
                user_id, account_last_four, account_number_encrypted,
                card_expiry_date, amount, payment_date
            )
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(&data.account_last_four)
        .bind(&data.account_number_encrypted)
        .bind(&data.card_expiry_date)
        .bind(data.amount)
        .fetch_one(&mut **tx)
        .await?;

        Ok(payment)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let payment = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM payments WHERE payment_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(payment)
    }

    pub async fn list_with_users(pool: &PgPool) -> Result<Vec<PaymentWithUser>, sqlx::Error> {
        Self::newest_with_users(pool, None).await
    }

    /// Newest payments first; `limit = None` returns all of them
    pub async fn newest_with_users(
        pool: &PgPool,
        limit: Option<i64>,
    ) -> Result<Vec<PaymentWithUser>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PaymentUserRow>(
            r#"
            SELECT p.*, u.username, u.email
            FROM payments p
            JOIN user_details u ON u.user_id = p.user_id
            ORDER BY p.payment_date DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(PaymentWithUser::from).collect())
    }

    pub async fn list_by_user(pool: &PgPool, user_id: i32) -> Result<Vec<Self>, sqlx::Error> {
        let payments = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM payments
            WHERE user_id = $1
            ORDER BY payment_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(payments)
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        amount: f64,
        card_expiry_date: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET amount = $2, card_expiry_date = $3
            WHERE payment_id = $1
            "#,
        )
        .bind(id)
        .bind(amount)
        .bind(card_expiry_date)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM payments WHERE payment_id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// (payment count, revenue)
    pub async fn totals(pool: &PgPool) -> Result<(i64, f64), sqlx::Error> {
        sqlx::query_as::<_, (i64, f64)>(
            r#"
            SELECT COUNT(*), COALESCE(SUM(amount), 0)::DOUBLE PRECISION FROM payments
            "#,
        )
        .fetch_one(pool)
        .await
    }
}
