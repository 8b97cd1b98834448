use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub contact_id: i32,
    pub user_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactWithUser {
    #[serde(flatten)]
    pub contact: ContactMessage,
    pub user: Option<UserSummary>,
}

#[derive(FromRow)]
struct ContactUserRow {
    #[sqlx(flatten)]
    contact: ContactMessage,
    username: Option<String>,
    user_email: Option<String>,
}

impl From<ContactUserRow> for ContactWithUser {
    fn from(row: ContactUserRow) -> Self {
        let user = match (row.contact.user_id, row.username, row.user_email) {
            (Some(user_id), Some(username), Some(email)) => Some(UserSummary {
                user_id,
                username,
                email,
            }),
            _ => None,
        };
        Self {
            contact: row.contact,
            user,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContactData {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactMessage {
    pub async fn create(
        pool: &PgPool,
        user_id: Option<i32>,
        data: ContactData,
    ) -> Result<Self, sqlx::Error> {
        let contact = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO contact_messages (user_id, name, email, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.message)
        .fetch_one(pool)
        .await?;

        Ok(contact)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let contact = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM contact_messages WHERE contact_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(contact)
    }

    /// Newest messages first, with the linked account when there is one
    pub async fn list_with_users(pool: &PgPool) -> Result<Vec<ContactWithUser>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ContactUserRow>(
            r#"
            SELECT c.*, u.username, u.email AS user_email
            FROM contact_messages c
            LEFT JOIN user_details u ON u.user_id = c.user_id
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(ContactWithUser::from).collect())
    }

    pub async fn update(pool: &PgPool, id: i32, data: ContactData) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE contact_messages
            SET name = $2, email = $3, message = $4
            WHERE contact_id = $1
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM contact_messages WHERE contact_id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
