use sqlx::PgPool;

use crate::models::user::{CreateUserData, UpdateUserData, UserDetail};
use crate::services::card_design::is_plausible_email;
use crate::services::password::{hash_password_async, MIN_PASSWORD_LEN};

// Column widths in user_details
pub const MAX_USERNAME_LEN: usize = 10;
pub const MAX_EMAIL_LEN: usize = 50;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AccountError {
    #[error("Username is required and must be at most {} characters", MAX_USERNAME_LEN)]
    InvalidUsername,

    #[error("A valid email address of at most {} characters is required", MAX_EMAIL_LEN)]
    InvalidEmail,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    WeakPassword,
}

/// Trimmed username
pub fn validate_username(username: &str) -> Result<String, AccountError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(AccountError::InvalidUsername);
    }
    Ok(username.to_string())
}

/// Trimmed email
pub fn validate_email(email: &str) -> Result<String, AccountError> {
    let email = email.trim();
    if email.chars().count() > MAX_EMAIL_LEN || !is_plausible_email(email) {
        return Err(AccountError::InvalidEmail);
    }
    Ok(email.to_string())
}

pub fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::WeakPassword);
    }
    Ok(())
}

/// Makes sure the configured admin account exists and carries the admin flag.
/// An existing account keeps its password.
pub async fn bootstrap_admin(pool: &PgPool, email: &str, password: &str) -> anyhow::Result<()> {
    let email = validate_email(email)?;

    if let Some(user) = UserDetail::find_by_email(pool, &email).await? {
        if !user.is_admin {
            UserDetail::update(
                pool,
                user.user_id,
                UpdateUserData {
                    is_admin: Some(true),
                    ..Default::default()
                },
            )
            .await?;
            tracing::info!(user_id = user.user_id, "Granted admin to configured account");
        }
        return Ok(());
    }

    validate_password(password)?;
    let user = UserDetail::create(
        pool,
        CreateUserData {
            username: "admin".to_string(),
            email,
            password_hash: hash_password_async(password.to_string()).await?,
            is_premium: true,
            is_admin: true,
        },
    )
    .await?;

    tracing::info!(user_id = user.user_id, "Created bootstrap admin account");
    Ok(())
}
