use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{
    accounts::AccountError, background::BackgroundError, card_design::DesignError,
    card_export::ExportError, password::PasswordError, upgrade::UpgradeError,
};

// PostgreSQL SQLSTATE codes surfaced as conflicts
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Premium subscription required for: {}", .0.join(", "))]
    PremiumRequired(Vec<String>),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::PremiumRequired(_) => "premium_required",
            AppError::Database(_) => "database",
            AppError::Render(_) => "render",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return AppError::Conflict("A record with this value already exists".to_string())
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return AppError::Conflict(
                        "The record is referenced by other records".to_string(),
                    )
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<DesignError> for AppError {
    fn from(err: DesignError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<BackgroundError> for AppError {
    fn from(err: BackgroundError) -> Self {
        match err {
            BackgroundError::Io(e) => AppError::Render(e.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Design(e) => e.into(),
            ExportError::Background(e) => e.into(),
            ExportError::Render(e) => AppError::Render(e.to_string()),
            ExportError::Task(e) => AppError::Render(e.to_string()),
        }
    }
}

impl From<UpgradeError> for AppError {
    fn from(err: UpgradeError) -> Self {
        match err {
            UpgradeError::DatabaseError(e) => e.into(),
            UpgradeError::Encryption(e) => AppError::Internal(e.into()),
            UpgradeError::UserNotFound => AppError::NotFound("User not found".to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        AppError::Internal(anyhow::anyhow!("Session error: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to perform this action".to_string(),
            ),
            AppError::PremiumRequired(_) => (StatusCode::PAYMENT_REQUIRED, self.to_string()),
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Render(e) => {
                tracing::error!(error = %e, "Card rendering failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error generating PDF. Please try again.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let mut body = json!({
            "error": kind,
            "message": message,
        });

        if let AppError::PremiumRequired(features) = &self {
            body["features"] = json!(features);
        }

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
