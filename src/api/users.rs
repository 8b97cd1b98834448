use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::middleware::auth::{current_user, ensure_owner_or_admin, require_admin};
use crate::api::middleware::session::AppState;
use crate::error::{AppError, Result};
use crate::models::user::{CreateUserData, UpdateUserData, UserDetail};
use crate::services::accounts::{validate_email, validate_password, validate_username};
use crate::services::password::hash_password_async;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_admin: bool,
}

/// Every field is optional; flags are only honored for admins
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_premium: Option<bool>,
    pub is_admin: Option<bool>,
}

impl UpdateUserRequest {
    /// Validates the submitted fields. Self-service edits cannot touch the flags.
    async fn into_update(self, as_admin: bool) -> Result<UpdateUserData> {
        if !as_admin && (self.is_premium.is_some() || self.is_admin.is_some()) {
            return Err(AppError::Forbidden);
        }

        let username = self.username.as_deref().map(validate_username).transpose()?;
        let email = self.email.as_deref().map(validate_email).transpose()?;

        let password_hash = match self.password.filter(|p| !p.is_empty()) {
            Some(password) => {
                validate_password(&password)?;
                Some(hash_password_async(password).await?)
            }
            None => None,
        };

        Ok(UpdateUserData {
            username,
            email,
            password_hash,
            is_premium: self.is_premium,
            is_admin: self.is_admin,
        })
    }
}

async fn list_users(State(state): State<AppState>, session: Session) -> Result<Json<Vec<UserDetail>>> {
    require_admin(&state.pool, &session).await?;
    Ok(Json(UserDetail::list(&state.pool).await?))
}

async fn get_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<UserDetail>> {
    let caller = current_user(&state.pool, &session).await?;
    ensure_owner_or_admin(&caller, id)?;

    let user = UserDetail::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

async fn create_user(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    require_admin(&state.pool, &session).await?;

    let username = validate_username(&body.username)?;
    let email = validate_email(&body.email)?;
    validate_password(&body.password)?;

    if UserDetail::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let user = UserDetail::create(
        &state.pool,
        CreateUserData {
            username,
            email,
            password_hash: hash_password_async(body.password).await?,
            is_premium: body.is_premium,
            is_admin: body.is_admin,
        },
    )
    .await?;

    tracing::info!(user_id = user.user_id, "User created by admin");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserDetail>> {
    let caller = current_user(&state.pool, &session).await?;
    ensure_owner_or_admin(&caller, id)?;

    let update = body.into_update(caller.is_admin).await?;

    if let Some(email) = &update.email {
        let taken = UserDetail::find_by_email(&state.pool, email)
            .await?
            .is_some_and(|other| other.user_id != id);
        if taken {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }
    }

    let user = UserDetail::update(&state.pool, id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let admin = require_admin(&state.pool, &session).await?;
    if admin.user_id == id {
        return Err(AppError::Validation(
            "You cannot delete your own account".to_string(),
        ));
    }

    if !UserDetail::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_self_service_cannot_set_flags() {
        let request = UpdateUserRequest {
            is_premium: Some(true),
            ..Default::default()
        };
        assert!(matches!(request.into_update(false).await, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_admin_update_keeps_flags() {
        let request = UpdateUserRequest {
            username: Some(" sam ".to_string()),
            is_admin: Some(true),
            ..Default::default()
        };

        let update = request.into_update(true).await.unwrap();
        assert_eq!(update.username.as_deref(), Some("sam"));
        assert_eq!(update.is_admin, Some(true));
        assert!(update.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let request = UpdateUserRequest {
            password: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(matches!(request.into_update(false).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_empty_password_means_unchanged() {
        let request = UpdateUserRequest {
            password: Some(String::new()),
            ..Default::default()
        };
        assert!(request.into_update(false).await.unwrap().password_hash.is_none());
    }
}
