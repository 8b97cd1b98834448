use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::middleware::auth::current_user;
use crate::api::middleware::session::{AppState, SESSION_KEY_USER_ID};
use crate::error::{AppError, Result};
use crate::models::user::{CreateUserData, UserDetail};
use crate::services::accounts::{validate_email, validate_password, validate_username};
use crate::services::password::{hash_password_async, verify_password_async};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Creates a free account and logs it in
async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
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
            is_premium: false,
            is_admin: false,
        },
    )
    .await?;

    start_session(&session, user.user_id).await?;
    tracing::info!(user_id = user.user_id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<UserDetail>> {
    let user = UserDetail::find_by_email(&state.pool, body.email.trim()).await?;

    let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
    if !verify_password_async(stored_hash, body.password).await? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }
    let user = user.ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    start_session(&session, user.user_id).await?;
    tracing::info!(user_id = user.user_id, "User logged in");

    Ok(Json(user))
}

async fn logout(session: Session) -> Result<StatusCode> {
    session.flush().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(State(state): State<AppState>, session: Session) -> Result<Json<UserDetail>> {
    Ok(Json(current_user(&state.pool, &session).await?))
}

/// Binds the session to a user under a fresh session id
async fn start_session(session: &Session, user_id: i32) -> Result<()> {
    session.cycle_id().await?;
    session.insert(SESSION_KEY_USER_ID, user_id).await?;
    Ok(())
}

/// Creates the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}
