use axum::{extract::State, routing::get, Json, Router};
use tower_sessions::Session;

use crate::api::middleware::auth::require_admin;
use crate::api::middleware::session::AppState;
use crate::error::Result;
use crate::services::dashboard::{self, Activity, DashboardStats};

async fn stats(State(state): State<AppState>, session: Session) -> Result<Json<DashboardStats>> {
    require_admin(&state.pool, &session).await?;
    Ok(Json(dashboard::stats(&state.pool).await?))
}

async fn activity(State(state): State<AppState>, session: Session) -> Result<Json<Vec<Activity>>> {
    require_admin(&state.pool, &session).await?;
    Ok(Json(dashboard::recent_activity(&state.pool).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/stats", get(stats))
        .route("/api/dashboard/activity", get(activity))
}
