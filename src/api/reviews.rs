use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::middleware::auth::{current_user, ensure_owner_or_admin};
use crate::api::middleware::session::AppState;
use crate::error::{AppError, Result};
use crate::models::review::{CreateReviewData, Review};
use crate::models::CardTemplate;

const MAX_COMMENT_LEN: usize = 1000;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub template_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub template_id: i32,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Checks the rating and normalizes the comment (blank becomes `None`)
fn validate_review(rating: i32, comment: Option<String>) -> Result<Option<String>> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation("Rating must be between 1 and 5".to_string()));
    }

    let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    if comment
        .as_ref()
        .is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN)
    {
        return Err(AppError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_LEN} characters"
        )));
    }

    Ok(comment)
}

fn not_found() -> AppError {
    AppError::NotFound("Review not found".to_string())
}

async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<Vec<Review>>> {
    Ok(Json(Review::list(&state.pool, query.template_id).await?))
}

async fn get_review(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Review>> {
    let review = Review::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(review))
}

async fn create_review(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse> {
    let user = current_user(&state.pool, &session).await?;
    let comment = validate_review(body.rating, body.comment)?;

    if CardTemplate::find_by_id(&state.pool, body.template_id)
        .await?
        .is_none()
    {
        return Err(AppError::Validation("Template does not exist".to_string()));
    }

    let review = Review::create(
        &state.pool,
        CreateReviewData {
            user_id: user.user_id,
            template_id: body.template_id,
            rating: body.rating,
            comment,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// Loads a review the caller may modify
async fn owned_review(state: &AppState, session: &Session, id: i32) -> Result<Review> {
    let caller = current_user(&state.pool, session).await?;
    let review = Review::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    ensure_owner_or_admin(&caller, review.user_id)?;
    Ok(review)
}

async fn update_review(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Json(body): Json<UpdateReviewRequest>,
) -> Result<StatusCode> {
    owned_review(&state, &session, id).await?;
    let comment = validate_review(body.rating, body.comment)?;

    if !Review::update(&state.pool, id, body.rating, comment).await? {
        return Err(not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_review(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    owned_review(&state, &session, id).await?;

    if !Review::delete(&state.pool, id).await? {
        return Err(not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reviews", get(list_reviews).post(create_review))
        .route(
            "/api/reviews/:id",
            get(get_review).put(update_review).delete(delete_review),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(validate_review(0, None).is_err());
        assert!(validate_review(6, None).is_err());
        assert!(validate_review(1, None).is_ok());
        assert!(validate_review(5, None).is_ok());
    }

    #[test]
    fn test_comment_normalization() {
        assert_eq!(validate_review(4, Some("   ".to_string())).unwrap(), None);
        assert_eq!(
            validate_review(4, Some(" Lovely ".to_string())).unwrap().as_deref(),
            Some("Lovely")
        );
        assert!(validate_review(4, Some("x".repeat(1001))).is_err());
    }
}
