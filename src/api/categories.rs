use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::middleware::auth::require_admin;
use crate::api::middleware::session::AppState;
use crate::error::{AppError, Result};
use crate::models::category::{CategoryData, TemplateCategory};

const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=60;
const DESCRIPTION_LEN: std::ops::RangeInclusive<usize> = 5..=500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub category_name: String,
    #[serde(default)]
    pub category_description: Option<String>,
}

impl CategoryRequest {
    fn validate(self) -> Result<CategoryData> {
        let name = self.category_name.trim().to_string();
        if !NAME_LEN.contains(&name.chars().count()) {
            return Err(AppError::Validation(format!(
                "Category name must be between {} and {} characters",
                NAME_LEN.start(),
                NAME_LEN.end()
            )));
        }

        let description = self
            .category_description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(description) = &description {
            if !DESCRIPTION_LEN.contains(&description.chars().count()) {
                return Err(AppError::Validation(format!(
                    "Description must be between {} and {} characters",
                    DESCRIPTION_LEN.start(),
                    DESCRIPTION_LEN.end()
                )));
            }
        }

        Ok(CategoryData {
            category_name: name,
            category_description: description,
        })
    }
}

fn duplicate_name() -> AppError {
    AppError::Conflict("A category with this name already exists".to_string())
}

fn not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<TemplateCategory>>> {
    Ok(Json(TemplateCategory::list(&state.pool).await?))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TemplateCategory>> {
    let category = TemplateCategory::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(category))
}

async fn create_category(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CategoryRequest>,
) -> Result<impl IntoResponse> {
    require_admin(&state.pool, &session).await?;
    let data = body.validate()?;

    if TemplateCategory::name_taken(&state.pool, &data.category_name, None).await? {
        return Err(duplicate_name());
    }

    let category = TemplateCategory::create(&state.pool, data).await?;
    tracing::info!(category_id = category.category_id, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Json(body): Json<CategoryRequest>,
) -> Result<StatusCode> {
    require_admin(&state.pool, &session).await?;
    let data = body.validate()?;

    if TemplateCategory::name_taken(&state.pool, &data.category_name, Some(id)).await? {
        return Err(duplicate_name());
    }

    TemplateCategory::update(&state.pool, id, data)
        .await?
        .ok_or_else(not_found)?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_category(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    require_admin(&state.pool, &session).await?;

    let templates = TemplateCategory::template_count(&state.pool, id).await?;
    if templates > 0 {
        return Err(AppError::Conflict(format!(
            "Category still has {templates} template(s)"
        )));
    }

    if !TemplateCategory::delete(&state.pool, id).await? {
        return Err(not_found());
    }

    tracing::info!(category_id = id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, description: Option<&str>) -> CategoryRequest {
        CategoryRequest {
            category_name: name.to_string(),
            category_description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_valid_category_is_trimmed() {
        let data = request("  Corporate ", Some(" Clean business looks ")).validate().unwrap();
        assert_eq!(data.category_name, "Corporate");
        assert_eq!(data.category_description.as_deref(), Some("Clean business looks"));
    }

    #[test]
    fn test_name_length() {
        assert!(matches!(request("A", None).validate(), Err(AppError::Validation(_))));
        assert!(request(&"a".repeat(60), None).validate().is_ok());
        assert!(matches!(
            request(&"a".repeat(61), None).validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_description_length() {
        assert!(matches!(
            request("Modern", Some("tiny")).validate(),
            Err(AppError::Validation(_))
        ));
        let data = request("Modern", Some("   ")).validate().unwrap();
        assert!(data.category_description.is_none());
    }
}
