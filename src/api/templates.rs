use axum::{
    extract::{Path, Query, State},
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
use crate::models::template::{CardTemplate, TemplateData, TemplateFilter};
use crate::models::TemplateCategory;
use crate::services::background::BackgroundSource;
use crate::services::card_design::CardDesign;

// Column width in card_templates
const MAX_TITLE_LEN: usize = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuery {
    pub premium: Option<bool>,
    pub category_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    pub category_id: i32,
    pub title: String,
    #[serde(default)]
    pub card_template_description: Option<String>,
    pub file_path: String,
    #[serde(default)]
    pub is_premium: bool,
}

impl TemplateRequest {
    fn validate(self) -> Result<TemplateData> {
        let title = self.title.trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "Title is required and must be at most {MAX_TITLE_LEN} characters"
            )));
        }

        let file_path = self.file_path.trim().to_string();
        BackgroundSource::classify(&file_path)
            .map_err(|_| AppError::Validation("File path is not a usable image location".to_string()))?;

        Ok(TemplateData {
            category_id: self.category_id,
            title,
            card_template_description: self
                .card_template_description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            file_path,
            is_premium: self.is_premium,
        })
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Template not found".to_string())
}

async fn ensure_category_exists(state: &AppState, category_id: i32) -> Result<()> {
    if TemplateCategory::find_by_id(&state.pool, category_id).await?.is_none() {
        return Err(AppError::Validation("Category does not exist".to_string()));
    }
    Ok(())
}

async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> Result<Json<Vec<CardTemplate>>> {
    let filter = TemplateFilter {
        premium: query.premium,
        category_id: query.category_id,
    };
    Ok(Json(CardTemplate::list(&state.pool, filter).await?))
}

async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CardTemplate>> {
    let template = CardTemplate::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(template))
}

/// Starting design for a template: default text fields with the template's
/// colors and background applied
async fn template_design(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CardDesign>> {
    let template = CardTemplate::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;

    let mut design = CardDesign::default();
    design.apply_template(&template);
    Ok(Json(design))
}

async fn create_template(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<TemplateRequest>,
) -> Result<impl IntoResponse> {
    require_admin(&state.pool, &session).await?;
    let data = body.validate()?;
    ensure_category_exists(&state, data.category_id).await?;

    let template = CardTemplate::create(&state.pool, data).await?;
    tracing::info!(template_id = template.template_id, "Template created");

    Ok((StatusCode::CREATED, Json(template)))
}

async fn update_template(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Json(body): Json<TemplateRequest>,
) -> Result<StatusCode> {
    require_admin(&state.pool, &session).await?;
    let data = body.validate()?;
    ensure_category_exists(&state, data.category_id).await?;

    if !CardTemplate::update(&state.pool, id, data).await? {
        return Err(not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_template(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    require_admin(&state.pool, &session).await?;

    if !CardTemplate::delete(&state.pool, id).await? {
        return Err(not_found());
    }

    tracing::info!(template_id = id, "Template deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/templates", get(list_templates).post(create_template))
        .route(
            "/api/templates/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/api/templates/:id/design", get(template_design))
}
