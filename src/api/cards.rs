use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::middleware::auth::current_user;
use crate::api::middleware::session::AppState;
use crate::error::{AppError, Result};
use crate::models::CardTemplate;
use crate::services::card_design::{CardDesign, CardStyle};
use crate::services::card_export::export_card;
use crate::services::card_preview::render_svg;
use crate::services::entitlement::{denied_features, premium_features, PremiumFeature};

pub const PREMIUM_FEATURES_HEADER: HeaderName = HeaderName::from_static("x-premium-features");

/// Room for the rest of the JSON body next to an inline background
const JSON_ENVELOPE_BYTES: usize = 64 * 1024;

/// Largest card request body: a base64 data URL of `max_background_bytes`
/// plus the design fields around it
pub fn request_body_limit(max_background_bytes: u64) -> usize {
    let encoded = max_background_bytes.div_ceil(3).saturating_mul(4);
    usize::try_from(encoded)
        .unwrap_or(usize::MAX)
        .saturating_add(JSON_ENVELOPE_BYTES)
}

fn default_apply_template() -> bool {
    true
}

/// A card design plus the style and template it was built from
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRequest {
    #[serde(default)]
    pub design: CardDesign,
    #[serde(default)]
    pub style: CardStyle,
    pub template_id: Option<i32>,
    /// Set to false once the customer has edited the template's colors
    #[serde(default = "default_apply_template")]
    pub apply_template: bool,
}

/// Design with its template resolved, and the premium features it uses
struct ResolvedCard {
    design: CardDesign,
    features: Vec<PremiumFeature>,
}

async fn resolve(state: &AppState, request: CardRequest) -> Result<ResolvedCard> {
    let CardRequest {
        mut design,
        style,
        template_id,
        apply_template,
    } = request;

    let template = match template_id {
        Some(id) => Some(
            CardTemplate::find_by_id(&state.pool, id)
                .await?
                .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?,
        ),
        None => None,
    };

    if let (Some(template), true) = (&template, apply_template) {
        design.apply_template(template);
    }

    let features = premium_features(style, template.as_ref(), &design);
    Ok(ResolvedCard { design, features })
}

fn feature_list(features: &[PremiumFeature]) -> String {
    features
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Live SVG preview. Open to everyone, premium features included.
async fn preview(State(state): State<AppState>, Json(body): Json<CardRequest>) -> Result<Response> {
    let card = resolve(&state, body).await?;
    let colors = card.design.validate()?;
    let svg = render_svg(&card.design, colors);

    let features = HeaderValue::from_str(&feature_list(&card.features))
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/svg+xml")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
            (PREMIUM_FEATURES_HEADER, features),
        ],
        svg,
    )
        .into_response())
}

/// Print-ready PDF download. Designs using premium features need a premium account.
async fn export(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CardRequest>,
) -> Result<Response> {
    let user = current_user(&state.pool, &session).await?;
    let card = resolve(&state, body).await?;

    let denied = denied_features(user.is_premium, &card.features);
    if !denied.is_empty() {
        tracing::info!(
            user_id = user.user_id,
            features = %feature_list(&denied),
            "Export refused for free account"
        );
        return Err(AppError::PremiumRequired(
            denied.iter().map(|f| f.as_str().to_string()).collect(),
        ));
    }

    let export = export_card(&state.backgrounds, &card.design).await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        export.filename
    ))
    .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.pdf,
    )
        .into_response())
}

pub fn router(max_background_bytes: u64) -> Router<AppState> {
    Router::new()
        .route("/api/cards/preview", post(preview))
        .route("/api/cards/export", post(export))
        .layer(DefaultBodyLimit::max(request_body_limit(max_background_bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_app;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_preview_free_design() {
        let response = test_app()
            .oneshot(json_request(
                "/api/cards/preview",
                serde_json::json!({ "design": { "businessName": "Acme" } }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
        assert_eq!(response.headers()[PREMIUM_FEATURES_HEADER], "");

        let svg = body_text(response).await;
        assert!(svg.contains(">Acme</text>"));
        assert!(svg.contains(">Your Title</text>"));
    }

    #[tokio::test]
    async fn test_preview_reports_premium_features() {
        let response = test_app()
            .oneshot(json_request(
                "/api/cards/preview",
                serde_json::json!({
                    "style": "luxury",
                    "design": { "backgroundColor": "#111827" }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[PREMIUM_FEATURES_HEADER],
            "luxury_style,custom_background_color"
        );
    }

    #[tokio::test]
    async fn test_preview_rejects_invalid_color() {
        let response = test_app()
            .oneshot(json_request(
                "/api/cards/preview",
                serde_json::json!({ "design": { "textColor": "white" } }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "validation");
    }

    #[tokio::test]
    async fn test_export_requires_login() {
        let response = test_app()
            .oneshot(json_request(
                "/api/cards/export",
                serde_json::json!({ "design": {} }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_preview_accepts_large_inline_background() {
        let payload = "A".repeat(3 * 1024 * 1024);
        let response = test_app()
            .oneshot(json_request(
                "/api/cards/preview",
                serde_json::json!({
                    "design": { "backgroundImage": format!("data:image/png;base64,{payload}") }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_request_body_limit_fits_largest_background() {
        let max = 5 * 1024 * 1024;
        let limit = request_body_limit(max);

        assert!(limit >= (max as usize).div_ceil(3) * 4 + "data:image/jpeg;base64,".len());
        assert!(limit > 2 * 1024 * 1024);
    }

    #[test]
    fn test_request_defaults() {
        let request: CardRequest = serde_json::from_str("{}").unwrap();

        assert_eq!(request.style, CardStyle::Basic);
        assert!(request.apply_template);
        assert!(request.template_id.is_none());
        assert_eq!(request.design, CardDesign::default());
    }
}
