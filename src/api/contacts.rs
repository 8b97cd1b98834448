use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::middleware::auth::{optional_current_user_id, require_admin};
use crate::api::middleware::session::AppState;
use crate::error::{AppError, Result};
use crate::models::contact::{ContactData, ContactMessage, ContactWithUser};
use crate::services::card_design::is_plausible_email;

// Column widths in contact_messages
const MAX_NAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 80;
const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactRequest {
    fn validate(self) -> Result<ContactData> {
        let name = self.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::Validation(format!(
                "Name is required and must be at most {MAX_NAME_LEN} characters"
            )));
        }

        let email = self.email.trim().to_string();
        if email.chars().count() > MAX_EMAIL_LEN || !is_plausible_email(&email) {
            return Err(AppError::Validation("A valid email address is required".to_string()));
        }

        let message = self.message.trim().to_string();
        if message.is_empty() || message.chars().count() > MAX_MESSAGE_LEN {
            return Err(AppError::Validation(format!(
                "Message is required and must be at most {MAX_MESSAGE_LEN} characters"
            )));
        }

        Ok(ContactData {
            name,
            email,
            message,
        })
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Contact message not found".to_string())
}

/// Public contact form; linked to the account when someone is logged in
async fn create_contact(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ContactRequest>,
) -> Result<impl IntoResponse> {
    let data = body.validate()?;
    let user_id = optional_current_user_id(&state.pool, &session).await?;

    let contact = ContactMessage::create(&state.pool, user_id, data).await?;
    tracing::info!(contact_id = contact.contact_id, "Contact message received");

    Ok((StatusCode::CREATED, Json(contact)))
}

async fn list_contacts(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<ContactWithUser>>> {
    require_admin(&state.pool, &session).await?;
    Ok(Json(ContactMessage::list_with_users(&state.pool).await?))
}

async fn get_contact(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ContactMessage>> {
    require_admin(&state.pool, &session).await?;
    let contact = ContactMessage::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(contact))
}

async fn update_contact(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Json(body): Json<ContactRequest>,
) -> Result<StatusCode> {
    require_admin(&state.pool, &session).await?;
    let data = body.validate()?;

    if !ContactMessage::update(&state.pool, id, data).await? {
        return Err(not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_contact(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    require_admin(&state.pool, &session).await?;

    if !ContactMessage::delete(&state.pool, id).await? {
        return Err(not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route(
            "/api/contacts/:id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, message: &str) -> ContactRequest {
        ContactRequest {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_valid_contact() {
        let data = request(" Ana ", "ana@example.com", " Do you ship abroad? ")
            .validate()
            .unwrap();
        assert_eq!(data.name, "Ana");
        assert_eq!(data.message, "Do you ship abroad?");
    }

    #[test]
    fn test_invalid_contacts() {
        assert!(request("", "ana@example.com", "Hi").validate().is_err());
        assert!(request("Ana", "ana", "Hi").validate().is_err());
        assert!(request("Ana", "ana@example.com", "  ").validate().is_err());
        assert!(request(&"a".repeat(51), "ana@example.com", "Hi").validate().is_err());
    }
}
