use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::middleware::auth::{current_user, ensure_owner_or_admin, require_admin};
use crate::api::middleware::session::AppState;
use crate::error::{AppError, Result};
use crate::models::payment::{Payment, PaymentWithUser};
use crate::models::UserDetail;
use crate::services::upgrade::{parse_expiry, upgrade_to_premium, PaymentForm};

#[derive(Debug, Serialize)]
pub struct UpgradeResponse {
    pub payment: Payment,
    pub user: UserDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub amount: f64,
    pub card_expiry_date: String,
}

impl UpdatePaymentRequest {
    /// Amount and a trimmed `MM/YY` expiry
    fn validate(&self) -> Result<(f64, &str)> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(AppError::Validation(
                "Amount must be a non-negative number".to_string(),
            ));
        }

        let expiry = self.card_expiry_date.trim();
        parse_expiry(expiry)?;
        Ok((self.amount, expiry))
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Payment not found".to_string())
}

/// Charges the premium price and upgrades the caller
async fn create_payment(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<PaymentForm>,
) -> Result<impl IntoResponse> {
    let user = current_user(&state.pool, &session).await?;

    let result = upgrade_to_premium(
        &state.pool,
        &state.cipher,
        user.user_id,
        state.config.premium_price,
        &form,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UpgradeResponse {
            payment: result.payment,
            user: result.user,
        }),
    ))
}

async fn list_payments(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<PaymentWithUser>>> {
    require_admin(&state.pool, &session).await?;
    Ok(Json(Payment::list_with_users(&state.pool).await?))
}

async fn my_payments(State(state): State<AppState>, session: Session) -> Result<Json<Vec<Payment>>> {
    let user = current_user(&state.pool, &session).await?;
    Ok(Json(Payment::list_by_user(&state.pool, user.user_id).await?))
}

async fn get_payment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<Payment>> {
    let caller = current_user(&state.pool, &session).await?;
    let payment = Payment::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;

    // Hide other users' payments behind 404
    if ensure_owner_or_admin(&caller, payment.user_id).is_err() {
        return Err(not_found());
    }

    Ok(Json(payment))
}

async fn update_payment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Json(body): Json<UpdatePaymentRequest>,
) -> Result<StatusCode> {
    require_admin(&state.pool, &session).await?;

    let (amount, expiry) = body.validate()?;

    if !Payment::update(&state.pool, id, amount, expiry).await? {
        return Err(not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_payment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    require_admin(&state.pool, &session).await?;

    if !Payment::delete(&state.pool, id).await? {
        return Err(not_found());
    }

    tracing::info!(payment_id = id, "Payment deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments", get(list_payments).post(create_payment))
        .route("/api/payments/mine", get(my_payments))
        .route(
            "/api/payments/:id",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
}
