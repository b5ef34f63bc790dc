use std::sync::Arc;

use axum::{
    extract::Path,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;
use validator::Validate;

use crate::{
    db::paymentdb::PaymentExt,
    dtos::jobdtos::{
        EscrowPaymentRequestDto, EscrowSessionResponseDto, PaymentReleaseRequestDto,
        PaymentReleaseResponseDto, PaymentStatusResponseDto,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::usermodel::UserRole,
    AppState,
};

pub fn payments_handler() -> Router {
    Router::new()
        .route("/escrow/create", post(create_escrow_payment))
        .route("/status/:session_id", get(get_payment_status))
        .route("/release", post(release_payment))
}

pub fn payment_webhook_handler() -> Router {
    Router::new().route("/webhook", post(payment_webhook))
}

pub async fn create_escrow_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<EscrowPaymentRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    if user.user.role != UserRole::Homeowner {
        return Err(HttpError::forbidden(
            "Only homeowners can fund escrow".to_string(),
        ));
    }

    let (checkout_url, session_id) = app_state
        .escrow_service
        .create_escrow_session(body.job_id, &user.user, &body.origin_url)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": EscrowSessionResponseDto { checkout_url, session_id }
    })))
}

/// Polled by the frontend after checkout redirect. Confirms the payment if
/// the provider says it went through; shares its idempotent core with the
/// webhook path.
pub async fn get_payment_status(
    Path(session_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    // Authorize against the stored transaction before touching provider or
    // job state; only the payer or an admin may poll.
    let transaction = app_state
        .db_client
        .get_transaction_by_session(&session_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Payment session not found".to_string()))?;

    if transaction.payer_id != user.user.id && user.user.role != UserRole::Admin {
        return Err(HttpError::forbidden("Not your payment".to_string()));
    }

    let confirmation = app_state.escrow_service.confirm_payment(&session_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": PaymentStatusResponseDto {
            status: confirmation.status,
            job_id: confirmation.job_id,
        }
    })))
}

pub async fn release_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<PaymentReleaseRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    let payout = app_state
        .escrow_service
        .release_payment(body.job_id, &user.user)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": PaymentReleaseResponseDto {
            message: "Payment released to contractor".to_string(),
            escrow_amount: payout.escrow_amount,
            platform_fee: payout.platform_fee,
            contractor_payout: payout.contractor_payout,
        }
    })))
}

/// Provider webhook. Signature failures are rejected; everything after a
/// valid signature is acknowledged with 200 so the provider stops retrying,
/// with failures left to the polling path to repair.
pub async fn payment_webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, HttpError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| HttpError::bad_request("Missing signature header".to_string()))?;

    let event = app_state
        .payment_provider
        .verify_webhook(body.as_bytes(), signature)?;

    if let Err(e) = app_state.escrow_service.handle_webhook_event(&event).await {
        tracing::error!("webhook processing failed: {}", e);
    }

    Ok(Json(json!({ "received": true })))
}
