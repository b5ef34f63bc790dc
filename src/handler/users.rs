use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde_json::json;
use validator::Validate;

use crate::{
    db::{jobdb::JobExt, paymentdb::PaymentExt, userdb::UserExt},
    dtos::userdtos::{ApiResponse, ContractorVerificationDto, FilterUserDto, UpdateProfileDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::{
        jobmodel::{BidStatus, JobStatus},
        usermodel::{User, UserRole},
    },
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me))
        .route("/profile", put(update_profile))
        .route("/contractor-verification", put(submit_contractor_verification))
        .route("/dashboard", get(get_dashboard))
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(json!({
        "status": "success",
        "data": { "user": FilterUserDto::filter_user(&user.user) }
    })))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    let updated = app_state
        .db_client
        .update_user_profile(user.user.id, body.full_name, body.phone)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Profile updated",
        FilterUserDto::filter_user(&updated),
    )))
}

/// Contractors submit license and insurance details; both present marks the
/// account verified.
pub async fn submit_contractor_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<ContractorVerificationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    if user.user.role != UserRole::Contractor {
        return Err(HttpError::forbidden(
            "Only contractors can submit verification details".to_string(),
        ));
    }

    let verified = User::derive_verified(
        body.license_number.as_deref(),
        body.insurance_info.as_deref(),
    );

    let updated = app_state
        .db_client
        .update_contractor_verification(
            user.user.id,
            body.license_number,
            body.insurance_info,
            body.company_name,
            body.years_experience,
            body.specialties,
            verified,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Verification details saved",
        FilterUserDto::filter_user(&updated),
    )))
}

/// Role-shaped dashboard stats: homeowners see jobs and spend, contractors
/// see bids, wins and earnings.
pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    match user.user.role {
        UserRole::Homeowner => {
            let active_jobs = app_state
                .db_client
                .count_jobs_by_homeowner_and_statuses(
                    user.user.id,
                    &[JobStatus::Open, JobStatus::InEscrow, JobStatus::Awarded],
                )
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?;

            let completed_jobs = app_state
                .db_client
                .count_jobs_by_homeowner_and_statuses(user.user.id, &[JobStatus::Completed])
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?;

            let total_spent = app_state
                .db_client
                .total_spent_by_homeowner(user.user.id)
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?;

            Ok(Json(json!({
                "status": "success",
                "data": {
                    "user_type": "homeowner",
                    "active_jobs": active_jobs,
                    "completed_jobs": completed_jobs,
                    "total_spent": total_spent,
                }
            })))
        }
        UserRole::Contractor => {
            let active_bids = app_state
                .db_client
                .count_bids_by_contractor_and_status(user.user.id, Some(BidStatus::Pending))
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?;

            let won_jobs = app_state
                .db_client
                .count_completed_jobs_for_contractor(user.user.id)
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?;

            let total_earnings = app_state
                .db_client
                .total_earnings_for_contractor(user.user.id)
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?;

            Ok(Json(json!({
                "status": "success",
                "data": {
                    "user_type": "contractor",
                    "active_bids": active_bids,
                    "won_jobs": won_jobs,
                    "total_earnings": total_earnings,
                }
            })))
        }
        UserRole::Admin => Ok(Json(json!({
            "status": "success",
            "data": { "user_type": "admin" }
        }))),
    }
}
