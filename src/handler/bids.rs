use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{jobdb::JobExt, userdb::UserExt},
    dtos::{
        jobdtos::{BidWithContractorDto, CreateBidDto, MyBidDto},
        userdtos::ContractorVerificationDto,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::usermodel::UserRole,
    service::escrow_service::check_bid_submission,
    AppState,
};

/// Mounted under /jobs alongside the job routes.
pub fn job_bids_handler() -> Router {
    Router::new().route("/:job_id/bids", post(create_bid).get(get_bids_for_job))
}

pub fn bids_handler() -> Router {
    Router::new()
        .route("/my-bids", get(get_my_bids))
        .route("/:bid_id/accept", put(accept_bid))
}

pub async fn create_bid(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateBidDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    let job = app_state
        .db_client
        .get_job_by_id(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Job not found".to_string()))?;

    let existing = app_state
        .db_client
        .find_bid(job_id, user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    check_bid_submission(&job, &user.user, existing.as_ref())?;

    let bid = app_state
        .db_client
        .create_bid(
            job_id,
            user.user.id,
            user.user.full_name.clone(),
            body.amount,
            body.message,
            body.estimated_days,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(job_id = %job_id, contractor_id = %user.user.id, amount = bid.amount, "bid submitted");

    Ok(Json(json!({
        "status": "success",
        "message": "Bid submitted",
        "data": { "bid": bid }
    })))
}

/// Owner view of a job's bids, with each contractor's verification details
/// attached so the homeowner can compare credentials.
pub async fn get_bids_for_job(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .db_client
        .get_job_by_id(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Job not found".to_string()))?;

    // The owner, an admin, or a contractor who bid on the job may look.
    if job.homeowner_id != user.user.id && user.user.role != UserRole::Admin {
        let own_bid = app_state
            .db_client
            .find_bid(job_id, user.user.id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;
        if own_bid.is_none() {
            return Err(HttpError::forbidden("Not your job".to_string()));
        }
    }

    let bids = app_state
        .db_client
        .get_bids_for_job(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let mut results = Vec::with_capacity(bids.len());
    for bid in bids {
        let contractor = app_state
            .db_client
            .get_user(Some(bid.contractor_id), None)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        let (contractor_verified, contractor_verification) = match contractor {
            Some(c) => (
                c.verified,
                Some(ContractorVerificationDto {
                    license_number: c.license_number,
                    insurance_info: c.insurance_info,
                    company_name: c.company_name,
                    years_experience: c.years_experience,
                    specialties: c.specialties,
                }),
            ),
            None => (false, None),
        };

        results.push(BidWithContractorDto {
            bid,
            contractor_verified,
            contractor_verification,
        });
    }

    Ok(Json(json!({
        "status": "success",
        "data": { "bids": results }
    })))
}

pub async fn get_my_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    if user.user.role != UserRole::Contractor {
        return Err(HttpError::forbidden("Only contractors have bids".to_string()));
    }

    let bids = app_state
        .db_client
        .get_bids_by_contractor(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let mut results = Vec::with_capacity(bids.len());
    for bid in bids {
        let job = app_state
            .db_client
            .get_job_by_id(bid.job_id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        let (job_title, job_status, job_location) = match job {
            Some(j) => (
                Some(j.title),
                Some(j.status.to_str().to_string()),
                Some(j.location),
            ),
            None => (None, None, None),
        };

        results.push(MyBidDto {
            bid,
            job_title,
            job_status,
            job_location,
        });
    }

    Ok(Json(json!({
        "status": "success",
        "data": { "bids": results }
    })))
}

/// Homeowner accepts a bid. Escrow must already be funded; siblings are
/// rejected and the job moves to awarded in one shot.
pub async fn accept_bid(
    Path(bid_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .escrow_service
        .accept_bid(bid_id, &user.user)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Bid accepted",
        "data": { "job": job }
    })))
}
