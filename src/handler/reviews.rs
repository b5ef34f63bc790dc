use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{jobdb::JobExt, messagedb::MessageExt, userdb::UserExt},
    dtos::{
        messagedtos::{ContractorReviewsDto, CreateReviewDto},
        userdtos::FilterUserDto,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::{jobmodel::JobStatus, usermodel::UserRole},
    AppState,
};

pub fn reviews_handler() -> Router {
    Router::new().route("/", post(create_review))
}

/// Public: contractor profiles and their reviews are browsable without a
/// token.
pub fn contractors_handler() -> Router {
    Router::new()
        .route("/:contractor_id", get(get_contractor_profile))
        .route("/:contractor_id/reviews", get(get_contractor_reviews))
}

/// A homeowner reviews the contractor after their job completed. One review
/// per job.
pub async fn create_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    let job = app_state
        .db_client
        .get_job_by_id(body.job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Job not found".to_string()))?;

    if job.homeowner_id != user.user.id {
        return Err(HttpError::forbidden("Not your job".to_string()));
    }
    if job.status != JobStatus::Completed {
        return Err(HttpError::bad_request(
            "Job must be completed before reviewing".to_string(),
        ));
    }
    if job.awarded_contractor_id != Some(body.contractor_id) {
        return Err(HttpError::bad_request(
            "Contractor did not work on this job".to_string(),
        ));
    }

    let existing = app_state
        .db_client
        .find_review(body.job_id, user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;
    if existing.is_some() {
        return Err(HttpError::bad_request(
            "You already reviewed this job".to_string(),
        ));
    }

    let review = app_state
        .db_client
        .create_review(
            user.user.id,
            user.user.full_name.clone(),
            body.contractor_id,
            body.job_id,
            body.rating,
            body.comment,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "review": review }
    })))
}

pub async fn get_contractor_profile(
    Path(contractor_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let contractor = app_state
        .db_client
        .get_user(Some(contractor_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Contractor not found".to_string()))?;

    if contractor.role != UserRole::Contractor {
        return Err(HttpError::not_found("Contractor not found".to_string()));
    }

    let completed_jobs = app_state
        .db_client
        .count_completed_jobs_for_contractor(contractor_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let reviews = app_state
        .db_client
        .get_reviews_for_contractor(contractor_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total_reviews = reviews.len() as i64;
    let average_rating = if reviews.is_empty() {
        0.0
    } else {
        reviews.iter().map(|r| r.rating as f64).sum::<f64>() / reviews.len() as f64
    };

    Ok(Json(json!({
        "status": "success",
        "data": {
            "contractor": FilterUserDto::filter_user(&contractor),
            "completed_jobs": completed_jobs,
            "average_rating": average_rating,
            "total_reviews": total_reviews,
        }
    })))
}

pub async fn get_contractor_reviews(
    Path(contractor_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state
        .db_client
        .get_reviews_for_contractor(contractor_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total_reviews = reviews.len() as i64;
    let average_rating = if reviews.is_empty() {
        0.0
    } else {
        reviews.iter().map(|r| r.rating as f64).sum::<f64>() / reviews.len() as f64
    };

    Ok(Json(json!({
        "status": "success",
        "data": ContractorReviewsDto {
            reviews,
            average_rating,
            total_reviews,
        }
    })))
}
