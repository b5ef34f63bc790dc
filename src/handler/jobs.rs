use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::jobdb::JobExt,
    dtos::jobdtos::{CreateJobDto, JobResponseDto, JobSearchQueryDto, UpdateJobDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::{jobmodel::JobStatus, usermodel::UserRole},
    AppState,
};

pub const JOB_CATEGORIES: &[&str] = &[
    "Kitchen Renovation",
    "Bathroom Renovation",
    "Basement Finishing",
    "Roofing",
    "Flooring",
    "Painting",
    "Plumbing",
    "Electrical",
    "Landscaping",
    "General Contracting",
];

pub const SERVICE_LOCATIONS: &[&str] = &[
    "Toronto",
    "Mississauga",
    "Brampton",
    "Vaughan",
    "Markham",
    "Richmond Hill",
    "Oakville",
    "Burlington",
    "Hamilton",
    "Ottawa",
];

/// Routes that need no token: browsing the marketplace.
pub fn public_jobs_handler() -> Router {
    Router::new()
        .route("/", get(search_jobs))
        .route("/categories", get(get_categories))
        .route("/locations", get(get_locations))
        .route("/:job_id", get(get_job))
}

/// Routes behind auth: everything that writes.
pub fn jobs_handler() -> Router {
    Router::new()
        .route("/create", post(create_job))
        .route("/my-jobs", get(get_my_jobs))
        .route("/update/:job_id", put(update_job))
        .route("/delete/:job_id", delete(delete_job))
}

pub async fn get_categories() -> impl IntoResponse {
    Json(json!({ "status": "success", "data": { "categories": JOB_CATEGORIES } }))
}

pub async fn get_locations() -> impl IntoResponse {
    Json(json!({ "status": "success", "data": { "locations": SERVICE_LOCATIONS } }))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    if user.user.role != UserRole::Homeowner {
        return Err(HttpError::forbidden("Only homeowners can post jobs".to_string()));
    }

    if body.budget_min > body.budget_max {
        return Err(HttpError::unprocessable_entity(
            "Minimum budget cannot exceed maximum budget".to_string(),
        ));
    }

    let job = app_state
        .db_client
        .create_job(
            user.user.id,
            user.user.full_name.clone(),
            body.title,
            body.description,
            body.location,
            body.category,
            body.budget_min,
            body.budget_max,
            body.start_date,
            body.images,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(job_id = %job.id, homeowner_id = %user.user.id, "job posted");

    Ok(Json(json!({
        "status": "success",
        "message": "Job posted",
        "data": { "job": job }
    })))
}

/// Public marketplace search. Defaults to jobs still taking bids; filters
/// are conjunctive.
pub async fn search_jobs(
    Query(query): Query<JobSearchQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(ref status) = query.status {
        if JobStatus::from_str(status).is_none() {
            return Err(HttpError::bad_request(format!("Unknown status: {}", status)));
        }
    }

    let jobs = app_state
        .db_client
        .search_jobs(&query)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let mut results = Vec::with_capacity(jobs.len());
    for job in jobs {
        let bid_count = app_state
            .db_client
            .count_bids_for_job(job.id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;
        results.push(JobResponseDto::from_job(job, bid_count));
    }

    Ok(Json(json!({
        "status": "success",
        "data": { "jobs": results }
    })))
}

pub async fn get_job(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .db_client
        .get_job_by_id(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Job not found".to_string()))?;

    let bid_count = app_state
        .db_client
        .count_bids_for_job(job.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "job": JobResponseDto::from_job(job, bid_count) }
    })))
}

/// Homeowners see the jobs they posted; contractors see jobs they were
/// awarded or bid on.
pub async fn get_my_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = match user.user.role {
        UserRole::Contractor => app_state
            .db_client
            .get_jobs_for_contractor(user.user.id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?,
        _ => app_state
            .db_client
            .get_jobs_by_homeowner(user.user.id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?,
    };

    let mut results = Vec::with_capacity(jobs.len());
    for job in jobs {
        let bid_count = app_state
            .db_client
            .count_bids_for_job(job.id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;
        results.push(JobResponseDto::from_job(job, bid_count));
    }

    Ok(Json(json!({
        "status": "success",
        "data": { "jobs": results }
    })))
}

/// Owner-only edits, and only while the job is still open.
pub async fn update_job(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    let job = app_state
        .db_client
        .get_job_by_id(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Job not found".to_string()))?;

    if job.homeowner_id != user.user.id {
        return Err(HttpError::forbidden("Not your job".to_string()));
    }
    if job.status != JobStatus::Open {
        return Err(HttpError::bad_request(
            "Job can only be edited while open".to_string(),
        ));
    }

    let min = body.budget_min.unwrap_or(job.budget_min);
    let max = body.budget_max.unwrap_or(job.budget_max);
    if min > max {
        return Err(HttpError::unprocessable_entity(
            "Minimum budget cannot exceed maximum budget".to_string(),
        ));
    }

    let updated = app_state
        .db_client
        .update_job_fields(job_id, &body)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "message": "Job updated",
        "data": { "job": updated }
    })))
}

/// Owner deletes a job, allowed only while it is still open. Anything past
/// that point goes through dispute resolution or stays for the record.
pub async fn delete_job(
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

    if job.homeowner_id != user.user.id {
        return Err(HttpError::forbidden("Not your job".to_string()));
    }
    if !job.status.deletable_by_owner() {
        return Err(HttpError::bad_request(
            "Only open jobs can be deleted".to_string(),
        ));
    }

    app_state
        .db_client
        .delete_job(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(job_id = %job_id, "job deleted");

    Ok(Json(json!({
        "status": "success",
        "message": "Job deleted"
    })))
}
