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
    db::{jobdb::JobExt, paymentdb::PaymentExt, userdb::UserExt},
    dtos::{
        jobdtos::AdminResolveDto,
        userdtos::{ApiResponse, FilterUserDto, PageQueryDto},
    },
    error::HttpError,
    models::jobmodel::JobStatus,
    service::escrow_service::ResolveAction,
    AppState,
};

pub fn admin_handler() -> Router {
    Router::new()
        .route("/stats", get(get_platform_stats))
        .route("/users", get(list_users))
        .route("/jobs", get(list_jobs))
        .route("/payments", get(list_payments))
        .route("/users/:user_id/verify", put(verify_contractor))
        .route("/users/:user_id/suspend", put(suspend_user))
        .route("/users/:user_id/unsuspend", put(unsuspend_user))
        .route("/jobs/:job_id", delete(delete_job))
        .route("/jobs/:job_id/resolve", post(resolve_dispute))
}

pub async fn get_platform_stats(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let total_users = app_state
        .db_client
        .count_users()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total_jobs = app_state
        .db_client
        .count_jobs()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total_fees = app_state
        .db_client
        .total_platform_fees()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "total_users": total_users,
            "total_jobs": total_jobs,
            "total_platform_fees": total_fees,
        }
    })))
}

pub async fn list_users(
    Query(query): Query<PageQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    let offset = (page - 1) * limit;

    let users = app_state
        .db_client
        .get_users(limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total = app_state
        .db_client
        .count_users()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let filtered: Vec<FilterUserDto> = users.iter().map(FilterUserDto::filter_user).collect();

    Ok(Json(json!({
        "status": "success",
        "data": {
            "users": filtered,
            "pagination": { "page": page, "limit": limit, "total": total }
        }
    })))
}

pub async fn list_jobs(
    Query(query): Query<PageQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    let offset = (page - 1) * limit;

    let jobs = app_state
        .db_client
        .get_all_jobs(limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total = app_state
        .db_client
        .count_jobs()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "jobs": jobs,
            "pagination": { "page": page, "limit": limit, "total": total }
        }
    })))
}

pub async fn list_payments(
    Query(query): Query<PageQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    let offset = (page - 1) * limit;

    let transactions = app_state
        .db_client
        .get_all_transactions(limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "transactions": transactions,
            "pagination": { "page": page, "limit": limit }
        }
    })))
}

/// Manual verification override, for contractors whose paperwork was checked
/// out of band.
pub async fn verify_contractor(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .set_user_verified(user_id, true)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(user_id = %user_id, "contractor verified by admin");

    Ok(Json(ApiResponse::success(
        "User verified",
        FilterUserDto::filter_user(&user),
    )))
}

pub async fn suspend_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .set_user_suspended(user_id, true)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(user_id = %user_id, "user suspended");

    Ok(Json(ApiResponse::success(
        "User suspended",
        FilterUserDto::filter_user(&user),
    )))
}

pub async fn unsuspend_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .set_user_suspended(user_id, false)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(user_id = %user_id, "user unsuspended");

    Ok(Json(ApiResponse::success(
        "User unsuspended",
        FilterUserDto::filter_user(&user),
    )))
}

/// Admin removal of listings; jobs with money in escrow must be resolved
/// first.
pub async fn delete_job(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .db_client
        .get_job_by_id(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Job not found".to_string()))?;

    if matches!(job.status, JobStatus::InEscrow | JobStatus::Awarded) {
        return Err(HttpError::bad_request(
            "Resolve the escrow before deleting this job".to_string(),
        ));
    }
    if !job.status.deletable_by_admin() {
        return Err(HttpError::bad_request(
            "Completed jobs are kept for the payout record".to_string(),
        ));
    }

    app_state
        .db_client
        .delete_job(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(job_id = %job_id, "job deleted by admin");

    Ok(Json(json!({
        "status": "success",
        "message": "Job deleted"
    })))
}

pub async fn resolve_dispute(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<AdminResolveDto>,
) -> Result<impl IntoResponse, HttpError> {
    let action = ResolveAction::parse(&body.action)?;

    let resolution = app_state.escrow_service.admin_resolve(job_id, action).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Dispute resolved",
        "data": {
            "job": resolution.job,
            "payout": resolution.payout,
        }
    })))
}
