use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::admin_handler,
        auth::auth_handler,
        bids::{bids_handler, job_bids_handler},
        jobs::{jobs_handler, public_jobs_handler},
        messages::messages_handler,
        payments::{payment_webhook_handler, payments_handler},
        reviews::{contractors_handler, reviews_handler},
        users::users_handler,
    },
    middleware::{auth, role_check},
    models::usermodel::UserRole,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let job_routes = Router::new()
        .merge(
            jobs_handler()
                .merge(job_bids_handler())
                .layer(middleware::from_fn(auth)),
        )
        .merge(public_jobs_handler());

    // Webhook must stay outside the auth layer: the provider has no token.
    let payment_routes = Router::new()
        .merge(payments_handler().layer(middleware::from_fn(auth)))
        .merge(payment_webhook_handler());

    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        .nest("/jobs", job_routes)
        .nest("/bids", bids_handler().layer(middleware::from_fn(auth)))
        .nest("/payments", payment_routes)
        .nest("/messages", messages_handler().layer(middleware::from_fn(auth)))
        .nest("/reviews", reviews_handler().layer(middleware::from_fn(auth)))
        .nest("/contractors", contractors_handler())
        .nest(
            "/admin",
            admin_handler()
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Admin])
                }))
                .layer(middleware::from_fn(auth)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
