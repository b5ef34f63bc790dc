use std::sync::Arc;

use axum::{
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::userdtos::{AuthResponseDto, FilterUserDto, LoginUserDto, RegisterUserDto},
    error::{ErrorMessage, HttpError},
    models::usermodel::UserRole,
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    let existing_user = app_state
        .db_client
        .get_user(None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing_user.is_some() {
        return Err(HttpError::bad_request(ErrorMessage::EmailExist.to_string()));
    }

    // validate_user_type already rejected anything but these two.
    let role = UserRole::from_str(&body.user_type).unwrap_or(UserRole::Homeowner);

    let hashed_password =
        password::hash(&body.password).map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = app_state
        .db_client
        .save_user(body.email, hashed_password, body.full_name, role, body.phone)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(user_id = %user.id, role = %user.role.to_str(), "new user registered");

    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage * 60,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = Json(AuthResponseDto {
        token: token.clone(),
        user: FilterUserDto::filter_user(&user),
    });

    Ok(with_token_cookie(response.into_response(), &token, app_state.env.jwt_maxage))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    if !app_state.login_limiter.allow(&body.email) {
        return Err(HttpError::too_many_requests(
            "Too many failed login attempts. Try again later.".to_string(),
        ));
    }

    let result = app_state
        .db_client
        .get_user(None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let Some(user) = result else {
        app_state.login_limiter.record(&body.email);
        return Err(HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()));
    };

    let password_matched = password::compare(&body.password, &user.password_hash)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        app_state.login_limiter.record(&body.email);
        return Err(HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()));
    }

    if user.suspended {
        return Err(HttpError::forbidden(ErrorMessage::AccountSuspended.to_string()));
    }

    app_state.login_limiter.clear(&body.email);

    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage * 60,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = Json(AuthResponseDto {
        token: token.clone(),
        user: FilterUserDto::filter_user(&user),
    });

    Ok(with_token_cookie(response.into_response(), &token, app_state.env.jwt_maxage))
}

fn with_token_cookie(
    mut response: axum::response::Response,
    token: &str,
    maxage_minutes: i64,
) -> axum::response::Response {
    let cookie = Cookie::build(("token", token.to_owned()))
        .path("/")
        .max_age(time::Duration::minutes(maxage_minutes))
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    if let Ok(value) = cookie.to_string().parse() {
        headers.append(header::SET_COOKIE, value);
    }
    response.headers_mut().extend(headers);

    response
}
