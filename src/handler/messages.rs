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
    db::{messagedb::MessageExt, userdb::UserExt},
    dtos::messagedtos::{ConversationDto, CreateMessageDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn messages_handler() -> Router {
    Router::new()
        .route("/", post(send_message).get(list_messages))
        .route("/conversations", get(get_conversations))
        .route("/conversation/:user_id", get(get_conversation))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::unprocessable_entity(e.to_string()))?;

    if body.receiver_id == user.user.id {
        return Err(HttpError::bad_request("Cannot message yourself".to_string()));
    }

    let receiver = app_state
        .db_client
        .get_user(Some(body.receiver_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if receiver.is_none() {
        return Err(HttpError::not_found("Recipient not found".to_string()));
    }

    let message = app_state
        .db_client
        .create_message(
            user.user.id,
            user.user.full_name.clone(),
            body.receiver_id,
            body.job_id,
            body.content,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "message": message }
    })))
}

/// Flat listing of the caller's recent messages, newest first.
pub async fn list_messages(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let messages = app_state
        .db_client
        .get_messages_for_user(user.user.id, 100)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "messages": messages }
    })))
}

/// Inbox view: one row per counterpart with the latest message and an
/// unread count.
pub async fn get_conversations(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let messages = app_state
        .db_client
        .get_messages_for_user(user.user.id, 500)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    // Messages come newest-first, so the first one seen per counterpart is
    // the latest.
    let mut conversations: Vec<ConversationDto> = Vec::new();
    for message in &messages {
        let other_id = if message.sender_id == user.user.id {
            message.receiver_id
        } else {
            message.sender_id
        };

        if let Some(existing) = conversations.iter_mut().find(|c| c.user_id == other_id) {
            if message.receiver_id == user.user.id && !message.read {
                existing.unread_count += 1;
            }
            continue;
        }

        let other = app_state
            .db_client
            .get_user(Some(other_id), None)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        let (user_name, user_type) = match other {
            Some(u) => (u.full_name, u.role.to_str().to_string()),
            None => ("Deleted user".to_string(), "unknown".to_string()),
        };

        let unread = if message.receiver_id == user.user.id && !message.read {
            1
        } else {
            0
        };

        conversations.push(ConversationDto {
            user_id: other_id,
            user_name,
            user_type,
            last_message: message.content.clone(),
            last_message_time: message.created_at,
            unread_count: unread,
        });
    }

    Ok(Json(json!({
        "status": "success",
        "data": { "conversations": conversations }
    })))
}

/// Full thread with one counterpart; opening it marks their messages read.
pub async fn get_conversation(
    Path(other_user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let messages = app_state
        .db_client
        .get_conversation(user.user.id, other_user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state
        .db_client
        .mark_conversation_read(user.user.id, other_user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "messages": messages }
    })))
}
