// src/handlers/chat.rs
use crate::middleware::auth::auth_middleware;
use crate::models::auth::{Claims, ErrorResponse};
use crate::models::chat::{RenameSessionRequest, SendMessageRequest, SendMessageResponse};
use crate::assistant::{AssistantError, ConversationError};
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

// Helper function to format timestamps in a human-readable relative format
fn format_relative_time(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let duration = now.signed_duration_since(*timestamp);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        if mins == 1 { "1 minute ago".to_string() } else { format!("{} minutes ago", mins) }
    } else if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        if hours == 1 { "1 hour ago".to_string() } else { format!("{} hours ago", hours) }
    } else if duration.num_days() < 30 {
        let days = duration.num_days();
        if days == 1 { "1 day ago".to_string() } else { format!("{} days ago", days) }
    } else {
        timestamp.format("%B %d, %Y").to_string()
    }
}

pub fn chat_routes() -> Router {
    Router::new()
        .route("/api/chat/message", post(send_message))
        .route("/api/chat/sessions", get(list_sessions))
        .route("/api/chat/history/:session_uuid", get(get_chat_history))
        .route("/api/chat/sessions/:session_uuid", patch(rename_session))
        .route("/api/chat/sessions/:session_uuid", delete(delete_session))
        .layer(axum::middleware::from_fn(auth_middleware))
}

fn user_id_from_claims(claims: &Claims) -> i32 {
    claims.sub.parse::<i32>().unwrap_or(0)
}

fn map_assistant_error(e: AssistantError) -> (StatusCode, Json<ErrorResponse>) {
    match e {
        AssistantError::EmptyMessage => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "Message must not be empty".to_string(),
            }),
        ),
        AssistantError::Conversation(ConversationError::SessionNotFound) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                success: false,
                message: "Chat session not found".to_string(),
            }),
        ),
        AssistantError::Conversation(ConversationError::DatabaseError(e)) => {
            tracing::error!("Database error handling chat message: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Internal server error".to_string(),
                }),
            )
        }
    }
}

fn map_conversation_error(e: ConversationError) -> (StatusCode, Json<ErrorResponse>) {
    match e {
        ConversationError::SessionNotFound => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                success: false,
                message: "Chat session not found".to_string(),
            }),
        ),
        ConversationError::DatabaseError(e) => {
            tracing::error!("Database error in chat handler: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Internal server error".to_string(),
                }),
            )
        }
    }
}

async fn send_message(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = user_id_from_claims(&claims);

    let reply = state
        .assistant
        .handle_message(user_id, payload.session_id, &payload.message)
        .await
        .map_err(map_assistant_error)?;

    Ok(Json(SendMessageResponse {
        success: true,
        session_id: reply.session_uuid,
        reply: reply.text,
        sources: reply.sources,
    }))
}

async fn list_sessions(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = user_id_from_claims(&claims);

    let sessions = state
        .conversations
        .list_sessions(user_id)
        .await
        .map_err(map_conversation_error)?;

    let sessions: Vec<serde_json::Value> = sessions
        .into_iter()
        .map(|session| {
            serde_json::json!({
                "session_id": session.session_uuid,
                "title": session.title,
                "created_at": session.created_at,
                "updated_at": session.updated_at,
                "updated_relative": format_relative_time(&session.updated_at),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "success": true,
        "sessions": sessions
    })))
}

async fn get_chat_history(
    Path(session_uuid): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = user_id_from_claims(&claims);

    // Ownership is enforced by the lookup: a session belonging to another
    // user is indistinguishable from a missing one.
    let session = state
        .conversations
        .find_session(user_id, session_uuid)
        .await
        .map_err(map_conversation_error)?;

    let messages = state
        .conversations
        .get_history(session.id)
        .await
        .map_err(map_conversation_error)?;

    let history: Vec<serde_json::Value> = messages
        .into_iter()
        .map(|message| {
            serde_json::json!({
                "role": message.role,
                "content": message.content,
                "sources": message.sources,
                "timestamp": message.created_at,
                "timestamp_relative": format_relative_time(&message.created_at),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "success": true,
        "session_id": session.session_uuid,
        "title": session.title,
        "history": history
    })))
}

async fn rename_session(
    Path(session_uuid): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RenameSessionRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = user_id_from_claims(&claims);

    let title = payload.title.trim();
    if title.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "Title must not be empty".to_string(),
            }),
        ));
    }

    let session = state
        .conversations
        .find_session(user_id, session_uuid)
        .await
        .map_err(map_conversation_error)?;

    state
        .conversations
        .rename_session(session.id, title)
        .await
        .map_err(map_conversation_error)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "session_id": session_uuid,
        "title": title
    })))
}

async fn delete_session(
    Path(session_uuid): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = user_id_from_claims(&claims);

    let session = state
        .conversations
        .find_session(user_id, session_uuid)
        .await
        .map_err(map_conversation_error)?;

    state
        .conversations
        .delete_session(session.id)
        .await
        .map_err(map_conversation_error)?;

    tracing::info!("Deleted chat session {} for user {}", session_uuid, user_id);

    Ok(Json(serde_json::json!({
        "success": true,
        "session_id": session_uuid
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_relative_time() {
        let now = chrono::Utc::now();
        assert_eq!(format_relative_time(&now), "just now");
        assert_eq!(format_relative_time(&(now - Duration::minutes(1))), "1 minute ago");
        assert_eq!(format_relative_time(&(now - Duration::minutes(5))), "5 minutes ago");
        assert_eq!(format_relative_time(&(now - Duration::hours(3))), "3 hours ago");
        assert_eq!(format_relative_time(&(now - Duration::days(1))), "1 day ago");

        let old = now - Duration::days(60);
        assert_eq!(format_relative_time(&old), old.format("%B %d, %Y").to_string());
    }
}
