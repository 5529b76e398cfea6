//! Site assistant endpoints

use axum::extract::{Query, State};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::chat::{ChatHistory, ChatHistoryQuery, ChatReply, ChatRequest, ChatSessions, ClearHistory},
};

use super::{AuthenticatedUser, Json};

#[derive(Serialize, ToSchema)]
pub struct HistoryCleared {
    pub success: bool,
    pub message: String,
    /// Number of exchanges removed
    pub deleted: u64,
}

/// Ask the assistant a question
#[utoipa::path(
    post,
    path = "/api/chatbot/message",
    tag = "chatbot",
    security(("bearer_auth" = [])),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatReply),
        (status = 400, description = "Message is required"),
        (status = 502, description = "Chat model request failed"),
        (status = 503, description = "Chat model not configured")
    )
)]
pub async fn send_message(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatReply>> {
    request.validate()?;
    Ok(Json(state.services.chatbot.send_message(&claims, &request).await?))
}

/// Past exchanges, oldest first. All sessions when `sessionId` is omitted.
#[utoipa::path(
    get,
    path = "/api/chatbot/history",
    tag = "chatbot",
    security(("bearer_auth" = [])),
    params(ChatHistoryQuery),
    responses(
        (status = 200, description = "Chat history", body = ChatHistory)
    )
)]
pub async fn get_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ChatHistoryQuery>,
) -> AppResult<Json<ChatHistory>> {
    let history = state
        .services
        .chatbot
        .history(&claims, query.session_id.as_deref(), query.limit)
        .await?;

    Ok(Json(ChatHistory {
        success: true,
        count: history.len(),
        history,
    }))
}

#[utoipa::path(
    get,
    path = "/api/chatbot/sessions",
    tag = "chatbot",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Chat sessions, most recent first", body = ChatSessions)
    )
)]
pub async fn get_sessions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ChatSessions>> {
    let sessions = state.services.chatbot.sessions(&claims).await?;
    Ok(Json(ChatSessions {
        success: true,
        sessions,
    }))
}

/// Delete one session, or the whole history when no `sessionId` is given
#[utoipa::path(
    delete,
    path = "/api/chatbot/history",
    tag = "chatbot",
    security(("bearer_auth" = [])),
    request_body(content = ClearHistory, description = "Optional session to clear"),
    responses(
        (status = 200, description = "History cleared", body = HistoryCleared)
    )
)]
pub async fn clear_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    request: Option<Json<ClearHistory>>,
) -> AppResult<Json<HistoryCleared>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let deleted = state
        .services
        .chatbot
        .clear(&claims, request.session_id.as_deref())
        .await?;

    Ok(Json(HistoryCleared {
        success: true,
        message: "Chat history cleared".to_string(),
        deleted,
    }))
}
