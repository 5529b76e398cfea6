//! Chatbot models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_SESSION: &str = "default";

/// One question/answer exchange
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ChatExchange {
    pub id: i32,
    pub user_id: i32,
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ChatSession {
    pub session_id: String,
    pub message_count: i64,
    pub last_activity: DateTime<Utc>,
    pub first_activity: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000, message = "Message is required"))]
    pub message: String,
    #[validate(length(min = 1, max = 100, message = "sessionId must be 1 to 100 characters"))]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn session(&self) -> &str {
        self.session_id.as_deref().unwrap_or(DEFAULT_SESSION)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub success: bool,
    pub message: String,
    pub response: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct ChatHistoryQuery {
    pub session_id: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatHistory {
    pub success: bool,
    pub count: usize,
    /// Oldest first
    pub history: Vec<ChatExchange>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatSessions {
    pub success: bool,
    pub sessions: Vec<ChatSession>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearHistory {
    pub session_id: Option<String>,
}
