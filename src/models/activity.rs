//! Activity log models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};

/// Audit entry as stored
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Activity {
    pub id: i32,
    pub user_id: Option<i32>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

/// Audit entry joined with the acting user's name
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ActivityWithUser {
    pub id: i32,
    pub user_id: Option<i32>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
}

/// Audit entry to record
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: i32,
    pub action: String,
    pub entity_type: &'static str,
    pub entity_id: Option<i32>,
    pub details: Option<serde_json::Value>,
}

impl NewActivity {
    pub fn new(user_id: i32, action: impl Into<String>, entity_type: &'static str) -> Self {
        Self {
            user_id,
            action: action.into(),
            entity_type,
            entity_id: None,
            details: None,
        }
    }

    pub fn entity(mut self, id: i32) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}
