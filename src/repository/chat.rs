//! Chat history repository

use sqlx::{MySql, Pool};

use super::inserted_id;
use crate::{
    error::AppResult,
    models::chat::{ChatExchange, ChatSession},
};

#[derive(Clone)]
pub struct ChatRepository {
    pool: Pool<MySql>,
}

impl ChatRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// Last `limit` exchanges of one session, or of every session, oldest first
    pub async fn history(&self, user_id: i32, session_id: Option<&str>, limit: i64) -> AppResult<Vec<ChatExchange>> {
        let mut rows = match session_id {
            Some(session) => {
                sqlx::query_as::<_, ChatExchange>(
                    r#"
                    SELECT * FROM chat_history
                    WHERE user_id = ? AND session_id = ?
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?
                    "#,
                )
                .bind(user_id)
                .bind(session)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ChatExchange>(
                    "SELECT * FROM chat_history WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.reverse();
        Ok(rows)
    }

    pub async fn insert(&self, user_id: i32, session_id: &str, message: &str, response: &str) -> AppResult<i32> {
        let result = sqlx::query(
            "INSERT INTO chat_history (user_id, session_id, message, response) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(session_id)
        .bind(message)
        .bind(response)
        .execute(&self.pool)
        .await?;
        inserted_id(result.last_insert_id())
    }

    /// Sessions of a user, most recently active first
    pub async fn sessions(&self, user_id: i32) -> AppResult<Vec<ChatSession>> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            r#"
            SELECT session_id,
                   COUNT(*) AS message_count,
                   MAX(created_at) AS last_activity,
                   MIN(created_at) AS first_activity
            FROM chat_history
            WHERE user_id = ?
            GROUP BY session_id
            ORDER BY last_activity DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    /// Remove one session, or all of them when `session_id` is None
    pub async fn clear(&self, user_id: i32, session_id: Option<&str>) -> AppResult<u64> {
        let result = match session_id {
            Some(session) => {
                sqlx::query("DELETE FROM chat_history WHERE user_id = ? AND session_id = ?")
                    .bind(user_id)
                    .bind(session)
                    .execute(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("DELETE FROM chat_history WHERE user_id = ?")
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }
}
