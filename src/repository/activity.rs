//! Activity log repository

use sqlx::{types::Json, MySql, Pool};

use crate::{
    error::AppResult,
    models::activity::{Activity, ActivityWithUser, NewActivity},
};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: Pool<MySql>,
}

impl ActivityRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn record(&self, entry: &NewActivity) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (user_id, action, entity_type, entity_id, details)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.details.as_ref().map(Json))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Latest entries of one user
    pub async fn for_user(&self, user_id: i32, limit: i64) -> AppResult<Vec<Activity>> {
        let rows = sqlx::query_as::<_, Activity>(
            "SELECT * FROM activity_log WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Latest entries across users, with user names
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<ActivityWithUser>> {
        let rows = sqlx::query_as::<_, ActivityWithUser>(
            r#"
            SELECT al.*, COALESCE(u.name, 'Unknown User') AS user_name
            FROM activity_log al
            LEFT JOIN users u ON al.user_id = u.id
            ORDER BY al.created_at DESC, al.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
