//! Activity log service
//!
//! Recording is best-effort: a failed insert is logged and never fails the
//! operation that triggered it.

use crate::{
    error::AppResult,
    models::activity::{Activity, ActivityWithUser, NewActivity},
    repository::Repository,
};

#[derive(Clone)]
pub struct ActivityService {
    repository: Repository,
}

impl ActivityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn record(&self, entry: NewActivity) {
        if let Err(e) = self.repository.activity.record(&entry).await {
            tracing::warn!(
                user_id = entry.user_id,
                action = %entry.action,
                "Failed to record activity: {}",
                e
            );
        }
    }

    pub async fn for_user(&self, user_id: i32, limit: i64) -> AppResult<Vec<Activity>> {
        self.repository.activity.for_user(user_id, limit).await
    }

    /// Latest entries, `limit` clamped to 1..=100
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<ActivityWithUser>> {
        self.repository.activity.recent(limit.clamp(1, 100)).await
    }
}
