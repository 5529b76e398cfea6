//! Dashboard aggregation service

use super::activity::ActivityService;
use crate::{
    error::AppResult,
    models::{
        activity::ActivityWithUser,
        dashboard::{ChartData, DashboardStats, DEGRADED_HEALTH},
    },
    repository::Repository,
};

pub const DEFAULT_ACTIVITY_LIMIT: i64 = 20;

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
    activity: ActivityService,
}

impl DashboardService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self {
            repository,
            activity,
        }
    }

    pub async fn stats(&self) -> AppResult<DashboardStats> {
        let totals = self.repository.dashboard.totals().await?;
        let system_health = self.system_health().await;

        Ok(DashboardStats {
            total_users: totals.total_users,
            active_users: totals.active_users,
            total_assets: totals.total_assets,
            total_library_items: totals.total_library_items,
            total_asset_value: totals.total_asset_value,
            system_health,
        })
    }

    /// Health score in 0..=100, degraded when a probe fails
    pub async fn system_health(&self) -> i32 {
        match self.repository.dashboard.health_signals().await {
            Ok(signals) => {
                let score = signals.score();
                tracing::debug!(?signals, score, "System health computed");
                score
            }
            Err(e) => {
                tracing::warn!("System health probe failed: {}", e);
                DEGRADED_HEALTH
            }
        }
    }

    pub async fn activity(&self, limit: Option<i64>) -> AppResult<Vec<ActivityWithUser>> {
        self.activity
            .recent(limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT))
            .await
    }

    pub async fn charts(&self) -> AppResult<ChartData> {
        let dashboard = &self.repository.dashboard;
        let (user_growth, asset_distribution, library_distribution, weekly_activity, user_activity) = tokio::try_join!(
            dashboard.user_growth(),
            dashboard.asset_distribution(),
            dashboard.library_distribution(),
            dashboard.weekly_activity(),
            dashboard.user_activity(),
        )?;

        Ok(ChartData {
            user_growth,
            asset_distribution,
            library_distribution,
            weekly_activity,
            user_activity,
        })
    }
}
