//! Dashboard aggregates and the system health score

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Score reported when a health probe query fails
pub const DEGRADED_HEALTH: i32 = 85;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    /// Distinct users with activity in the last 30 minutes
    pub active_users: i64,
    pub total_assets: i64,
    pub total_library_items: i64,
    #[schema(value_type = f64)]
    pub total_asset_value: Decimal,
    pub system_health: i32,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct MonthlyCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct TypeCount {
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct WeeklyActivity {
    pub week: String,
    pub downloads: i64,
    pub uploads: i64,
}

/// Users per status, with a chart color
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct StatusSlice {
    pub name: String,
    pub value: i64,
    pub fill: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub user_growth: Vec<MonthlyCount>,
    pub asset_distribution: Vec<CategoryCount>,
    pub library_distribution: Vec<TypeCount>,
    pub weekly_activity: Vec<WeeklyActivity>,
    pub user_activity: Vec<StatusSlice>,
}

/// `{ success: true, data }` envelope used by the dashboard endpoints
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

/// Raw inputs of the health score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthSignals {
    pub database_reachable: bool,
    /// Error or failure actions logged in the last hour
    pub recent_errors: i64,
    pub total_users: i64,
    pub inactive_users: i64,
    /// Assets in maintenance or not serviced for six months
    pub maintenance_needed: i64,
}

impl HealthSignals {
    /// Score in 0..=100, starting from 100 and deducting per signal
    pub fn score(&self) -> i32 {
        let mut score: i64 = 100;
        if !self.database_reachable {
            score -= 20;
        }
        if self.recent_errors > 5 {
            score -= self.recent_errors.min(10);
        }
        if self.total_users > 0 && self.inactive_users * 100 > self.total_users * 30 {
            score -= 15;
        }
        if self.maintenance_needed > 10 {
            score -= 10;
        }
        score.clamp(0, 100) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> HealthSignals {
        HealthSignals {
            database_reachable: true,
            recent_errors: 0,
            total_users: 10,
            inactive_users: 0,
            maintenance_needed: 0,
        }
    }

    #[test]
    fn test_healthy_system_scores_full() {
        assert_eq!(healthy().score(), 100);
    }

    #[test]
    fn test_error_deduction_is_capped() {
        let few = HealthSignals { recent_errors: 5, ..healthy() };
        assert_eq!(few.score(), 100);

        let some = HealthSignals { recent_errors: 7, ..healthy() };
        assert_eq!(some.score(), 93);

        let many = HealthSignals { recent_errors: 250, ..healthy() };
        assert_eq!(many.score(), 90);
    }

    #[test]
    fn test_inactive_ratio_threshold() {
        let at_threshold = HealthSignals { inactive_users: 3, ..healthy() };
        assert_eq!(at_threshold.score(), 100);

        let above = HealthSignals { inactive_users: 4, ..healthy() };
        assert_eq!(above.score(), 85);

        let no_users = HealthSignals { total_users: 0, inactive_users: 0, ..healthy() };
        assert_eq!(no_users.score(), 100);
    }

    #[test]
    fn test_every_deduction_combined() {
        let worst = HealthSignals {
            database_reachable: false,
            recent_errors: 50,
            total_users: 10,
            inactive_users: 9,
            maintenance_needed: 11,
        };
        assert_eq!(worst.score(), 100 - 20 - 10 - 15 - 10);
    }
}
