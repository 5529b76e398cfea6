//! Read-only aggregates for the dashboard

use rust_decimal::Decimal;
use sqlx::{MySql, Pool};

use crate::{
    error::AppResult,
    models::dashboard::{CategoryCount, HealthSignals, MonthlyCount, StatusSlice, TypeCount, WeeklyActivity},
};

/// Headline counters, without the health score
#[derive(Debug, Clone)]
pub struct Totals {
    pub total_users: i64,
    pub active_users: i64,
    pub total_assets: i64,
    pub total_asset_value: Decimal,
    pub total_library_items: i64,
}

#[derive(Clone)]
pub struct DashboardRepository {
    pool: Pool<MySql>,
}

impl DashboardRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn totals(&self) -> AppResult<Totals> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let (total_assets, total_asset_value): (i64, Decimal) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(value), 0) FROM assets WHERE LOWER(status) = 'active'",
        )
        .fetch_one(&self.pool)
        .await?;

        let total_library_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM library_items")
            .fetch_one(&self.pool)
            .await?;

        let active_users: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT user_id) FROM activity_log
            WHERE created_at >= NOW() - INTERVAL 30 MINUTE AND user_id IS NOT NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Totals {
            total_users,
            active_users,
            total_assets,
            total_asset_value,
            total_library_items,
        })
    }

    /// Sign-ups per month over the last six months
    pub async fn user_growth(&self) -> AppResult<Vec<MonthlyCount>> {
        let rows = sqlx::query_as::<_, MonthlyCount>(
            r#"
            SELECT DATE_FORMAT(MIN(created_at), '%b %Y') AS month, COUNT(*) AS count
            FROM users
            WHERE created_at >= DATE_SUB(CURDATE(), INTERVAL 6 MONTH)
            GROUP BY DATE_FORMAT(created_at, '%Y-%m')
            ORDER BY MIN(created_at) ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Active assets per category
    pub async fn asset_distribution(&self) -> AppResult<Vec<CategoryCount>> {
        let rows = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT COALESCE(category, 'Unknown') AS category, COUNT(*) AS count
            FROM assets
            WHERE LOWER(status) = 'active'
            GROUP BY category
            ORDER BY count DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn library_distribution(&self) -> AppResult<Vec<TypeCount>> {
        let rows = sqlx::query_as::<_, TypeCount>(
            r#"
            SELECT COALESCE(type, 'Unknown') AS type, COUNT(*) AS count
            FROM library_items
            GROUP BY type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Download and upload actions per ISO week over the last four weeks
    pub async fn weekly_activity(&self) -> AppResult<Vec<WeeklyActivity>> {
        let rows = sqlx::query_as::<_, WeeklyActivity>(
            r#"
            SELECT
                CONCAT('Week ', ROW_NUMBER() OVER (ORDER BY MIN(created_at) ASC)) AS week,
                COUNT(CASE WHEN LOWER(action) LIKE '%download%' THEN 1 END) AS downloads,
                COUNT(CASE WHEN LOWER(action) LIKE '%upload%' OR LOWER(action) LIKE '%create%' THEN 1 END) AS uploads
            FROM activity_log
            WHERE created_at >= DATE_SUB(NOW(), INTERVAL 4 WEEK)
              AND (LOWER(action) LIKE '%download%' OR LOWER(action) LIKE '%upload%' OR LOWER(action) LIKE '%create%')
            GROUP BY YEARWEEK(created_at, 1)
            ORDER BY MIN(created_at) ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Users per status with the chart colors
    pub async fn user_activity(&self) -> AppResult<Vec<StatusSlice>> {
        let rows = sqlx::query_as::<_, StatusSlice>(
            r#"
            SELECT
                COALESCE(status, 'Unknown') AS name,
                COUNT(*) AS value,
                CASE
                    WHEN LOWER(COALESCE(status, '')) = 'active' THEN '#3b82f6'
                    WHEN LOWER(COALESCE(status, '')) = 'inactive' THEN '#ef4444'
                    ELSE '#e5e7eb'
                END AS fill
            FROM users
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Gather the health score inputs. A failing probe surfaces as an error.
    pub async fn health_signals(&self) -> AppResult<HealthSignals> {
        let database_reachable = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok();

        let recent_errors: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activity_log
            WHERE (LOWER(action) LIKE '%error%' OR LOWER(action) LIKE '%fail%')
              AND created_at >= NOW() - INTERVAL 1 HOUR
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let (total_users, inactive_users): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   CAST(COALESCE(SUM(CASE WHEN LOWER(status) = 'inactive' THEN 1 ELSE 0 END), 0) AS SIGNED)
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let maintenance_needed: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM assets
            WHERE LOWER(status) = 'maintenance'
               OR COALESCE(last_maintenance, '1970-01-01') < DATE_SUB(CURDATE(), INTERVAL 6 MONTH)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(HealthSignals {
            database_reachable,
            recent_errors,
            total_users,
            inactive_users,
            maintenance_needed,
        })
    }
}
