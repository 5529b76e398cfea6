//! Dashboard endpoints. Responses are wrapped in `{ success, data }`.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        activity::{ActivityQuery, ActivityWithUser},
        dashboard::{ChartData, DashboardStats, DataEnvelope},
    },
};

use super::AuthenticatedUser;

/// Headline counters and the system health score
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard counters in `data`", body = DashboardStats)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<DataEnvelope<DashboardStats>>> {
    let stats = state.services.dashboard.stats().await?;
    Ok(Json(DataEnvelope::new(stats)))
}

/// Latest activity across all users
#[utoipa::path(
    get,
    path = "/api/dashboard/activity",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    params(ActivityQuery),
    responses(
        (status = 200, description = "Activity entries in `data`", body = Vec<ActivityWithUser>)
    )
)]
pub async fn get_activity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<DataEnvelope<Vec<ActivityWithUser>>>> {
    let activity = state.services.dashboard.activity(query.limit).await?;
    Ok(Json(DataEnvelope::new(activity)))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/charts",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Chart series in `data`", body = ChartData)
    )
)]
pub async fn get_charts(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<DataEnvelope<ChartData>>> {
    let charts = state.services.dashboard.charts().await?;
    Ok(Json(DataEnvelope::new(charts)))
}
