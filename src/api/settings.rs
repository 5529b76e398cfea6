//! Settings of the calling user

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::{
    error::AppResult,
    models::settings::{
        MessageResponse, Preferences, Settings, UpdatePassword, UpdatePreferences, UpdateProfile,
    },
};

use super::{AuthenticatedUser, Json};

/// Profile and preferences
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current settings", body = Settings)
    )
)]
pub async fn get_settings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Settings>> {
    Ok(Json(state.services.settings.get(&claims).await?))
}

#[utoipa::path(
    put,
    path = "/api/settings/profile",
    tag = "settings",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = MessageResponse),
        (status = 400, description = "Name is required")
    )
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateProfile>,
) -> AppResult<Json<MessageResponse>> {
    state.services.settings.update_profile(&claims, request).await?;
    Ok(Json(MessageResponse::ok("Profile updated successfully")))
}

#[utoipa::path(
    put,
    path = "/api/settings/password",
    tag = "settings",
    security(("bearer_auth" = [])),
    request_body = UpdatePassword,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Missing fields, mismatch, too short or wrong current password")
    )
)]
pub async fn update_password(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdatePassword>,
) -> AppResult<Json<MessageResponse>> {
    state.services.settings.update_password(&claims, request).await?;
    Ok(Json(MessageResponse::ok("Password updated successfully")))
}

#[utoipa::path(
    put,
    path = "/api/settings/preferences",
    tag = "settings",
    security(("bearer_auth" = [])),
    request_body = UpdatePreferences,
    responses(
        (status = 200, description = "Stored preferences", body = Preferences)
    )
)]
pub async fn update_preferences(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdatePreferences>,
) -> AppResult<Json<Preferences>> {
    Ok(Json(state.services.settings.update_preferences(&claims, request).await?))
}

/// Restore default preferences
#[utoipa::path(
    post,
    path = "/api/settings/reset",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Default preferences", body = Preferences)
    )
)]
pub async fn reset_settings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Preferences>> {
    Ok(Json(state.services.settings.reset(&claims).await?))
}

/// Profile as a CSV attachment
#[utoipa::path(
    get,
    path = "/api/settings/export",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv")
    )
)]
pub async fn export_settings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let csv = state.services.settings.export_csv(&claims).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=user_settings.csv"),
        ],
        csv,
    ))
}
