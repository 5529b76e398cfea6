//! Asset record endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        asset::{
            Asset, AssetList, AssetQuery, AssetSearchQuery, AssetSearchResults, AssetStats,
            AssetUpdated, CreateAsset, UpdateAsset,
        },
        settings::MessageResponse,
    },
};

use super::{AuthenticatedUser, Json};

/// List assets with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/api/assets",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(AssetQuery),
    responses(
        (status = 200, description = "List of assets", body = AssetList),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_assets(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<AssetQuery>,
) -> AppResult<Json<AssetList>> {
    let assets = state.services.assets.list(&query).await?;
    Ok(Json(assets))
}

#[utoipa::path(
    get,
    path = "/api/assets/stats",
    tag = "assets",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Asset statistics", body = AssetStats)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<AssetStats>> {
    Ok(Json(state.services.assets.stats().await?))
}

/// Quick search, at most 20 hits
#[utoipa::path(
    get,
    path = "/api/assets/search",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(AssetSearchQuery),
    responses(
        (status = 200, description = "Matching assets", body = AssetSearchResults),
        (status = 400, description = "Search query is required")
    )
)]
pub async fn search_assets(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<AssetSearchQuery>,
) -> AppResult<Json<AssetSearchResults>> {
    let assets = state.services.assets.search(query.q.as_deref()).await?;
    Ok(Json(AssetSearchResults { assets }))
}

/// Every asset as a CSV attachment
#[utoipa::path(
    get,
    path = "/api/assets/export",
    tag = "assets",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv")
    )
)]
pub async fn export_assets(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let csv = state.services.assets.export_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=assets_export.csv"),
        ],
        csv,
    ))
}

#[utoipa::path(
    get,
    path = "/api/assets/{id}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Asset details", body = Asset),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn get_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Asset>> {
    Ok(Json(state.services.assets.get_by_id(id).await?))
}

/// Create an asset record
#[utoipa::path(
    post,
    path = "/api/assets",
    tag = "assets",
    security(("bearer_auth" = [])),
    request_body = CreateAsset,
    responses(
        (status = 201, description = "Asset created", body = Asset),
        (status = 400, description = "Invalid input or duplicate asset number"),
        (status = 403, description = "Insufficient permissions")
    )
)]
pub async fn create_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(asset): Json<CreateAsset>,
) -> AppResult<(StatusCode, Json<Asset>)> {
    claims.require_staff()?;
    asset.validate()?;

    let created = state.services.assets.create(&claims, asset).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/assets/{id}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Asset ID")
    ),
    request_body = UpdateAsset,
    responses(
        (status = 200, description = "Asset updated", body = AssetUpdated),
        (status = 400, description = "No fields to update"),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn update_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(asset): Json<UpdateAsset>,
) -> AppResult<Json<AssetUpdated>> {
    claims.require_staff()?;
    asset.validate()?;

    let updated = state.services.assets.update(&claims, id, asset).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/assets/{id}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Asset deleted", body = MessageResponse),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn delete_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_admin()?;

    state.services.assets.delete(&claims, id).await?;
    Ok(Json(MessageResponse::ok("Asset deleted successfully")))
}
