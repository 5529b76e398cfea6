//! Device borrowing endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrowing::{
            BorrowingCreated, BorrowingList, BorrowingQuery, BorrowingStats, CreateBorrowing,
            CreateDevice, DeviceCreated, DeviceStock, UpdateDeviceStock,
        },
        settings::MessageResponse,
    },
};

use super::{AuthenticatedUser, Json};

/// List borrowings, newest first
#[utoipa::path(
    get,
    path = "/api/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(BorrowingQuery),
    responses(
        (status = 200, description = "List of borrowings", body = BorrowingList)
    )
)]
pub async fn list_borrowings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BorrowingQuery>,
) -> AppResult<Json<BorrowingList>> {
    Ok(Json(state.services.borrowings.list(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/borrowings/stats",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Borrowing statistics", body = BorrowingStats)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<BorrowingStats>> {
    Ok(Json(state.services.borrowings.stats().await?))
}

/// Lend units of a device to an employee
#[utoipa::path(
    post,
    path = "/api/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowing,
    responses(
        (status = 201, description = "Borrowing created", body = BorrowingCreated),
        (status = 400, description = "Invalid input or not enough stock", body = crate::error::ErrorResponse),
        (status = 404, description = "Device not found")
    )
)]
pub async fn create_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrowing>,
) -> AppResult<(StatusCode, Json<BorrowingCreated>)> {
    let borrowing_id = state.services.borrowings.borrow(&claims, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowingCreated {
            message: "Borrowing created successfully".to_string(),
            borrowing_id,
        }),
    ))
}

/// Mark a borrowing as returned and restock the device
#[utoipa::path(
    patch,
    path = "/api/borrowings/{id}/return",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Device returned", body = MessageResponse),
        (status = 404, description = "Borrowing not found or already returned")
    )
)]
pub async fn return_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.borrowings.return_borrowing(&claims, id).await?;
    Ok(Json(MessageResponse::ok("Device returned successfully")))
}

/// Devices with their stock levels
#[utoipa::path(
    get,
    path = "/api/borrowings/devices",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Devices", body = Vec<DeviceStock>)
    )
)]
pub async fn list_devices(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<DeviceStock>>> {
    Ok(Json(state.services.borrowings.list_devices().await?))
}

/// Register a device; all units start available
#[utoipa::path(
    post,
    path = "/api/borrowings/devices",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = CreateDevice,
    responses(
        (status = 201, description = "Device created", body = DeviceCreated),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient permissions")
    )
)]
pub async fn create_device(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateDevice>,
) -> AppResult<(StatusCode, Json<DeviceCreated>)> {
    claims.require_staff()?;

    let device_id = state.services.borrowings.create_device(&claims, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(DeviceCreated {
            message: "Device created successfully".to_string(),
            device_id,
        }),
    ))
}

/// Change the total stock of a device
#[utoipa::path(
    put,
    path = "/api/borrowings/devices/{id}/stock",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Device ID")
    ),
    request_body = UpdateDeviceStock,
    responses(
        (status = 200, description = "Stock updated", body = DeviceStock),
        (status = 400, description = "Invalid total, or below the units currently borrowed"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Device not found")
    )
)]
pub async fn update_device_stock(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateDeviceStock>,
) -> AppResult<Json<DeviceStock>> {
    claims.require_staff()?;
    request.validate()?;

    let total_stock = request
        .total_stock
        .ok_or_else(|| AppError::Validation("Valid total stock is required".to_string()))?;

    let device = state
        .services
        .borrowings
        .update_stock(&claims, id, total_stock)
        .await?;
    Ok(Json(device))
}

/// Delete a device without active borrowings
#[utoipa::path(
    delete,
    path = "/api/borrowings/devices/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Device ID")
    ),
    responses(
        (status = 200, description = "Device deleted", body = MessageResponse),
        (status = 400, description = "Device has active borrowings"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Device not found")
    )
)]
pub async fn delete_device(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_admin()?;

    state.services.borrowings.delete_device(&claims, id).await?;
    Ok(Json(MessageResponse::ok("Device deleted successfully")))
}
