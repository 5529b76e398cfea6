//! Digital library endpoints

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use tokio_util::io::ReaderStream;

use crate::{
    error::{AppError, AppResult},
    models::{
        library::{
            parse_tags, LibraryItem, LibraryItemCreated, LibraryList, LibraryQuery, LibraryStats,
            UpdateLibraryItem,
        },
        settings::MessageResponse,
        MediaKind,
    },
    services::library::LibraryUploadForm,
};

use super::{upload::read_multipart, AuthenticatedUser, Json};

/// List library items with filters and pagination
#[utoipa::path(
    get,
    path = "/api/library",
    tag = "library",
    security(("bearer_auth" = [])),
    params(LibraryQuery),
    responses(
        (status = 200, description = "List of library items", body = LibraryList)
    )
)]
pub async fn list_items(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<LibraryQuery>,
) -> AppResult<Json<LibraryList>> {
    Ok(Json(state.services.library.list(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/library/stats",
    tag = "library",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Library statistics", body = LibraryStats)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<LibraryStats>> {
    Ok(Json(state.services.library.stats().await?))
}

/// Get an item; counts as a view
#[utoipa::path(
    get,
    path = "/api/library/{id}",
    tag = "library",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library item ID")
    ),
    responses(
        (status = 200, description = "Library item", body = LibraryItem),
        (status = 404, description = "Library item not found")
    )
)]
pub async fn get_item(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LibraryItem>> {
    Ok(Json(state.services.library.view(id).await?))
}

/// Stream the stored file. The token may be passed as `?token=` so that
/// plain links work.
#[utoipa::path(
    get,
    path = "/api/library/{id}/download",
    tag = "library",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library item ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "Library item or file not found")
    )
)]
pub async fn download_item(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let download = state.services.library.download(&claims, id).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        download.file_name.replace(['"', '\\', '\r', '\n'], "_")
    );
    let body = Body::from_stream(ReaderStream::new(download.file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.mime_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, download.size)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e)))
}

/// Upload a document, image, video or audio file
#[utoipa::path(
    post,
    path = "/api/library",
    tag = "library",
    security(("bearer_auth" = [])),
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "`file`, `title`, `description`, `tags` (comma separated), `type`"
    ),
    responses(
        (status = 201, description = "Item created", body = LibraryItemCreated),
        (status = 400, description = "No file, unsupported type or file too large")
    )
)]
pub async fn upload_item(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = read_multipart(multipart, "file").await?;

    let kind = form
        .text("type")
        .map(|t| t.parse::<MediaKind>().map_err(AppError::Validation))
        .transpose()?;
    let details = LibraryUploadForm {
        title: form.text("title"),
        description: form.text("description"),
        tags: form.text("tags").map(|t| parse_tags(&t)).unwrap_or_default(),
        kind,
    };
    let file = if form.files.is_empty() {
        None
    } else {
        Some(form.files.swap_remove(0))
    };

    let item_id = state.services.library.upload(&claims, details, file).await?;

    Ok((
        StatusCode::CREATED,
        Json(LibraryItemCreated {
            message: "File uploaded successfully".to_string(),
            item_id,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/library/{id}",
    tag = "library",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library item ID")
    ),
    request_body = UpdateLibraryItem,
    responses(
        (status = 200, description = "Item updated", body = LibraryItem),
        (status = 400, description = "No fields to update"),
        (status = 404, description = "Library item not found")
    )
)]
pub async fn update_item(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(update): Json<UpdateLibraryItem>,
) -> AppResult<Json<LibraryItem>> {
    Ok(Json(state.services.library.update(&claims, id, update).await?))
}

/// Delete an item and its stored file
#[utoipa::path(
    delete,
    path = "/api/library/{id}",
    tag = "library",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library item ID")
    ),
    responses(
        (status = 200, description = "Item deleted", body = MessageResponse),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Library item not found")
    )
)]
pub async fn delete_item(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_staff()?;

    state.services.library.delete(&claims, id).await?;
    Ok(Json(MessageResponse::ok("Library item deleted successfully")))
}
