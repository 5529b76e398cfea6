//! Multipart asset upload endpoint

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::Multipart;

use crate::{
    error::{AppError, AppResult},
    models::{asset::UploadResult, library::parse_tags},
    services::assets::{IncomingFile, UploadForm},
};

use super::AuthenticatedUser;

/// Text fields and files of a multipart body
pub(super) struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<IncomingFile>,
}

impl MultipartForm {
    /// Non-blank text field
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Drain a multipart body. Parts named `file_field` become files, the
/// others are read as text.
pub(super) async fn read_multipart(mut multipart: Multipart, file_field: &str) -> AppResult<MultipartForm> {
    let mut form = MultipartForm {
        fields: HashMap::new(),
        files: Vec::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
            if data.is_empty() {
                continue;
            }
            form.files.push(IncomingFile {
                file_name,
                content_type,
                data: data.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid field {}: {}", name, e)))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Upload files and create one asset per file
#[utoipa::path(
    post,
    path = "/api/upload/assets",
    tag = "assets",
    security(("bearer_auth" = [])),
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "`files` (up to 10), `name`, `category`, `tags` (comma separated), `description`"
    ),
    responses(
        (status = 201, description = "Assets created", body = UploadResult),
        (status = 400, description = "No files, missing name or file too large")
    )
)]
pub async fn upload_assets(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResult>)> {
    let form = read_multipart(multipart, "files").await?;

    let details = UploadForm {
        name: form.text("name"),
        category: form.text("category"),
        tags: form.text("tags").map(|t| parse_tags(&t)).unwrap_or_default(),
        description: form.text("description"),
    };

    let assets = state
        .services
        .assets
        .upload(&claims, details, form.files)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResult {
            message: format!("{} file(s) uploaded successfully", assets.len()),
            assets,
        }),
    ))
}
