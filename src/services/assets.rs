//! Asset records service

use serde_json::json;

use super::{activity::ActivityService, storage::StorageService};
use crate::{
    error::{AppError, AppResult},
    models::{
        activity::NewActivity,
        asset::{
            Asset, AssetList, AssetQuery, AssetStats, AssetSummary, AssetUpdated, CreateAsset,
            NewAsset, UpdateAsset, UploadedAsset, EXPORT_HEADERS,
        },
        enums::MediaKind,
        page_window, Pagination, UserClaims,
    },
    repository::Repository,
};

/// A file received by the asset upload endpoint
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Text fields sent alongside the uploaded files
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub name: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct AssetsService {
    repository: Repository,
    storage: StorageService,
    activity: ActivityService,
}

impl AssetsService {
    pub fn new(repository: Repository, storage: StorageService, activity: ActivityService) -> Self {
        Self {
            repository,
            storage,
            activity,
        }
    }

    pub async fn list(&self, query: &AssetQuery) -> AppResult<AssetList> {
        let (page, limit, offset) = page_window(query.page, query.limit);
        let (assets, total) = self.repository.assets.list(query, limit, offset).await?;
        Ok(AssetList {
            assets,
            pagination: Pagination::new(page, limit, total),
        })
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Asset> {
        self.repository.assets.get_by_id(id).await
    }

    pub async fn stats(&self) -> AppResult<AssetStats> {
        self.repository.assets.stats().await
    }

    pub async fn search(&self, term: Option<&str>) -> AppResult<Vec<AssetSummary>> {
        let term = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("Search query is required".to_string()))?;
        self.repository.assets.search(term).await
    }

    pub async fn create(&self, actor: &UserClaims, req: CreateAsset) -> AppResult<Asset> {
        let name = req
            .resolved_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Asset name is required".to_string()))?;

        let asset = NewAsset::from_request(name, req);
        let id = self.repository.assets.create(&asset, actor.user_id).await?;

        tracing::info!(asset_id = id, name = %asset.name, "Asset created");
        self.activity
            .record(
                NewActivity::new(actor.user_id, "Created new asset", "asset")
                    .entity(id)
                    .details(json!({ "name": asset.name, "asset_number": asset.asset_number })),
            )
            .await;

        self.repository.assets.get_by_id(id).await
    }

    pub async fn update(&self, actor: &UserClaims, id: i32, req: UpdateAsset) -> AppResult<AssetUpdated> {
        let req = req.normalize();
        let fields = req.fields();
        if fields.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        self.repository.assets.get_by_id(id).await?;
        self.repository.assets.update(id, &req).await?;

        let updated_fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        self.activity
            .record(
                NewActivity::new(actor.user_id, "Updated asset", "asset")
                    .entity(id)
                    .details(json!({ "updatedFields": updated_fields })),
            )
            .await;

        Ok(AssetUpdated {
            message: "Asset updated successfully".to_string(),
            updated_fields,
        })
    }

    pub async fn delete(&self, actor: &UserClaims, id: i32) -> AppResult<()> {
        let (name, asset_number) = self.repository.assets.delete(id).await?;
        tracing::info!(asset_id = id, "Asset deleted");
        self.activity
            .record(
                NewActivity::new(actor.user_id, "Deleted asset", "asset")
                    .entity(id)
                    .details(json!({ "name": name, "asset_number": asset_number })),
            )
            .await;
        Ok(())
    }

    /// CSV document of every asset
    pub async fn export_csv(&self) -> AppResult<Vec<u8>> {
        let rows = self.repository.assets.export_rows().await?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(EXPORT_HEADERS)
            .map_err(|e| AppError::Internal(format!("Failed to write CSV: {}", e)))?;
        for row in &rows {
            writer
                .write_record(row.to_record())
                .map_err(|e| AppError::Internal(format!("Failed to write CSV: {}", e)))?;
        }
        writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("Failed to write CSV: {}", e)))
    }

    /// Store each file and create one asset per file
    pub async fn upload(
        &self,
        actor: &UserClaims,
        form: UploadForm,
        files: Vec<IncomingFile>,
    ) -> AppResult<Vec<UploadedAsset>> {
        if files.is_empty() {
            return Err(AppError::Validation("No files uploaded".to_string()));
        }
        if files.len() > self.storage.max_files() {
            return Err(AppError::Validation(format!(
                "At most {} files can be uploaded at once",
                self.storage.max_files()
            )));
        }
        let base_name = form
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::Validation("Asset name is required".to_string()))?
            .to_string();

        let several = files.len() > 1;
        let mut uploaded = Vec::with_capacity(files.len());

        for file in files {
            let mime_type = StorageService::resolve_mime(&file.file_name, file.content_type.as_deref());
            let kind = MediaKind::from_mime(&mime_type);
            let stored = self
                .storage
                .save("assets", &file.file_name, &mime_type, &file.data)
                .await?;

            let name = if several {
                format!("{} - {}", base_name, file.file_name)
            } else {
                base_name.clone()
            };

            let asset = NewAsset::from_request(
                name.clone(),
                CreateAsset {
                    asset_type: Some(kind.as_str().to_string()),
                    category: Some(form.category.clone().unwrap_or_else(|| kind.as_str().to_string())),
                    status: Some("active".to_string()),
                    location: Some("uploads/assets".to_string()),
                    description: form.description.clone(),
                    tags: Some(form.tags.clone()),
                    file_path: Some(stored.relative_path.clone()),
                    file_size: Some(stored.size),
                    mime_type: Some(stored.mime_type.clone()),
                    ..Default::default()
                },
            );

            let id = match self.repository.assets.create(&asset, actor.user_id).await {
                Ok(id) => id,
                Err(e) => {
                    self.storage.remove(&stored.relative_path).await;
                    return Err(e);
                }
            };

            self.activity
                .record(
                    NewActivity::new(actor.user_id, "Uploaded new asset", "asset")
                        .entity(id)
                        .details(json!({ "name": name, "file": file.file_name })),
                )
                .await;

            uploaded.push(UploadedAsset {
                id,
                name,
                asset_type: kind.as_str().to_string(),
                size: stored.size,
                path: format!("/uploads/{}", stored.relative_path),
            });
        }

        tracing::info!(count = uploaded.len(), "Assets uploaded");
        Ok(uploaded)
    }
}
