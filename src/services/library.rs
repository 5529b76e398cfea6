//! Library of shared documents and media files

use serde_json::json;

use super::{
    activity::ActivityService,
    assets::IncomingFile,
    storage::StorageService,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        activity::NewActivity,
        enums::MediaKind,
        library::{LibraryItem, LibraryList, LibraryQuery, LibraryStats, NewLibraryItem, UpdateLibraryItem},
        page_window, Pagination, UserClaims,
    },
    repository::Repository,
};

/// Metadata sent with a library upload
#[derive(Debug, Clone, Default)]
pub struct LibraryUploadForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub kind: Option<MediaKind>,
}

/// An opened stored file, ready to stream
pub struct Download {
    pub file: tokio::fs::File,
    pub file_name: String,
    pub mime_type: String,
    pub size: i64,
}

#[derive(Clone)]
pub struct LibraryService {
    repository: Repository,
    storage: StorageService,
    activity: ActivityService,
}

impl LibraryService {
    pub fn new(repository: Repository, storage: StorageService, activity: ActivityService) -> Self {
        Self {
            repository,
            storage,
            activity,
        }
    }

    pub async fn list(&self, query: &LibraryQuery) -> AppResult<LibraryList> {
        let (page, limit, offset) = page_window(query.page, query.limit);
        let (items, total) = self.repository.library.list(query, limit, offset).await?;
        Ok(LibraryList {
            items,
            pagination: Pagination::new(page, limit, total),
        })
    }

    pub async fn stats(&self) -> AppResult<LibraryStats> {
        self.repository.library.stats().await
    }

    /// Fetch an item, counting the view
    pub async fn view(&self, id: i32) -> AppResult<LibraryItem> {
        self.repository.library.increment_views(id).await?;
        self.repository.library.get_by_id(id).await
    }

    /// Open the stored file of an item, counting the download
    pub async fn download(&self, actor: &UserClaims, id: i32) -> AppResult<Download> {
        let item = self.repository.library.get_by_id(id).await?;
        if !self.storage.exists(&item.file_path).await {
            tracing::warn!(item_id = id, path = %item.file_path, "Library file missing on disk");
            return Err(AppError::NotFound("File not found on server".to_string()));
        }
        let file = self.storage.open(&item.file_path).await?;

        self.repository.library.increment_downloads(id).await?;
        self.activity
            .record(NewActivity::new(actor.user_id, "Downloaded library item", "library").entity(id))
            .await;

        let extension = std::path::Path::new(&item.file_path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let file_name = if item.title.contains('.') {
            item.title.clone()
        } else {
            format!("{}{}", item.title, extension)
        };

        Ok(Download {
            file,
            file_name,
            mime_type: item
                .mime_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size: item.file_size,
        })
    }

    pub async fn upload(
        &self,
        actor: &UserClaims,
        form: LibraryUploadForm,
        file: Option<IncomingFile>,
    ) -> AppResult<i32> {
        let file = file.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
        let mime_type = StorageService::resolve_mime(&file.file_name, file.content_type.as_deref());
        StorageService::check_library_type(&file.file_name, &mime_type)?;

        let stored = self
            .storage
            .save("library", &file.file_name, &mime_type, &file.data)
            .await?;

        let title = form
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| file.file_name.clone());

        let item = NewLibraryItem {
            title,
            kind: form.kind.unwrap_or_else(|| MediaKind::from_mime(&mime_type)),
            file_size: stored.size,
            file_path: stored.relative_path.clone(),
            mime_type,
            uploaded_by: actor.user_id,
            description: form.description.filter(|d| !d.trim().is_empty()),
            tags: form.tags,
        };

        let id = match self.repository.library.create(&item).await {
            Ok(id) => id,
            Err(e) => {
                self.storage.remove(&stored.relative_path).await;
                return Err(e);
            }
        };

        tracing::info!(item_id = id, title = %item.title, "Library item uploaded");
        self.activity
            .record(
                NewActivity::new(actor.user_id, "Uploaded library item", "library")
                    .entity(id)
                    .details(json!({ "title": item.title, "type": item.kind })),
            )
            .await;

        Ok(id)
    }

    pub async fn update(&self, actor: &UserClaims, id: i32, req: UpdateLibraryItem) -> AppResult<LibraryItem> {
        let req = req.normalize();
        if req.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        self.repository.library.update(id, &req).await?;
        self.activity
            .record(NewActivity::new(actor.user_id, "Updated library item", "library").entity(id))
            .await;

        self.repository.library.get_by_id(id).await
    }

    /// Delete an item and its stored file
    pub async fn delete(&self, actor: &UserClaims, id: i32) -> AppResult<()> {
        let (title, file_path) = self.repository.library.delete(id).await?;
        self.storage.remove(&file_path).await;

        tracing::info!(item_id = id, "Library item deleted");
        self.activity
            .record(
                NewActivity::new(actor.user_id, "Deleted library item", "library")
                    .entity(id)
                    .details(json!({ "title": title })),
            )
            .await;
        Ok(())
    }
}
