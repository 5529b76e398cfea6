//! Uploaded file storage on the local filesystem

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::{
    config::UploadsConfig,
    error::{AppError, AppResult},
};

/// Extensions and MIME subtypes accepted for library uploads
static LIBRARY_FILE_TYPES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(jpeg|jpg|png|gif|pdf|doc|docx|mp4|mov|avi|mp3|wav)$")
        .expect("library file type pattern")
});

/// A file written to the uploads directory
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub original_name: String,
    /// Path relative to the uploads root, e.g. `library/<uuid>.pdf`
    pub relative_path: String,
    pub size: i64,
    pub mime_type: String,
}

#[derive(Clone)]
pub struct StorageService {
    root: PathBuf,
    max_file_size: u64,
    max_files: usize,
}

impl StorageService {
    pub fn new(config: &UploadsConfig) -> Self {
        Self {
            root: PathBuf::from(&config.directory),
            max_file_size: config.max_file_size_bytes,
            max_files: config.max_files_per_request,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// The extension must be in the accepted list, and the MIME type must
    /// agree with it: either its subtype is accepted too or it is the type
    /// guessed from the extension.
    pub fn check_library_type(file_name: &str, mime_type: &str) -> AppResult<()> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let subtype = mime_type.rsplit('/').next().unwrap_or_default();
        let mime_agrees = LIBRARY_FILE_TYPES.is_match(subtype)
            || mime_guess::from_ext(extension)
                .iter()
                .any(|guess| guess.essence_str().eq_ignore_ascii_case(mime_type));

        if LIBRARY_FILE_TYPES.is_match(extension) && mime_agrees {
            Ok(())
        } else {
            Err(AppError::Validation(
                "Invalid file type. Only images, documents, videos and audio files are allowed."
                    .to_string(),
            ))
        }
    }

    /// MIME type from the client, or guessed from the file name
    pub fn resolve_mime(file_name: &str, declared: Option<&str>) -> String {
        declared
            .filter(|m| !m.is_empty() && *m != "application/octet-stream")
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(file_name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            })
    }

    /// Write `data` under `subdir` with a fresh unique name
    pub async fn save(
        &self,
        subdir: &str,
        original_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> AppResult<StoredFile> {
        if data.len() as u64 > self.max_file_size {
            return Err(AppError::Validation(format!(
                "File {} exceeds the {} byte limit",
                original_name, self.max_file_size
            )));
        }

        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();
        let file_name = format!("{}{}", uuid::Uuid::new_v4(), extension);

        let dir = self.root.join(subdir);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {}", e)))?;
        tokio::fs::write(dir.join(&file_name), data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store file: {}", e)))?;

        tracing::debug!(file = %file_name, size = data.len(), "Stored upload");

        Ok(StoredFile {
            original_name: original_name.to_string(),
            relative_path: format!("{}/{}", subdir, file_name),
            size: data.len() as i64,
            mime_type: mime_type.to_string(),
        })
    }

    /// Absolute location of a stored file, refusing paths leaving the root
    pub fn resolve(&self, relative_path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(relative_path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(AppError::NotFound("File not found on server".to_string()));
        }
        Ok(self.root.join(relative))
    }

    pub async fn exists(&self, relative_path: &str) -> bool {
        match self.resolve(relative_path) {
            Ok(path) => tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Remove a stored file; a file already gone is not an error
    pub async fn remove(&self, relative_path: &str) {
        let Ok(path) = self.resolve(relative_path) else {
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), "Failed to remove file: {}", e),
        }
    }

    /// Open a stored file for streaming
    pub async fn open(&self, relative_path: &str) -> AppResult<tokio::fs::File> {
        let path = self.resolve(relative_path)?;
        tokio::fs::File::open(&path)
            .await
            .map_err(|_| AppError::NotFound("File not found on server".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &Path, max: u64) -> StorageService {
        StorageService::new(&UploadsConfig {
            directory: dir.to_string_lossy().to_string(),
            max_file_size_bytes: max,
            max_files_per_request: 10,
        })
    }

    #[test]
    fn test_library_type_check() {
        assert!(StorageService::check_library_type("report.pdf", "application/pdf").is_ok());
        assert!(StorageService::check_library_type("photo.JPG", "image/jpeg").is_ok());
        assert!(StorageService::check_library_type("song.mp3", "audio/mpeg").is_ok());
        assert!(StorageService::check_library_type(
            "letter.docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        )
        .is_ok());
        assert!(StorageService::check_library_type("script.sh", "text/x-sh").is_err());
        assert!(StorageService::check_library_type("fake.pdf", "text/plain").is_err());
    }

    #[test]
    fn test_resolve_mime() {
        assert_eq!(StorageService::resolve_mime("a.png", None), "image/png");
        assert_eq!(
            StorageService::resolve_mime("a.png", Some("application/octet-stream")),
            "image/png"
        );
        assert_eq!(StorageService::resolve_mime("a.bin", Some("text/csv")), "text/csv");
    }

    #[tokio::test]
    async fn test_save_open_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 1024);

        let stored = storage
            .save("library", "Notes.TXT", "text/plain", b"hello")
            .await
            .unwrap();
        assert!(stored.relative_path.starts_with("library/"));
        assert!(stored.relative_path.ends_with(".txt"));
        assert_eq!(stored.size, 5);
        assert!(storage.exists(&stored.relative_path).await);

        let content = tokio::fs::read(storage.resolve(&stored.relative_path).unwrap())
            .await
            .unwrap();
        assert_eq!(content, b"hello");

        storage.remove(&stored.relative_path).await;
        assert!(!storage.exists(&stored.relative_path).await);
        // Second removal is a no-op
        storage.remove(&stored.relative_path).await;
        assert!(storage.open(&stored.relative_path).await.is_err());
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 4);
        let result = storage.save("assets", "big.pdf", "application/pdf", b"12345").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_resolve_refuses_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 4);
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("library/../../x").is_err());
        assert!(storage.resolve("library/file.pdf").is_ok());
    }
}
