//! Library item models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};

use super::enums::MediaKind;

/// Stored library file with the uploader's name
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LibraryItem {
    pub id: i32,
    pub title: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: MediaKind,
    pub file_size: i64,
    pub file_path: String,
    pub mime_type: Option<String>,
    pub uploaded_by: Option<i32>,
    pub description: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Option<Json<Vec<String>>>,
    pub views: i32,
    pub downloads: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub uploaded_by_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LibraryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    #[param(rename = "type")]
    pub kind: Option<MediaKind>,
    /// Matches title or description
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LibraryList {
    pub items: Vec<LibraryItem>,
    pub pagination: super::Pagination,
}

/// Insertable library item, built from a stored upload
#[derive(Debug, Clone)]
pub struct NewLibraryItem {
    pub title: String,
    pub kind: MediaKind,
    pub file_size: i64,
    pub file_path: String,
    pub mime_type: String,
    pub uploaded_by: i32,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateLibraryItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateLibraryItem {
    /// Blank strings count as absent
    pub fn normalize(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            title: keep(self.title),
            description: keep(self.description),
            tags: self.tags,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.tags.is_none()
    }
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct LibraryStats {
    pub total: i64,
    pub documents: i64,
    pub images: i64,
    pub videos: i64,
    pub audio: i64,
    pub total_size: i64,
    pub total_downloads: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItemCreated {
    pub message: String,
    pub item_id: i32,
}

/// Split a comma separated tag list, dropping blanks
pub fn parse_tags(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(tags) = serde_json::from_str::<Vec<String>>(trimmed) {
            return tags;
        }
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("a, b,,c "), vec!["a", "b", "c"]);
        assert_eq!(parse_tags(r#"["x","y"]"#), vec!["x", "y"]);
        assert!(parse_tags("  ").is_empty());
    }

    #[test]
    fn test_update_normalization() {
        let update = UpdateLibraryItem {
            title: Some("  ".to_string()),
            description: None,
            tags: None,
        }
        .normalize();
        assert!(update.is_empty());

        let update = UpdateLibraryItem {
            title: Some("Handbook".to_string()),
            ..Default::default()
        }
        .normalize();
        assert!(!update.is_empty());
    }
}
