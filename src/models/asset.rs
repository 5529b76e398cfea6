//! Asset models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Columns accepted by the `sortBy` list parameter
pub const SORTABLE_COLUMNS: [&str; 6] = [
    "name",
    "created_at",
    "updated_at",
    "purchase_date",
    "value",
    "asset_number",
];

/// Asset record with the names of the assignee and creator
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Asset {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub asset_type: String,
    pub category: String,
    pub status: String,
    #[schema(value_type = f64)]
    pub value: Decimal,
    pub assigned_to: Option<i32>,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub last_maintenance: Option<NaiveDate>,
    pub description: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Option<Json<Vec<String>>>,
    pub asset_number: Option<String>,
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub computer_name: Option<String>,
    pub owner_name: Option<String>,
    pub owner_department: Option<String>,
    pub distribution_status: String,
    pub notes: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assigned_to_name: Option<String>,
    pub created_by_name: Option<String>,
}

/// Compact search hit
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AssetSummary {
    pub id: i32,
    pub name: String,
    pub asset_number: Option<String>,
    pub serial_number: Option<String>,
    pub category: String,
    pub status: String,
    pub location: Option<String>,
    pub assigned_to: Option<i32>,
    pub distribution_status: String,
}

/// Asset list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "distribution_status")]
    pub distribution_status: Option<String>,
    /// Matches name, description, asset number, serial number, computer name
    pub search: Option<String>,
    /// One of name, created_at, updated_at, purchase_date, value, asset_number
    pub sort_by: Option<String>,
    /// ASC or DESC
    pub sort_order: Option<String>,
}

impl AssetQuery {
    /// Resolved ORDER BY clause, falling back to `created_at DESC`
    pub fn order_by(&self) -> String {
        let column = self
            .sort_by
            .as_deref()
            .filter(|c| SORTABLE_COLUMNS.contains(c))
            .unwrap_or("created_at");
        let direction = match self.sort_order.as_deref() {
            Some(o) if o.eq_ignore_ascii_case("asc") => "ASC",
            _ => "DESC",
        };
        format!("a.{} {}", column, direction)
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct AssetSearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssetList {
    pub assets: Vec<Asset>,
    pub pagination: super::Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssetSearchResults {
    pub assets: Vec<AssetSummary>,
}

/// Create asset request. `asset_name` is accepted as a legacy alias of `name`.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateAsset {
    #[validate(length(min = 1, max = 255, message = "Asset name must not be empty"))]
    pub name: Option<String>,
    pub asset_name: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub value: Option<Decimal>,
    pub assigned_to: Option<i32>,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub last_maintenance: Option<NaiveDate>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub asset_number: Option<String>,
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub computer_name: Option<String>,
    pub owner_name: Option<String>,
    pub owner_department: Option<String>,
    pub distribution_status: Option<String>,
    pub notes: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
}

impl CreateAsset {
    /// `name`, or `asset_name` when `name` is absent or blank
    pub fn resolved_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.asset_name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Insertable asset with every default applied
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub asset_type: String,
    pub category: String,
    pub status: String,
    pub value: Decimal,
    pub assigned_to: Option<i32>,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub last_maintenance: Option<NaiveDate>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub asset_number: Option<String>,
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub computer_name: Option<String>,
    pub owner_name: Option<String>,
    pub owner_department: Option<String>,
    pub distribution_status: String,
    pub notes: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
}

impl NewAsset {
    pub fn from_request(name: String, data: CreateAsset) -> Self {
        Self {
            name,
            asset_type: data.asset_type.unwrap_or_else(|| "other".to_string()),
            category: data.category.unwrap_or_else(|| "general".to_string()),
            status: data.status.unwrap_or_else(|| "active".to_string()),
            value: data.value.unwrap_or(Decimal::ZERO),
            assigned_to: data.assigned_to,
            location: data.location,
            purchase_date: data.purchase_date,
            last_maintenance: data.last_maintenance,
            description: data.description,
            tags: data.tags.unwrap_or_default(),
            asset_number: data.asset_number.filter(|n| !n.trim().is_empty()),
            serial_number: data.serial_number,
            model: data.model,
            computer_name: data.computer_name,
            owner_name: data.owner_name,
            owner_department: data.owner_department,
            distribution_status: data
                .distribution_status
                .unwrap_or_else(|| "available".to_string()),
            notes: data.notes,
            file_path: data.file_path,
            file_size: data.file_size,
            mime_type: data.mime_type,
        }
    }
}

/// Partial asset update
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAsset {
    #[validate(length(min = 1, max = 255, message = "Asset name must not be empty"))]
    pub name: Option<String>,
    pub asset_name: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub value: Option<Decimal>,
    pub assigned_to: Option<i32>,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub last_maintenance: Option<NaiveDate>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub asset_number: Option<String>,
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub computer_name: Option<String>,
    pub owner_name: Option<String>,
    pub owner_department: Option<String>,
    pub distribution_status: Option<String>,
    pub notes: Option<String>,
}

impl UpdateAsset {
    /// Fold the legacy `asset_name` alias into `name`
    pub fn normalize(mut self) -> Self {
        if let Some(alias) = self.asset_name.take() {
            self.name = Some(alias);
        }
        self
    }

    /// Names of the columns this update touches, in a stable order
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        macro_rules! touched {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    fields.push($name);
                }
            };
        }
        touched!(self.name, "name");
        touched!(self.asset_type, "type");
        touched!(self.category, "category");
        touched!(self.status, "status");
        touched!(self.value, "value");
        touched!(self.assigned_to, "assigned_to");
        touched!(self.location, "location");
        touched!(self.purchase_date, "purchase_date");
        touched!(self.last_maintenance, "last_maintenance");
        touched!(self.description, "description");
        touched!(self.tags, "tags");
        touched!(self.asset_number, "asset_number");
        touched!(self.serial_number, "serial_number");
        touched!(self.model, "model");
        touched!(self.computer_name, "computer_name");
        touched!(self.owner_name, "owner_name");
        touched!(self.owner_department, "owner_department");
        touched!(self.distribution_status, "distribution_status");
        touched!(self.notes, "notes");
        fields
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetUpdated {
    pub message: String,
    pub updated_fields: Vec<String>,
}

/// Asset counters by status and distribution status
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct AssetStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub pending: i64,
    pub maintenance: i64,
    pub retired: i64,
    pub disposed: i64,
    pub available: i64,
    pub assigned: i64,
    pub reserved: i64,
    pub in_repair: i64,
    pub lost: i64,
    pub damaged: i64,
    #[schema(value_type = f64)]
    pub total_value: Decimal,
    pub categories: i64,
    pub types: i64,
}

/// Row of the CSV export
#[derive(Debug, Clone, FromRow)]
pub struct AssetExportRow {
    pub asset_number: Option<String>,
    pub name: String,
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub computer_name: Option<String>,
    pub category: String,
    #[sqlx(rename = "type")]
    pub asset_type: String,
    pub status: String,
    pub distribution_status: String,
    pub value: Decimal,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub owner_name: Option<String>,
    pub owner_department: Option<String>,
    pub assigned_to_name: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const EXPORT_HEADERS: [&str; 19] = [
    "Asset Number",
    "Name",
    "Serial Number",
    "Model",
    "Computer Name",
    "Category",
    "Type",
    "Status",
    "Distribution Status",
    "Value",
    "Location",
    "Purchase Date",
    "Owner Name",
    "Owner Department",
    "Assigned To",
    "Description",
    "Notes",
    "Created At",
    "Updated At",
];

impl AssetExportRow {
    pub fn to_record(&self) -> Vec<String> {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        vec![
            text(&self.asset_number),
            self.name.clone(),
            text(&self.serial_number),
            text(&self.model),
            text(&self.computer_name),
            self.category.clone(),
            self.asset_type.clone(),
            self.status.clone(),
            self.distribution_status.clone(),
            self.value.to_string(),
            text(&self.location),
            self.purchase_date.map(|d| d.to_string()).unwrap_or_default(),
            text(&self.owner_name),
            text(&self.owner_department),
            text(&self.assigned_to_name),
            text(&self.description),
            text(&self.notes),
            self.created_at.to_rfc3339(),
            self.updated_at.to_rfc3339(),
        ]
    }
}

/// Multipart upload result entry
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedAsset {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub size: i64,
    pub path: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResult {
    pub message: String,
    pub assets: Vec<UploadedAsset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_whitelist() {
        let query = AssetQuery {
            sort_by: Some("value".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        };
        assert_eq!(query.order_by(), "a.value ASC");

        let injected = AssetQuery {
            sort_by: Some("name; DROP TABLE assets".to_string()),
            sort_order: Some("sideways".to_string()),
            ..Default::default()
        };
        assert_eq!(injected.order_by(), "a.created_at DESC");
    }

    #[test]
    fn test_resolved_name_prefers_name() {
        let both = CreateAsset {
            name: Some("Laptop".to_string()),
            asset_name: Some("Legacy".to_string()),
            ..Default::default()
        };
        assert_eq!(both.resolved_name(), Some("Laptop"));

        let legacy = CreateAsset {
            asset_name: Some("Projector".to_string()),
            ..Default::default()
        };
        assert_eq!(legacy.resolved_name(), Some("Projector"));

        let blank = CreateAsset {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.resolved_name(), None);
    }

    #[test]
    fn test_new_asset_defaults() {
        let asset = NewAsset::from_request("Monitor".to_string(), CreateAsset::default());
        assert_eq!(asset.asset_type, "other");
        assert_eq!(asset.category, "general");
        assert_eq!(asset.status, "active");
        assert_eq!(asset.distribution_status, "available");
        assert_eq!(asset.value, Decimal::ZERO);
        assert!(asset.tags.is_empty());
    }

    #[test]
    fn test_update_fields_follow_alias() {
        let update = UpdateAsset {
            asset_name: Some("Renamed".to_string()),
            location: Some("Room 4".to_string()),
            ..Default::default()
        }
        .normalize();

        assert_eq!(update.name.as_deref(), Some("Renamed"));
        assert_eq!(update.fields(), vec!["name", "location"]);
        assert!(UpdateAsset::default().fields().is_empty());
    }

    #[test]
    fn test_export_record_has_one_cell_per_header() {
        let now = Utc::now();
        let row = AssetExportRow {
            asset_number: Some("A-1".to_string()),
            name: "Desk".to_string(),
            serial_number: None,
            model: None,
            computer_name: None,
            category: "furniture".to_string(),
            asset_type: "other".to_string(),
            status: "active".to_string(),
            distribution_status: "available".to_string(),
            value: Decimal::new(12550, 2),
            location: None,
            purchase_date: None,
            owner_name: None,
            owner_department: None,
            assigned_to_name: None,
            description: Some("Has a \"drawer\", and legs".to_string()),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let record = row.to_record();
        assert_eq!(record.len(), EXPORT_HEADERS.len());
        assert_eq!(record[9], "125.50");
    }
}
