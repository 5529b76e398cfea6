//! Assets repository

use sqlx::{types::Json, MySql, Pool};

use super::{inserted_id, like_pattern};
use crate::{
    error::{AppError, AppResult},
    models::asset::{
        Asset, AssetExportRow, AssetQuery, AssetStats, AssetSummary, NewAsset, UpdateAsset,
    },
};

const DUPLICATE_ASSET_NUMBER: &str =
    "Asset number already exists. Please use a unique asset number.";

const SELECT_WITH_NAMES: &str = r#"
    SELECT a.*,
        u.name AS assigned_to_name,
        creator.name AS created_by_name
    FROM assets a
    LEFT JOIN users u ON a.assigned_to = u.id
    LEFT JOIN users creator ON a.created_by = creator.id
"#;

#[derive(Clone)]
pub struct AssetsRepository {
    pool: Pool<MySql>,
}

impl AssetsRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// Filtered, sorted page of assets
    pub async fn list(&self, query: &AssetQuery, limit: i64, offset: i64) -> AppResult<(Vec<Asset>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref category) = query.category {
            conditions.push("a.category = ?");
            params.push(category.clone());
        }
        if let Some(ref status) = query.status {
            conditions.push("a.status = ?");
            params.push(status.clone());
        }
        if let Some(ref distribution) = query.distribution_status {
            conditions.push("a.distribution_status = ?");
            params.push(distribution.clone());
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            conditions.push(
                "(a.name LIKE ? OR a.description LIKE ? OR a.asset_number LIKE ? \
                 OR a.serial_number LIKE ? OR a.computer_name LIKE ?)",
            );
            let pattern = like_pattern(search);
            params.extend(std::iter::repeat(pattern).take(5));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM assets a {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} {} ORDER BY {} LIMIT ? OFFSET ?",
            SELECT_WITH_NAMES,
            where_clause,
            query.order_by()
        );
        let mut builder = sqlx::query_as::<_, Asset>(&select_query);
        for param in &params {
            builder = builder.bind(param);
        }
        let assets = builder.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        Ok((assets, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Asset> {
        let query = format!("{} WHERE a.id = ?", SELECT_WITH_NAMES);
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Asset not found".to_string()))
    }

    /// Insert an asset, returning its id
    pub async fn create(&self, asset: &NewAsset, created_by: i32) -> AppResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO assets (
                name, type, category, status, value, assigned_to, location,
                purchase_date, last_maintenance, description, tags, created_by,
                asset_number, serial_number, model, computer_name,
                owner_name, owner_department, distribution_status, notes,
                file_path, file_size, mime_type
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&asset.name)
        .bind(&asset.asset_type)
        .bind(&asset.category)
        .bind(&asset.status)
        .bind(asset.value)
        .bind(asset.assigned_to)
        .bind(&asset.location)
        .bind(asset.purchase_date)
        .bind(asset.last_maintenance)
        .bind(&asset.description)
        .bind(Json(&asset.tags))
        .bind(created_by)
        .bind(&asset.asset_number)
        .bind(&asset.serial_number)
        .bind(&asset.model)
        .bind(&asset.computer_name)
        .bind(&asset.owner_name)
        .bind(&asset.owner_department)
        .bind(&asset.distribution_status)
        .bind(&asset.notes)
        .bind(&asset.file_path)
        .bind(asset.file_size)
        .bind(&asset.mime_type)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from(e).on_duplicate(DUPLICATE_ASSET_NUMBER))?;

        inserted_id(result.last_insert_id())
    }

    /// Apply a partial update. The caller guarantees at least one field.
    pub async fn update(&self, id: i32, data: &UpdateAsset) -> AppResult<()> {
        let mut sets: Vec<String> = data
            .fields()
            .into_iter()
            .map(|column| format!("`{}` = ?", column))
            .collect();
        if sets.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        sets.push("updated_at = CURRENT_TIMESTAMP".to_string());

        let query = format!("UPDATE assets SET {} WHERE id = ?", sets.join(", "));
        let mut builder = sqlx::query(&query);

        // Same order as UpdateAsset::fields
        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.name);
        bind_field!(data.asset_type);
        bind_field!(data.category);
        bind_field!(data.status);
        bind_field!(data.value);
        bind_field!(data.assigned_to);
        bind_field!(data.location);
        bind_field!(data.purchase_date);
        bind_field!(data.last_maintenance);
        bind_field!(data.description);
        if let Some(ref tags) = data.tags {
            builder = builder.bind(Json(tags));
        }
        bind_field!(data.asset_number);
        bind_field!(data.serial_number);
        bind_field!(data.model);
        bind_field!(data.computer_name);
        bind_field!(data.owner_name);
        bind_field!(data.owner_department);
        bind_field!(data.distribution_status);
        bind_field!(data.notes);

        builder
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from(e).on_duplicate(DUPLICATE_ASSET_NUMBER))?;
        Ok(())
    }

    /// Delete an asset, returning its name and number
    pub async fn delete(&self, id: i32) -> AppResult<(String, Option<String>)> {
        let existing: (String, Option<String>) =
            sqlx::query_as("SELECT name, asset_number FROM assets WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Asset not found".to_string()))?;

        sqlx::query("DELETE FROM assets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(existing)
    }

    pub async fn stats(&self) -> AppResult<AssetStats> {
        let stats = sqlx::query_as::<_, AssetStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                CAST(COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0) AS SIGNED) AS active,
                CAST(COALESCE(SUM(CASE WHEN status = 'inactive' THEN 1 ELSE 0 END), 0) AS SIGNED) AS inactive,
                CAST(COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS SIGNED) AS pending,
                CAST(COALESCE(SUM(CASE WHEN status = 'maintenance' THEN 1 ELSE 0 END), 0) AS SIGNED) AS maintenance,
                CAST(COALESCE(SUM(CASE WHEN status = 'retired' THEN 1 ELSE 0 END), 0) AS SIGNED) AS retired,
                CAST(COALESCE(SUM(CASE WHEN status = 'disposed' THEN 1 ELSE 0 END), 0) AS SIGNED) AS disposed,
                CAST(COALESCE(SUM(CASE WHEN distribution_status = 'available' THEN 1 ELSE 0 END), 0) AS SIGNED) AS available,
                CAST(COALESCE(SUM(CASE WHEN distribution_status = 'assigned' THEN 1 ELSE 0 END), 0) AS SIGNED) AS assigned,
                CAST(COALESCE(SUM(CASE WHEN distribution_status = 'reserved' THEN 1 ELSE 0 END), 0) AS SIGNED) AS reserved,
                CAST(COALESCE(SUM(CASE WHEN distribution_status = 'in_repair' THEN 1 ELSE 0 END), 0) AS SIGNED) AS in_repair,
                CAST(COALESCE(SUM(CASE WHEN distribution_status = 'lost' THEN 1 ELSE 0 END), 0) AS SIGNED) AS lost,
                CAST(COALESCE(SUM(CASE WHEN distribution_status = 'damaged' THEN 1 ELSE 0 END), 0) AS SIGNED) AS damaged,
                COALESCE(SUM(value), 0) AS total_value,
                COUNT(DISTINCT category) AS categories,
                COUNT(DISTINCT type) AS types
            FROM assets
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Up to 20 matches on identifying fields
    pub async fn search(&self, term: &str) -> AppResult<Vec<AssetSummary>> {
        let pattern = like_pattern(term);
        let rows = sqlx::query_as::<_, AssetSummary>(
            r#"
            SELECT id, name, asset_number, serial_number, category, status,
                   location, assigned_to, distribution_status
            FROM assets
            WHERE name LIKE ?
               OR asset_number LIKE ?
               OR serial_number LIKE ?
               OR computer_name LIKE ?
               OR model LIKE ?
               OR owner_name LIKE ?
            LIMIT 20
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every asset, newest first, for the CSV export
    pub async fn export_rows(&self) -> AppResult<Vec<AssetExportRow>> {
        let rows = sqlx::query_as::<_, AssetExportRow>(
            r#"
            SELECT
                a.asset_number, a.name, a.serial_number, a.model, a.computer_name,
                a.category, a.type, a.status, a.distribution_status, a.value,
                a.location, a.purchase_date, a.owner_name, a.owner_department,
                u.name AS assigned_to_name, a.description, a.notes,
                a.created_at, a.updated_at
            FROM assets a
            LEFT JOIN users u ON a.assigned_to = u.id
            ORDER BY a.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
