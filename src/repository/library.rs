//! Library items repository

use sqlx::{types::Json, MySql, Pool};

use super::{inserted_id, like_pattern};
use crate::{
    error::{AppError, AppResult},
    models::library::{LibraryItem, LibraryQuery, LibraryStats, NewLibraryItem, UpdateLibraryItem},
};

const SELECT_WITH_UPLOADER: &str = r#"
    SELECT li.*, u.name AS uploaded_by_name
    FROM library_items li
    LEFT JOIN users u ON li.uploaded_by = u.id
"#;

#[derive(Clone)]
pub struct LibraryRepository {
    pool: Pool<MySql>,
}

impl LibraryRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &LibraryQuery, limit: i64, offset: i64) -> AppResult<(Vec<LibraryItem>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(kind) = query.kind {
            conditions.push("li.type = ?");
            params.push(kind.as_str().to_string());
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            conditions.push("(li.title LIKE ? OR li.description LIKE ?)");
            params.push(like_pattern(search));
            params.push(like_pattern(search));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM library_items li {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} {} ORDER BY li.created_at DESC, li.id DESC LIMIT ? OFFSET ?",
            SELECT_WITH_UPLOADER, where_clause
        );
        let mut builder = sqlx::query_as::<_, LibraryItem>(&select_query);
        for param in &params {
            builder = builder.bind(param);
        }
        let items = builder.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        Ok((items, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<LibraryItem> {
        let query = format!("{} WHERE li.id = ?", SELECT_WITH_UPLOADER);
        sqlx::query_as::<_, LibraryItem>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Library item not found".to_string()))
    }

    pub async fn increment_views(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE library_items SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Library item not found".to_string()));
        }
        Ok(())
    }

    pub async fn increment_downloads(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE library_items SET downloads = downloads + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn create(&self, item: &NewLibraryItem) -> AppResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO library_items (title, type, file_size, file_path, mime_type, uploaded_by, description, tags)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.title)
        .bind(item.kind)
        .bind(item.file_size)
        .bind(&item.file_path)
        .bind(&item.mime_type)
        .bind(item.uploaded_by)
        .bind(&item.description)
        .bind(Json(&item.tags))
        .execute(&self.pool)
        .await?;
        inserted_id(result.last_insert_id())
    }

    pub async fn update(&self, id: i32, data: &UpdateLibraryItem) -> AppResult<()> {
        let mut sets = Vec::new();

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ?", $name));
                }
            };
        }

        add_field!(data.title, "title");
        add_field!(data.description, "description");
        add_field!(data.tags, "tags");

        if sets.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        let query = format!("UPDATE library_items SET {} WHERE id = ?", sets.join(", "));
        let mut builder = sqlx::query(&query);
        if let Some(ref title) = data.title {
            builder = builder.bind(title);
        }
        if let Some(ref description) = data.description {
            builder = builder.bind(description);
        }
        if let Some(ref tags) = data.tags {
            builder = builder.bind(Json(tags));
        }

        let result = builder.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            self.get_by_id(id).await?;
        }
        Ok(())
    }

    /// Delete an item, returning its title and stored path
    pub async fn delete(&self, id: i32) -> AppResult<(String, String)> {
        let existing: (String, String) =
            sqlx::query_as("SELECT title, file_path FROM library_items WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Library item not found".to_string()))?;

        sqlx::query("DELETE FROM library_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(existing)
    }

    pub async fn stats(&self) -> AppResult<LibraryStats> {
        let stats = sqlx::query_as::<_, LibraryStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                CAST(COALESCE(SUM(CASE WHEN type = 'document' THEN 1 ELSE 0 END), 0) AS SIGNED) AS documents,
                CAST(COALESCE(SUM(CASE WHEN type = 'image' THEN 1 ELSE 0 END), 0) AS SIGNED) AS images,
                CAST(COALESCE(SUM(CASE WHEN type = 'video' THEN 1 ELSE 0 END), 0) AS SIGNED) AS videos,
                CAST(COALESCE(SUM(CASE WHEN type = 'audio' THEN 1 ELSE 0 END), 0) AS SIGNED) AS audio,
                CAST(COALESCE(SUM(file_size), 0) AS SIGNED) AS total_size,
                CAST(COALESCE(SUM(downloads), 0) AS SIGNED) AS total_downloads
            FROM library_items
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
