//! Users repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{types::Json, MySql, Pool};

use super::{inserted_id, like_pattern};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{Role, UserStatus},
        settings::{Preferences, SettingsRow},
        user::{UpdateUser, User, UserQuery, UserRecord, UserStats},
    },
};

const USER_COLUMNS: &str =
    "id, name, email, phone, role, status, department, email_verified, created_at, last_login";

/// Account to insert, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
    pub role: Role,
    pub status: UserStatus,
    pub department: Option<&'a str>,
    pub email_verified: bool,
    /// SHA-256 hex digest of the emailed token
    pub verification_token: Option<&'a str>,
    pub token_expiry: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<MySql>,
}

impl UsersRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Get the full record, credentials included
    pub async fn get_record(&self, id: i32) -> AppResult<UserRecord> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER(?)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Get the unverified account owning a verification token digest
    pub async fn get_by_verification_token(&self, digest: &str) -> AppResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT * FROM users WHERE verification_token = ? AND email_verified = FALSE",
        )
        .bind(digest)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE LOWER(email) = LOWER(?)")
                .bind(email.trim())
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Search users with pagination
    pub async fn search(&self, query: &UserQuery, limit: i64, offset: i64) -> AppResult<(Vec<User>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(role) = query.role {
            conditions.push("role = ?".to_string());
            params.push(role.as_str().to_string());
        }

        if let Some(status) = query.status {
            conditions.push("status = ?".to_string());
            params.push(status.as_str().to_string());
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            conditions.push("(name LIKE ? OR email LIKE ?)".to_string());
            params.push(like_pattern(search));
            params.push(like_pattern(search));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT {} FROM users {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            USER_COLUMNS, where_clause
        );
        let mut select_builder = sqlx::query_as::<_, User>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let users = select_builder
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((users, total))
    }

    /// Counters by status and role
    pub async fn stats(&self) -> AppResult<UserStats> {
        let stats = sqlx::query_as::<_, UserStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                CAST(COALESCE(SUM(CASE WHEN status = 'Active' THEN 1 ELSE 0 END), 0) AS SIGNED) AS active,
                CAST(COALESCE(SUM(CASE WHEN status = 'Inactive' THEN 1 ELSE 0 END), 0) AS SIGNED) AS inactive,
                CAST(COALESCE(SUM(CASE WHEN status = 'Pending' THEN 1 ELSE 0 END), 0) AS SIGNED) AS pending,
                CAST(COALESCE(SUM(CASE WHEN role = 'Admin' THEN 1 ELSE 0 END), 0) AS SIGNED) AS admins,
                CAST(COALESCE(SUM(CASE WHEN role = 'Moderator' THEN 1 ELSE 0 END), 0) AS SIGNED) AS moderators,
                CAST(COALESCE(SUM(CASE WHEN role = 'User' THEN 1 ELSE 0 END), 0) AS SIGNED) AS regular_users
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Create a new user, returning its id
    pub async fn create(&self, user: &NewUser<'_>) -> AppResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                name, email, password, phone, role, status, department,
                email_verified, verification_token, token_expiry
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.name.trim())
        .bind(user.email.trim())
        .bind(user.password_hash)
        .bind(user.phone)
        .bind(user.role)
        .bind(user.status)
        .bind(user.department)
        .bind(user.email_verified)
        .bind(user.verification_token)
        .bind(user.token_expiry)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from(e).on_duplicate("Email already exists"))?;

        inserted_id(result.last_insert_id())
    }

    /// Update an existing user
    pub async fn update(&self, id: i32, user: &UpdateUser) -> AppResult<()> {
        let mut sets = Vec::new();

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ?", $name));
                }
            };
        }

        add_field!(user.name, "name");
        add_field!(user.phone, "phone");
        add_field!(user.role, "role");
        add_field!(user.status, "status");
        add_field!(user.department, "department");

        if sets.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        let query = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let mut builder = sqlx::query(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(user.name);
        bind_field!(user.phone);
        bind_field!(user.role);
        bind_field!(user.status);
        bind_field!(user.department);

        let result = builder.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            self.get_by_id(id).await?;
        }
        Ok(())
    }

    pub async fn update_password(&self, id: i32, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    pub async fn touch_last_login(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace the pending verification token
    pub async fn set_verification_token(
        &self,
        id: i32,
        digest: &str,
        expiry: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET verification_token = ?, token_expiry = ? WHERE id = ?")
            .bind(digest)
            .bind(expiry)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mark the email verified and activate the account
    pub async fn mark_verified(&self, id: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET email_verified = TRUE, verification_token = NULL, token_expiry = NULL, status = ?
            WHERE id = ?
            "#,
        )
        .bind(UserStatus::Active)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a user
    pub async fn delete(&self, id: i32) -> AppResult<String> {
        let name: String = sqlx::query_scalar("SELECT name FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(name)
    }

    pub async fn settings(&self, id: i32) -> AppResult<SettingsRow> {
        sqlx::query_as::<_, SettingsRow>(
            "SELECT name, email, phone, department, role, created_at, preferences FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Overwrite name, phone and department; absent optionals are cleared
    pub async fn update_profile(
        &self,
        id: i32,
        name: &str,
        phone: Option<&str>,
        department: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET name = ?, phone = ?, department = ? WHERE id = ?")
            .bind(name.trim())
            .bind(phone.filter(|p| !p.trim().is_empty()))
            .bind(department.filter(|d| !d.trim().is_empty()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            self.get_by_id(id).await?;
        }
        Ok(())
    }

    pub async fn set_preferences(&self, id: i32, preferences: &Preferences) -> AppResult<()> {
        sqlx::query("UPDATE users SET preferences = ? WHERE id = ?")
            .bind(Json(preferences))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
