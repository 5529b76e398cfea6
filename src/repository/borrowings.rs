//! Device stock and borrowings repository
//!
//! Reads go through the pool. The borrow, return and stock adjustment flows
//! take a connection from an open transaction so that the service controls
//! the commit.

use sqlx::{MySql, MySqlConnection, Pool};

use super::{inserted_id, like_pattern};
use crate::{
    error::{AppError, AppResult},
    models::{
        borrowing::{Borrowing, BorrowingQuery, BorrowingStats, DeviceStock, NewBorrowing, StockLevels},
        enums::BorrowingStatus,
    },
};

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<MySql>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// Begin a transaction on the shared pool
    pub async fn begin(&self) -> AppResult<sqlx::Transaction<'static, MySql>> {
        Ok(self.pool.begin().await?)
    }

    /// Paginated borrowings, newest first
    pub async fn list(&self, query: &BorrowingQuery, limit: i64, offset: i64) -> AppResult<(Vec<Borrowing>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(status) = query.status {
            conditions.push("status = ?");
            params.push(status.as_str().to_string());
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            conditions.push("(employee_name LIKE ? OR device_name LIKE ?)");
            params.push(like_pattern(search));
            params.push(like_pattern(search));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM borrowings {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT * FROM borrowings {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            where_clause
        );
        let mut builder = sqlx::query_as::<_, Borrowing>(&select_query);
        for param in &params {
            builder = builder.bind(param);
        }
        let items = builder.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        Ok((items, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Borrowing not found".to_string()))
    }

    pub async fn stats(&self) -> AppResult<BorrowingStats> {
        let stats = sqlx::query_as::<_, BorrowingStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM borrowings WHERE status = 'borrowed') AS total_borrowed,
                (SELECT COUNT(*) FROM device_stocks) AS total_devices,
                (SELECT COUNT(*) FROM borrowings
                    WHERE status = 'borrowed' AND return_date < CURDATE()) AS overdue_borrowings,
                (SELECT COUNT(*) FROM borrowings
                    WHERE status = 'borrowed' AND return_date = CURDATE()) AS due_today
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Every device, grouped by category
    pub async fn list_devices(&self) -> AppResult<Vec<DeviceStock>> {
        let devices = sqlx::query_as::<_, DeviceStock>(
            "SELECT * FROM device_stocks ORDER BY category, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(devices)
    }

    pub async fn get_device(&self, id: i32) -> AppResult<DeviceStock> {
        sqlx::query_as::<_, DeviceStock>("SELECT * FROM device_stocks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Device not found".to_string()))
    }

    /// Insert a device with its whole stock available
    pub async fn create_device(&self, name: &str, category: &str, levels: StockLevels) -> AppResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO device_stocks (name, category, total_stock, available_stock, borrowed_count)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(name.trim())
        .bind(category.trim())
        .bind(levels.total)
        .bind(levels.available)
        .bind(levels.borrowed)
        .execute(&self.pool)
        .await?;
        inserted_id(result.last_insert_id())
    }

    /// Lock a device row until the transaction ends
    pub async fn lock_device(&self, conn: &mut MySqlConnection, id: i32) -> AppResult<DeviceStock> {
        sqlx::query_as::<_, DeviceStock>("SELECT * FROM device_stocks WHERE id = ? FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Device not found".to_string()))
    }

    pub async fn set_levels(&self, conn: &mut MySqlConnection, id: i32, levels: StockLevels) -> AppResult<()> {
        if !levels.is_balanced() {
            return Err(AppError::Internal(format!(
                "Refusing unbalanced stock for device {}: {:?}",
                id, levels
            )));
        }
        sqlx::query(
            r#"
            UPDATE device_stocks
            SET total_stock = ?, available_stock = ?, borrowed_count = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(levels.total)
        .bind(levels.available)
        .bind(levels.borrowed)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Insert a borrowed loan, copying the device name
    pub async fn insert_borrowing(
        &self,
        conn: &mut MySqlConnection,
        borrowing: &NewBorrowing,
        device_name: &str,
    ) -> AppResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO borrowings (employee_name, device_id, device_name, quantity, borrow_date, return_date, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&borrowing.employee_name)
        .bind(borrowing.device_id)
        .bind(device_name)
        .bind(borrowing.quantity)
        .bind(borrowing.borrow_date)
        .bind(borrowing.return_date)
        .bind(BorrowingStatus::Borrowed)
        .execute(&mut *conn)
        .await?;
        inserted_id(result.last_insert_id())
    }

    /// Lock a loan that is still out
    pub async fn lock_active_borrowing(&self, conn: &mut MySqlConnection, id: i32) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(
            "SELECT * FROM borrowings WHERE id = ? AND status = ? FOR UPDATE",
        )
        .bind(id)
        .bind(BorrowingStatus::Borrowed)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Borrowing not found or already returned".to_string()))
    }

    pub async fn mark_returned(&self, conn: &mut MySqlConnection, id: i32) -> AppResult<()> {
        sqlx::query(
            "UPDATE borrowings SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? AND status = ?",
        )
        .bind(BorrowingStatus::Returned)
        .bind(id)
        .bind(BorrowingStatus::Borrowed)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Loans of a device that are still out
    pub async fn count_active_for_device(&self, conn: &mut MySqlConnection, device_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE device_id = ? AND status = ?",
        )
        .bind(device_id)
        .bind(BorrowingStatus::Borrowed)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }

    pub async fn delete_device(&self, conn: &mut MySqlConnection, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM device_stocks WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
