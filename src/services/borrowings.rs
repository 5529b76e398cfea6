//! Device borrowing service
//!
//! Borrow, return, stock adjustment and device deletion each run in one
//! transaction that locks the rows it reads with `SELECT ... FOR UPDATE`.
//! Every early return drops the transaction, which rolls it back. Activity
//! entries are written after commit.

use serde_json::json;

use super::activity::ActivityService;
use crate::{
    error::{AppError, AppResult},
    models::{
        activity::NewActivity,
        borrowing::{
            Borrowing, BorrowingList, BorrowingQuery, BorrowingStats, CreateBorrowing,
            CreateDevice, DeviceStock, NewBorrowing, StockLevels,
        },
        page_window, Pagination, UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowingsService {
    repository: Repository,
    activity: ActivityService,
}

impl BorrowingsService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self {
            repository,
            activity,
        }
    }

    pub async fn list(&self, query: &BorrowingQuery) -> AppResult<BorrowingList> {
        let (page, limit, offset) = page_window(query.page, query.limit);
        let (items, total) = self.repository.borrowings.list(query, limit, offset).await?;
        Ok(BorrowingList {
            items,
            pagination: Pagination::new(page, limit, total),
        })
    }

    pub async fn stats(&self) -> AppResult<BorrowingStats> {
        self.repository.borrowings.stats().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrowing> {
        self.repository.borrowings.get_by_id(id).await
    }

    pub async fn list_devices(&self) -> AppResult<Vec<DeviceStock>> {
        self.repository.borrowings.list_devices().await
    }

    /// Lend units of a device. Fails with `InsufficientStock` when fewer
    /// units are available than requested.
    pub async fn borrow(&self, actor: &UserClaims, req: CreateBorrowing) -> AppResult<i32> {
        let borrowing = NewBorrowing::try_from(req)?;
        let repo = &self.repository.borrowings;

        let mut tx = repo.begin().await?;

        let device = repo.lock_device(&mut tx, borrowing.device_id).await?;
        let levels = device.levels().borrow(borrowing.quantity)?;

        let id = repo.insert_borrowing(&mut tx, &borrowing, &device.name).await?;
        repo.set_levels(&mut tx, device.id, levels).await?;

        tx.commit().await?;

        tracing::info!(
            borrowing_id = id,
            device_id = device.id,
            quantity = borrowing.quantity,
            available = levels.available,
            "Device borrowed"
        );
        self.activity
            .record(
                NewActivity::new(actor.user_id, "Created borrowing", "borrowing")
                    .entity(id)
                    .details(json!({
                        "employee_name": borrowing.employee_name,
                        "device_id": device.id,
                        "device_name": device.name,
                        "quantity": borrowing.quantity,
                    })),
            )
            .await;

        Ok(id)
    }

    /// Return a loan, putting its units back in stock. A loan can be
    /// returned once; afterwards it is reported as not found.
    pub async fn return_borrowing(&self, actor: &UserClaims, id: i32) -> AppResult<()> {
        let repo = &self.repository.borrowings;

        let mut tx = repo.begin().await?;

        let borrowing = repo.lock_active_borrowing(&mut tx, id).await?;
        repo.mark_returned(&mut tx, id).await?;

        let device_id = borrowing.device_id.ok_or_else(|| {
            AppError::Internal(format!("Active borrowing {} has no device", id))
        })?;
        let device = repo.lock_device(&mut tx, device_id).await?;
        let levels = device.levels().give_back(borrowing.quantity)?;
        repo.set_levels(&mut tx, device.id, levels).await?;

        tx.commit().await?;

        tracing::info!(
            borrowing_id = id,
            device_id,
            quantity = borrowing.quantity,
            available = levels.available,
            "Device returned"
        );
        self.activity
            .record(
                NewActivity::new(actor.user_id, "Returned borrowing", "borrowing")
                    .entity(id)
                    .details(json!({
                        "device_id": device_id,
                        "quantity": borrowing.quantity,
                    })),
            )
            .await;

        Ok(())
    }

    pub async fn create_device(&self, actor: &UserClaims, req: CreateDevice) -> AppResult<i32> {
        use validator::Validate;
        req.validate()?;

        let missing = || AppError::Validation("All fields are required".to_string());
        let name = req.name.ok_or_else(missing)?;
        let category = req.category.ok_or_else(missing)?;
        let levels = StockLevels::new(req.total_stock.ok_or_else(missing)?)?;

        if name.trim().is_empty() || category.trim().is_empty() {
            return Err(missing());
        }

        let id = self
            .repository
            .borrowings
            .create_device(&name, &category, levels)
            .await?;

        tracing::info!(device_id = id, name = %name.trim(), total = levels.total, "Device created");
        self.activity
            .record(
                NewActivity::new(actor.user_id, "Created device", "device")
                    .entity(id)
                    .details(json!({
                        "name": name.trim(),
                        "category": category.trim(),
                        "total_stock": levels.total,
                    })),
            )
            .await;

        Ok(id)
    }

    /// Set a new total. Units currently lent out stay borrowed, so the new
    /// total may not drop below them.
    pub async fn update_stock(&self, actor: &UserClaims, id: i32, total_stock: i32) -> AppResult<DeviceStock> {
        let repo = &self.repository.borrowings;

        let mut tx = repo.begin().await?;

        let device = repo.lock_device(&mut tx, id).await?;
        let levels = device.levels().adjust_total(total_stock)?;
        repo.set_levels(&mut tx, id, levels).await?;

        tx.commit().await?;

        tracing::info!(device_id = id, from = device.total_stock, to = levels.total, "Device stock updated");
        self.activity
            .record(
                NewActivity::new(actor.user_id, "Updated device stock", "device")
                    .entity(id)
                    .details(json!({
                        "old_total": device.total_stock,
                        "new_total": levels.total,
                    })),
            )
            .await;

        repo.get_device(id).await
    }

    /// Delete a device that has no loan still out
    pub async fn delete_device(&self, actor: &UserClaims, id: i32) -> AppResult<()> {
        let repo = &self.repository.borrowings;

        let mut tx = repo.begin().await?;

        let device = repo.lock_device(&mut tx, id).await?;
        if repo.count_active_for_device(&mut tx, id).await? > 0 {
            return Err(AppError::Conflict(
                "Cannot delete device with active borrowings".to_string(),
            ));
        }
        repo.delete_device(&mut tx, id).await?;

        tx.commit().await?;

        tracing::info!(device_id = id, "Device deleted");
        self.activity
            .record(
                NewActivity::new(actor.user_id, "Deleted device", "device")
                    .entity(id)
                    .details(json!({ "name": device.name })),
            )
            .await;

        Ok(())
    }
}
