//! Device stock and borrowing models
//!
//! A device's stock is split into available and borrowed units. Every
//! transition goes through [`StockLevels`], which keeps
//! `available_stock + borrowed_count == total_stock` and rejects any move
//! that would break it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::BorrowingStatus;
use crate::error::AppError;

/// Lendable device pool
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DeviceStock {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub total_stock: i32,
    pub available_stock: i32,
    pub borrowed_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeviceStock {
    pub fn levels(&self) -> StockLevels {
        StockLevels {
            total: self.total_stock,
            available: self.available_stock,
            borrowed: self.borrowed_count,
        }
    }
}

/// The three stock counters of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevels {
    pub total: i32,
    pub available: i32,
    pub borrowed: i32,
}

impl StockLevels {
    /// Fresh stock with nothing lent out
    pub fn new(total: i32) -> Result<Self, AppError> {
        if total < 0 {
            return Err(AppError::Validation(
                "Total stock must be zero or greater".to_string(),
            ));
        }
        Ok(Self {
            total,
            available: total,
            borrowed: 0,
        })
    }

    pub fn is_balanced(&self) -> bool {
        self.available >= 0
            && self.borrowed >= 0
            && self.available + self.borrowed == self.total
    }

    /// Lend `quantity` units
    pub fn borrow(self, quantity: i32) -> Result<Self, AppError> {
        if quantity <= 0 {
            return Err(AppError::Validation(
                "Quantity must be greater than zero".to_string(),
            ));
        }
        if self.available < quantity {
            return Err(AppError::InsufficientStock {
                available: self.available,
            });
        }
        Ok(Self {
            total: self.total,
            available: self.available - quantity,
            borrowed: self.borrowed + quantity,
        })
    }

    /// Take back `quantity` units
    pub fn give_back(self, quantity: i32) -> Result<Self, AppError> {
        if quantity <= 0 || quantity > self.borrowed {
            return Err(AppError::Internal(format!(
                "Cannot return {} units with {} borrowed",
                quantity, self.borrowed
            )));
        }
        Ok(Self {
            total: self.total,
            available: self.available + quantity,
            borrowed: self.borrowed - quantity,
        })
    }

    /// Change the total, moving the difference into availability.
    /// A total below the units currently lent out is rejected.
    pub fn adjust_total(self, new_total: i32) -> Result<Self, AppError> {
        if new_total < 0 {
            return Err(AppError::Validation(
                "Total stock must be zero or greater".to_string(),
            ));
        }
        if new_total < self.borrowed {
            return Err(AppError::Validation(format!(
                "Total stock cannot be lower than the {} units currently borrowed",
                self.borrowed
            )));
        }
        Ok(Self {
            total: new_total,
            available: self.available + (new_total - self.total),
            borrowed: self.borrowed,
        })
    }
}

/// Loan of one or more units of a device to an employee
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i32,
    pub employee_name: String,
    /// Cleared when the device is deleted after the loan was returned
    pub device_id: Option<i32>,
    /// Device name at the time of borrowing
    pub device_name: String,
    pub quantity: i32,
    pub borrow_date: NaiveDate,
    pub return_date: NaiveDate,
    pub status: BorrowingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorrowing {
    #[validate(
        required(message = "employee_name is required"),
        length(min = 1, max = 255, message = "employee_name must not be empty")
    )]
    pub employee_name: Option<String>,
    #[validate(required(message = "device_id is required"))]
    pub device_id: Option<i32>,
    #[validate(
        required(message = "quantity is required"),
        range(min = 1, message = "quantity must be greater than zero")
    )]
    pub quantity: Option<i32>,
    #[validate(required(message = "borrow_date is required"))]
    pub borrow_date: Option<NaiveDate>,
    #[validate(required(message = "return_date is required"))]
    pub return_date: Option<NaiveDate>,
}

/// Validated borrowing request
#[derive(Debug, Clone)]
pub struct NewBorrowing {
    pub employee_name: String,
    pub device_id: i32,
    pub quantity: i32,
    pub borrow_date: NaiveDate,
    pub return_date: NaiveDate,
}

impl TryFrom<CreateBorrowing> for NewBorrowing {
    type Error = AppError;

    fn try_from(req: CreateBorrowing) -> Result<Self, Self::Error> {
        req.validate()?;
        let missing = || AppError::Validation("All fields are required".to_string());
        let borrowing = Self {
            employee_name: req.employee_name.ok_or_else(missing)?.trim().to_string(),
            device_id: req.device_id.ok_or_else(missing)?,
            quantity: req.quantity.ok_or_else(missing)?,
            borrow_date: req.borrow_date.ok_or_else(missing)?,
            return_date: req.return_date.ok_or_else(missing)?,
        };
        if borrowing.employee_name.is_empty() {
            return Err(AppError::Validation("employee_name must not be empty".to_string()));
        }
        if borrowing.return_date < borrowing.borrow_date {
            return Err(AppError::Validation(
                "return_date must not be before borrow_date".to_string(),
            ));
        }
        Ok(borrowing)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingCreated {
    pub message: String,
    pub borrowing_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDevice {
    #[validate(
        required(message = "name is required"),
        length(min = 1, max = 255, message = "name must not be empty")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "category is required"),
        length(min = 1, max = 100, message = "category must not be empty")
    )]
    pub category: Option<String>,
    #[validate(
        required(message = "total_stock is required"),
        range(min = 0, message = "total_stock must be zero or greater")
    )]
    pub total_stock: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCreated {
    pub message: String,
    pub device_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDeviceStock {
    #[validate(
        required(message = "Valid total stock is required"),
        range(min = 0, message = "Valid total stock is required")
    )]
    pub total_stock: Option<i32>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BorrowingQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<BorrowingStatus>,
    /// Matches employee or device name
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BorrowingList {
    pub items: Vec<Borrowing>,
    pub pagination: super::Pagination,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct BorrowingStats {
    pub total_borrowed: i64,
    pub total_devices: i64,
    pub overdue_borrowings: i64,
    pub due_today: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrow_and_return_restore_levels() {
        let start = StockLevels::new(5).unwrap();
        let lent = start.borrow(2).unwrap();
        assert_eq!(lent, StockLevels { total: 5, available: 3, borrowed: 2 });
        assert!(lent.is_balanced());

        let back = lent.give_back(2).unwrap();
        assert_eq!(back, start);
        assert!(back.is_balanced());
    }

    #[test]
    fn test_borrow_exact_availability() {
        let levels = StockLevels::new(3).unwrap().borrow(3).unwrap();
        assert_eq!(levels.available, 0);
        assert!(levels.is_balanced());
    }

    #[test]
    fn test_borrow_more_than_available() {
        let levels = StockLevels::new(3).unwrap();
        match levels.borrow(4) {
            Err(AppError::InsufficientStock { available }) => assert_eq!(available, 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_borrow_rejects_non_positive_quantity() {
        let levels = StockLevels::new(3).unwrap();
        assert!(matches!(levels.borrow(0), Err(AppError::Validation(_))));
        assert!(matches!(levels.borrow(-1), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_give_back_more_than_borrowed() {
        let levels = StockLevels::new(3).unwrap().borrow(1).unwrap();
        assert!(levels.give_back(2).is_err());
    }

    #[test]
    fn test_adjust_total() {
        let levels = StockLevels::new(5).unwrap().borrow(2).unwrap();

        let grown = levels.adjust_total(8).unwrap();
        assert_eq!(grown, StockLevels { total: 8, available: 6, borrowed: 2 });

        let shrunk = levels.adjust_total(2).unwrap();
        assert_eq!(shrunk, StockLevels { total: 2, available: 0, borrowed: 2 });
        assert!(shrunk.is_balanced());

        assert!(matches!(levels.adjust_total(1), Err(AppError::Validation(_))));
        assert!(matches!(levels.adjust_total(-1), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_zero_stock_is_allowed() {
        let levels = StockLevels::new(0).unwrap();
        assert!(levels.is_balanced());
        assert!(StockLevels::new(-1).is_err());
    }

    #[test]
    fn test_new_borrowing_requires_every_field() {
        let req = CreateBorrowing {
            employee_name: Some("Sam".to_string()),
            device_id: Some(1),
            quantity: None,
            borrow_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            return_date: NaiveDate::from_ymd_opt(2024, 5, 8),
        };
        assert!(matches!(NewBorrowing::try_from(req), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_new_borrowing_rejects_zero_quantity() {
        let req = CreateBorrowing {
            employee_name: Some("Sam".to_string()),
            device_id: Some(1),
            quantity: Some(0),
            borrow_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            return_date: NaiveDate::from_ymd_opt(2024, 5, 8),
        };
        assert!(NewBorrowing::try_from(req).is_err());
    }

    #[test]
    fn test_new_borrowing_accepts_valid_request() {
        let req = CreateBorrowing {
            employee_name: Some(" Sam ".to_string()),
            device_id: Some(4),
            quantity: Some(2),
            borrow_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            return_date: NaiveDate::from_ymd_opt(2024, 5, 8),
        };
        let borrowing = NewBorrowing::try_from(req).unwrap();
        assert_eq!(borrowing.employee_name, "Sam");
        assert_eq!(borrowing.quantity, 2);
    }
}
