//! Repository layer for database operations

pub mod activity;
pub mod assets;
pub mod borrowings;
pub mod chat;
pub mod dashboard;
pub mod library;
pub mod users;

use sqlx::{MySql, Pool};

use crate::error::{AppError, AppResult};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<MySql>,
    pub users: users::UsersRepository,
    pub assets: assets::AssetsRepository,
    pub library: library::LibraryRepository,
    pub borrowings: borrowings::BorrowingsRepository,
    pub activity: activity::ActivityRepository,
    pub chat: chat::ChatRepository,
    pub dashboard: dashboard::DashboardRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<MySql>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            assets: assets::AssetsRepository::new(pool.clone()),
            library: library::LibraryRepository::new(pool.clone()),
            borrowings: borrowings::BorrowingsRepository::new(pool.clone()),
            activity: activity::ActivityRepository::new(pool.clone()),
            chat: chat::ChatRepository::new(pool.clone()),
            dashboard: dashboard::DashboardRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// `%term%` for LIKE filters
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term.trim())
}

/// Auto-increment id of an insert, checked against the signed `INT` key columns
pub(crate) fn inserted_id(last_insert_id: u64) -> AppResult<i32> {
    i32::try_from(last_insert_id).map_err(|_| {
        AppError::Internal(format!("Inserted id {} is out of range", last_insert_id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_id_accepts_int_range() {
        assert_eq!(inserted_id(1).unwrap(), 1);
        assert_eq!(inserted_id(i32::MAX as u64).unwrap(), i32::MAX);
    }

    #[test]
    fn inserted_id_rejects_overflow() {
        let err = inserted_id(i32::MAX as u64 + 1).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn like_pattern_trims_term() {
        assert_eq!(like_pattern("  laptop "), "%laptop%");
    }
}
