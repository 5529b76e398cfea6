//! Borrowing flow against a live MySQL database
//!
//! Run with: DATABASE_URL=mysql://... cargo test -- --ignored

use chrono::{NaiveDate, Utc};
use sqlx::MySqlPool;

use inventory_server::{
    config::AppConfig,
    error::AppError,
    models::{borrowing::CreateBorrowing, BorrowingStatus, DeviceStock, Role, UserClaims},
    repository::Repository,
    services::{borrowings::BorrowingsService, Services},
};

struct Fixture {
    service: BorrowingsService,
    repository: Repository,
    actor: UserClaims,
}

async fn fixture(pool: MySqlPool) -> Fixture {
    let user_id = sqlx::query(
        "INSERT INTO users (name, email, password, role, status, email_verified) VALUES (?, ?, ?, ?, ?, TRUE)",
    )
    .bind("Stock Keeper")
    .bind("keeper@example.com")
    .bind("not-a-real-hash")
    .bind("Admin")
    .bind("Active")
    .execute(&pool)
    .await
    .unwrap()
    .last_insert_id() as i32;

    let now = Utc::now();
    let actor = UserClaims {
        sub: "keeper@example.com".to_string(),
        user_id,
        email: "keeper@example.com".to_string(),
        name: "Stock Keeper".to_string(),
        role: Role::Admin,
        exp: now.timestamp() + 3600,
        iat: now.timestamp(),
    };

    let repository = Repository::new(pool);
    let services = Services::new(repository.clone(), &AppConfig::default());
    Fixture {
        service: services.borrowings,
        repository,
        actor,
    }
}

impl Fixture {
    async fn device(&self, total: i32) -> i32 {
        self.service
            .create_device(
                &self.actor,
                inventory_server::models::borrowing::CreateDevice {
                    name: Some("Laptop".to_string()),
                    category: Some("Computers".to_string()),
                    total_stock: Some(total),
                },
            )
            .await
            .unwrap()
    }

    async fn stock(&self, device_id: i32) -> DeviceStock {
        self.repository.borrowings.get_device(device_id).await.unwrap()
    }

    async fn borrow(&self, device_id: i32, quantity: i32) -> Result<i32, AppError> {
        self.service
            .borrow(&self.actor, request(device_id, quantity))
            .await
    }
}

fn request(device_id: i32, quantity: i32) -> CreateBorrowing {
    CreateBorrowing {
        employee_name: Some("Sam Carter".to_string()),
        device_id: Some(device_id),
        quantity: Some(quantity),
        borrow_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        return_date: NaiveDate::from_ymd_opt(2024, 3, 15),
    }
}

fn assert_balanced(stock: &DeviceStock) {
    assert_eq!(
        stock.available_stock + stock.borrowed_count,
        stock.total_stock,
        "unbalanced stock: {:?}",
        stock
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_borrow_then_return_restores_stock(pool: MySqlPool) {
    let f = fixture(pool).await;
    let device = f.device(5).await;

    let id = f.borrow(device, 2).await.unwrap();
    let stock = f.stock(device).await;
    assert_eq!((stock.available_stock, stock.borrowed_count), (3, 2));
    assert_balanced(&stock);

    f.service.return_borrowing(&f.actor, id).await.unwrap();
    let stock = f.stock(device).await;
    assert_eq!((stock.available_stock, stock.borrowed_count), (5, 0));
    assert_balanced(&stock);

    let borrowing = f.service.get_by_id(id).await.unwrap();
    assert_eq!(borrowing.status, BorrowingStatus::Returned);
    assert_eq!(borrowing.device_name, "Laptop");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_second_return_is_not_found(pool: MySqlPool) {
    let f = fixture(pool).await;
    let device = f.device(3).await;
    let id = f.borrow(device, 1).await.unwrap();

    f.service.return_borrowing(&f.actor, id).await.unwrap();
    let second = f.service.return_borrowing(&f.actor, id).await;
    assert!(matches!(second, Err(AppError::NotFound(_))));

    let stock = f.stock(device).await;
    assert_eq!(stock.available_stock, 3);
    assert_eq!(stock.borrowed_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_borrowing_everything_then_one_more(pool: MySqlPool) {
    let f = fixture(pool).await;
    let device = f.device(4).await;

    f.borrow(device, 4).await.unwrap();
    let stock = f.stock(device).await;
    assert_eq!(stock.available_stock, 0);
    assert_balanced(&stock);

    let over = f.borrow(device, 1).await;
    assert!(matches!(over, Err(AppError::InsufficientStock { available: 0 })));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_oversized_borrow_leaves_no_trace(pool: MySqlPool) {
    let f = fixture(pool).await;
    let device = f.device(2).await;

    let result = f.borrow(device, 3).await;
    assert!(matches!(result, Err(AppError::InsufficientStock { available: 2 })));

    let stock = f.stock(device).await;
    assert_eq!((stock.available_stock, stock.borrowed_count), (2, 0));
    let (items, total) = f
        .repository
        .borrowings
        .list(&Default::default(), 10, 0)
        .await
        .unwrap();
    assert!(items.is_empty());
    assert_eq!(total, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_unknown_device_is_not_found(pool: MySqlPool) {
    let f = fixture(pool).await;
    let result = f.borrow(9999, 1).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_concurrent_borrows_of_last_unit(pool: MySqlPool) {
    let f = fixture(pool).await;
    let device = f.device(1).await;

    let (first, second) = tokio::join!(f.borrow(device, 1), f.borrow(device, 1));

    let results = [first, second];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::InsufficientStock { available: 0 })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(refused, 1);

    let stock = f.stock(device).await;
    assert_eq!((stock.available_stock, stock.borrowed_count), (0, 1));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_stock_update_keeps_balance(pool: MySqlPool) {
    let f = fixture(pool).await;
    let device = f.device(5).await;
    f.borrow(device, 3).await.unwrap();

    let grown = f.service.update_stock(&f.actor, device, 8).await.unwrap();
    assert_eq!((grown.total_stock, grown.available_stock, grown.borrowed_count), (8, 5, 3));

    let shrunk = f.service.update_stock(&f.actor, device, 3).await.unwrap();
    assert_eq!((shrunk.total_stock, shrunk.available_stock, shrunk.borrowed_count), (3, 0, 3));

    let below = f.service.update_stock(&f.actor, device, 2).await;
    assert!(matches!(below, Err(AppError::Validation(_))));
    assert_balanced(&f.stock(device).await);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_device_with_active_borrowing_cannot_be_deleted(pool: MySqlPool) {
    let f = fixture(pool).await;
    let device = f.device(2).await;
    let id = f.borrow(device, 1).await.unwrap();

    let blocked = f.service.delete_device(&f.actor, device).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    f.service.return_borrowing(&f.actor, id).await.unwrap();
    f.service.delete_device(&f.actor, device).await.unwrap();

    let missing = f.repository.borrowings.get_device(device).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let history = f.service.get_by_id(id).await.unwrap();
    assert_eq!(history.device_id, None);
    assert_eq!(history.device_name, "Laptop");
}
