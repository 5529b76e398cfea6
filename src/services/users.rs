//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::{activity::ActivityService, email::EmailService};
use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        activity::{Activity, NewActivity},
        enums::{Role, UserStatus},
        page_window,
        user::{
            ChangePassword, CreateUser, RegisterRequest, UpdateUser, User, UserClaims, UserList,
            UserQuery, UserRecord, UserStats,
        },
        Pagination,
    },
    repository::{users::NewUser, Repository},
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Random token sent by email, hex encoded
fn generate_verification_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Only the digest of a verification token is stored
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.trim().as_bytes()))
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    email: EmailService,
    activity: ActivityService,
}

impl UsersService {
    pub fn new(
        repository: Repository,
        config: AuthConfig,
        email: EmailService,
        activity: ActivityService,
    ) -> Self {
        Self {
            repository,
            config,
            email,
            activity,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }

    /// Create a pending account and send its verification email
    pub async fn register(&self, req: RegisterRequest) -> AppResult<i32> {
        if self.repository.users.email_exists(&req.email).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = hash_password(&req.password)?;
        let token = generate_verification_token();
        let digest = token_digest(&token);
        let expiry = Utc::now() + Duration::hours(self.config.verification_token_hours);

        let user_id = self
            .repository
            .users
            .create(&NewUser {
                name: &req.name,
                email: &req.email,
                password_hash: &password_hash,
                phone: req.phone.as_deref(),
                role: Role::User,
                status: UserStatus::Pending,
                department: req.department.as_deref(),
                email_verified: false,
                verification_token: Some(&digest),
                token_expiry: Some(expiry),
            })
            .await?;

        tracing::info!(user_id, email = %req.email, "User registered");

        if let Err(e) = self
            .email
            .send_verification_email(req.email.trim(), req.name.trim(), &token)
            .await
        {
            tracing::warn!(user_id, "Failed to send verification email: {}", e);
        }

        Ok(user_id)
    }

    /// Check credentials and issue a JWT
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let record = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !verify_password(&record.password, password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        if self.config.require_email_verification && !record.email_verified {
            return Err(AppError::Authorization(
                "Please verify your email address before logging in".to_string(),
            ));
        }

        if record.status == UserStatus::Inactive {
            return Err(AppError::Authorization("Account is inactive".to_string()));
        }

        let token = self.create_token(&record)?;

        self.repository.users.touch_last_login(record.id).await?;
        self.activity
            .record(NewActivity::new(record.id, "User logged in", "user").entity(record.id))
            .await;

        let user = self.repository.users.get_by_id(record.id).await?;
        Ok((token, user))
    }

    pub fn create_token(&self, record: &UserRecord) -> AppResult<String> {
        UserClaims::new(record, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    pub async fn logout(&self, claims: &UserClaims) {
        self.activity
            .record(NewActivity::new(claims.user_id, "User logged out", "user").entity(claims.user_id))
            .await;
    }

    /// Consume a verification token and activate the account
    pub async fn verify_email(&self, token: &str) -> AppResult<User> {
        let record = self
            .repository
            .users
            .get_by_verification_token(&token_digest(token))
            .await?
            .ok_or_else(|| {
                AppError::Validation("Invalid or expired verification token".to_string())
            })?;

        match record.token_expiry {
            Some(expiry) if expiry >= Utc::now() => {}
            _ => {
                return Err(AppError::Validation(
                    "Verification token has expired".to_string(),
                ))
            }
        }

        self.repository.users.mark_verified(record.id).await?;
        tracing::info!(user_id = record.id, "Email verified");

        if let Err(e) = self.email.send_welcome_email(&record.email, &record.name).await {
            tracing::warn!(user_id = record.id, "Failed to send welcome email: {}", e);
        }

        self.repository.users.get_by_id(record.id).await
    }

    /// Issue a fresh verification token for an unverified account
    pub async fn resend_verification(&self, email: &str) -> AppResult<()> {
        let record = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if record.email_verified {
            return Err(AppError::Validation("Email already verified".to_string()));
        }

        let token = generate_verification_token();
        let expiry = Utc::now() + Duration::hours(self.config.verification_token_hours);
        self.repository
            .users
            .set_verification_token(record.id, &token_digest(&token), expiry)
            .await?;

        if let Err(e) = self
            .email
            .send_verification_email(&record.email, &record.name, &token)
            .await
        {
            tracing::warn!(user_id = record.id, "Failed to resend verification email: {}", e);
        }
        Ok(())
    }

    pub async fn is_email_verified(&self, email: &str) -> AppResult<bool> {
        let record = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(record.email_verified)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn search(&self, query: &UserQuery) -> AppResult<UserList> {
        let (page, limit, offset) = page_window(query.page, query.limit);
        let (users, total) = self.repository.users.search(query, limit, offset).await?;
        Ok(UserList {
            users,
            pagination: Pagination::new(page, limit, total),
        })
    }

    pub async fn stats(&self) -> AppResult<UserStats> {
        self.repository.users.stats().await
    }

    pub async fn activity(&self, user_id: i32, limit: Option<i64>) -> AppResult<Vec<Activity>> {
        self.repository.users.get_by_id(user_id).await?;
        self.activity
            .for_user(user_id, limit.unwrap_or(20).clamp(1, 100))
            .await
    }

    /// Create an account on behalf of staff. It is verified and active.
    pub async fn create(&self, actor: &UserClaims, req: CreateUser) -> AppResult<User> {
        if self.repository.users.email_exists(&req.email).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = hash_password(&req.password)?;
        let id = self
            .repository
            .users
            .create(&NewUser {
                name: &req.name,
                email: &req.email,
                password_hash: &password_hash,
                phone: req.phone.as_deref(),
                role: req.role.unwrap_or(Role::User),
                status: UserStatus::Active,
                department: req.department.as_deref(),
                email_verified: true,
                verification_token: None,
                token_expiry: None,
            })
            .await?;

        self.activity
            .record(
                NewActivity::new(actor.user_id, "Created new user", "user")
                    .entity(id)
                    .details(serde_json::json!({ "email": req.email.trim() })),
            )
            .await;

        self.repository.users.get_by_id(id).await
    }

    pub async fn update(&self, actor: &UserClaims, id: i32, req: UpdateUser) -> AppResult<User> {
        if req.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        self.repository.users.update(id, &req).await?;
        self.activity
            .record(NewActivity::new(actor.user_id, "Updated user", "user").entity(id))
            .await;

        self.repository.users.get_by_id(id).await
    }

    /// Change a password. Only the owner or an administrator may do it, and
    /// only an administrator may skip the current password.
    pub async fn change_password(&self, actor: &UserClaims, id: i32, req: ChangePassword) -> AppResult<()> {
        if actor.user_id != id && !actor.is_admin() {
            return Err(AppError::Authorization(
                "You can only change your own password".to_string(),
            ));
        }

        let record = self.repository.users.get_record(id).await?;

        if !actor.is_admin() {
            let current = req.current_password.as_deref().unwrap_or_default();
            if !verify_password(&record.password, current)? {
                return Err(AppError::Validation(
                    "Current password is incorrect".to_string(),
                ));
            }
        }

        let hash = hash_password(&req.new_password)?;
        self.repository.users.update_password(id, &hash).await?;
        self.activity
            .record(NewActivity::new(actor.user_id, "Changed password", "user").entity(id))
            .await;
        Ok(())
    }

    pub async fn delete(&self, actor: &UserClaims, id: i32) -> AppResult<()> {
        if actor.user_id == id {
            return Err(AppError::Validation(
                "Cannot delete your own account".to_string(),
            ));
        }

        let name = self.repository.users.delete(id).await?;
        tracing::info!(user_id = id, "User deleted");
        self.activity
            .record(
                NewActivity::new(actor.user_id, "Deleted user", "user")
                    .entity(id)
                    .details(serde_json::json!({ "name": name })),
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse").unwrap());
        assert!(!verify_password(&hash, "wrong").unwrap());
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        assert!(verify_password("not-a-hash", "anything").is_err());
    }

    #[test]
    fn test_verification_tokens_are_random_hex() {
        let a = generate_verification_token();
        let b = generate_verification_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_digest_is_stable() {
        let digest = token_digest("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(token_digest(" abc "), digest);
    }
}
