//! Per-user settings service

use validator::Validate;

use super::{
    activity::ActivityService,
    users::{hash_password, verify_password},
};
use crate::{
    error::{AppError, AppResult},
    models::{
        activity::NewActivity,
        settings::{
            Preferences, Settings, UpdatePassword, UpdatePreferences, UpdateProfile,
            EXPORT_HEADERS,
        },
        UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct SettingsService {
    repository: Repository,
    activity: ActivityService,
}

impl SettingsService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self {
            repository,
            activity,
        }
    }

    /// Profile and preferences; unset preferences come back as defaults
    pub async fn get(&self, actor: &UserClaims) -> AppResult<Settings> {
        Ok(self.repository.users.settings(actor.user_id).await?.into())
    }

    pub async fn update_profile(&self, actor: &UserClaims, req: UpdateProfile) -> AppResult<()> {
        req.validate()?;
        let name = req
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::Validation("Name is required".to_string()))?;

        self.repository
            .users
            .update_profile(actor.user_id, name, req.phone.as_deref(), req.department.as_deref())
            .await?;
        self.activity
            .record(NewActivity::new(actor.user_id, "Updated profile", "user").entity(actor.user_id))
            .await;
        Ok(())
    }

    pub async fn update_password(&self, actor: &UserClaims, req: UpdatePassword) -> AppResult<()> {
        req.validate()?;
        let (Some(current), Some(new_password)) = (req.current_password, req.new_password) else {
            return Err(AppError::Validation("All password fields are required".to_string()));
        };

        let record = self.repository.users.get_record(actor.user_id).await?;
        if !verify_password(&record.password, &current)? {
            return Err(AppError::Validation("Current password is incorrect".to_string()));
        }

        let hash = hash_password(&new_password)?;
        self.repository.users.update_password(actor.user_id, &hash).await?;
        self.activity
            .record(NewActivity::new(actor.user_id, "Changed password", "user").entity(actor.user_id))
            .await;
        Ok(())
    }

    pub async fn update_preferences(&self, actor: &UserClaims, req: UpdatePreferences) -> AppResult<Preferences> {
        let preferences = Preferences::from(req);
        self.repository
            .users
            .set_preferences(actor.user_id, &preferences)
            .await?;
        Ok(preferences)
    }

    pub async fn reset(&self, actor: &UserClaims) -> AppResult<Preferences> {
        let preferences = Preferences::default();
        self.repository
            .users
            .set_preferences(actor.user_id, &preferences)
            .await?;
        self.activity
            .record(NewActivity::new(actor.user_id, "Reset settings", "user").entity(actor.user_id))
            .await;
        Ok(preferences)
    }

    /// CSV with a header row and the caller's profile
    pub async fn export_csv(&self, actor: &UserClaims) -> AppResult<Vec<u8>> {
        let row = self.repository.users.settings(actor.user_id).await?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(EXPORT_HEADERS)
            .and_then(|_| writer.write_record(row.to_record()))
            .map_err(|e| AppError::Internal(format!("Failed to write CSV: {}", e)))?;
        writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("Failed to write CSV: {}", e)))
    }
}
