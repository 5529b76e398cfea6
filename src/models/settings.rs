//! Per-user settings: profile and preferences

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationPreferences {
    pub email: bool,
    pub push: bool,
    pub sms: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            push: false,
            sms: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemPreferences {
    pub auto_backup: bool,
    pub analytics: bool,
}

impl Default for SystemPreferences {
    fn default() -> Self {
        Self {
            auto_backup: true,
            analytics: true,
        }
    }
}

/// Stored in the `users.preferences` JSON column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Preferences {
    #[serde(default)]
    pub notifications: NotificationPreferences,
    #[serde(default)]
    pub system: SystemPreferences,
}

/// Profile columns plus raw preferences
#[derive(Debug, Clone, FromRow)]
pub struct SettingsRow {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub preferences: Option<Json<Preferences>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Settings {
    pub profile: Profile,
    pub notifications: NotificationPreferences,
    pub system: SystemPreferences,
}

impl From<SettingsRow> for Settings {
    fn from(row: SettingsRow) -> Self {
        let preferences = row.preferences.map(|p| p.0).unwrap_or_default();
        Self {
            profile: Profile {
                name: row.name,
                email: row.email,
                phone: row.phone.unwrap_or_default(),
                department: row.department.unwrap_or_default(),
            },
            notifications: preferences.notifications,
            system: preferences.system,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(
        required(message = "Name is required"),
        length(min = 1, max = 255, message = "Name is required")
    )]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "passwords_match", skip_on_field_errors = true))]
pub struct UpdatePassword {
    #[validate(
        required(message = "All password fields are required"),
        length(min = 1, message = "All password fields are required")
    )]
    pub current_password: Option<String>,
    #[validate(
        required(message = "All password fields are required"),
        length(min = 8, message = "New password must be at least 8 characters")
    )]
    pub new_password: Option<String>,
    #[validate(required(message = "All password fields are required"))]
    pub confirm_password: Option<String>,
}

fn passwords_match(req: &UpdatePassword) -> Result<(), validator::ValidationError> {
    if req.new_password != req.confirm_password {
        let mut err = validator::ValidationError::new("password_mismatch");
        err.message = Some("New passwords do not match".into());
        return Err(err);
    }
    Ok(())
}

/// Preference update; omitted sections fall back to their defaults
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePreferences {
    pub notifications: Option<NotificationPreferences>,
    pub system: Option<SystemPreferences>,
}

impl From<UpdatePreferences> for Preferences {
    fn from(update: UpdatePreferences) -> Self {
        Self {
            notifications: update.notifications.unwrap_or_default(),
            system: update.system.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

pub const EXPORT_HEADERS: [&str; 6] = ["Name", "Email", "Phone", "Department", "Role", "Created At"];

impl SettingsRow {
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.phone.clone().unwrap_or_default(),
            self.department.clone().unwrap_or_default(),
            self.role.clone(),
            self.created_at.to_rfc3339(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences() {
        let json = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "notifications": { "email": true, "push": false, "sms": true },
                "system": { "autoBackup": true, "analytics": true }
            })
        );
    }

    #[test]
    fn test_partial_preferences_update() {
        let update = UpdatePreferences {
            notifications: Some(NotificationPreferences {
                email: false,
                push: true,
                sms: false,
            }),
            system: None,
        };
        let prefs = Preferences::from(update);
        assert!(prefs.notifications.push);
        assert_eq!(prefs.system, SystemPreferences::default());
    }

    #[test]
    fn test_password_rules() {
        let mismatch = UpdatePassword {
            current_password: Some("old-secret".to_string()),
            new_password: Some("new-secret-1".to_string()),
            confirm_password: Some("new-secret-2".to_string()),
        };
        assert!(mismatch.validate().is_err());

        let short = UpdatePassword {
            current_password: Some("old-secret".to_string()),
            new_password: Some("short".to_string()),
            confirm_password: Some("short".to_string()),
        };
        assert!(short.validate().is_err());

        let missing = UpdatePassword {
            current_password: None,
            new_password: Some("long-enough".to_string()),
            confirm_password: Some("long-enough".to_string()),
        };
        assert!(missing.validate().is_err());

        let ok = UpdatePassword {
            current_password: Some("old-secret".to_string()),
            new_password: Some("long-enough".to_string()),
            confirm_password: Some("long-enough".to_string()),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_settings_from_row_without_preferences() {
        let row = SettingsRow {
            name: "Kim".to_string(),
            email: "kim@example.com".to_string(),
            phone: None,
            department: None,
            role: "User".to_string(),
            created_at: Utc::now(),
            preferences: None,
        };
        let settings = Settings::from(row);
        assert_eq!(settings.profile.phone, "");
        assert_eq!(settings.notifications, NotificationPreferences::default());
    }
}
