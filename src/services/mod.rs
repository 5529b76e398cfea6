//! Business logic services

pub mod activity;
pub mod assets;
pub mod borrowings;
pub mod chatbot;
pub mod dashboard;
pub mod email;
pub mod library;
pub mod settings;
pub mod storage;
pub mod users;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub assets: assets::AssetsService,
    pub library: library::LibraryService,
    pub borrowings: borrowings::BorrowingsService,
    pub dashboard: dashboard::DashboardService,
    pub chatbot: chatbot::ChatbotService,
    pub settings: settings::SettingsService,
    pub activity: activity::ActivityService,
    pub storage: storage::StorageService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository and the Gemini client
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let model = Arc::new(chatbot::GeminiClient::new(config.chatbot.clone()));
        Self::with_chat_model(repository, config, model)
    }

    /// Same as [`Services::new`] with a custom chat backend
    pub fn with_chat_model(
        repository: Repository,
        config: &AppConfig,
        model: Arc<dyn chatbot::ChatModel>,
    ) -> Self {
        let activity = activity::ActivityService::new(repository.clone());
        let email = email::EmailService::new(config.email.clone());
        let storage = storage::StorageService::new(&config.uploads);

        Self {
            users: users::UsersService::new(
                repository.clone(),
                config.auth.clone(),
                email,
                activity.clone(),
            ),
            assets: assets::AssetsService::new(repository.clone(), storage.clone(), activity.clone()),
            library: library::LibraryService::new(repository.clone(), storage.clone(), activity.clone()),
            borrowings: borrowings::BorrowingsService::new(repository.clone(), activity.clone()),
            dashboard: dashboard::DashboardService::new(repository.clone(), activity.clone()),
            chatbot: chatbot::ChatbotService::new(
                repository.clone(),
                model,
                activity.clone(),
                config.chatbot.history_window,
            ),
            settings: settings::SettingsService::new(repository.clone(), activity.clone()),
            activity,
            storage,
            repository,
        }
    }
}
