//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    assets, auth, borrowings, chatbot, dashboard, health, library, settings, upload, users,
};
use crate::error::ErrorResponse;
use crate::models::{
    activity::{Activity, ActivityWithUser},
    asset::{
        Asset, AssetList, AssetSearchResults, AssetStats, AssetSummary, AssetUpdated, CreateAsset,
        UpdateAsset, UploadResult, UploadedAsset,
    },
    borrowing::{
        Borrowing, BorrowingCreated, BorrowingList, BorrowingStats, CreateBorrowing, CreateDevice,
        DeviceCreated, DeviceStock, UpdateDeviceStock,
    },
    chat::{ChatExchange, ChatHistory, ChatReply, ChatRequest, ChatSession, ChatSessions, ClearHistory},
    dashboard::{
        CategoryCount, ChartData, DashboardStats, MonthlyCount, StatusSlice, TypeCount,
        WeeklyActivity,
    },
    enums::{BorrowingStatus, MediaKind, Role, UserStatus},
    library::{LibraryItem, LibraryItemCreated, LibraryList, LibraryStats, UpdateLibraryItem},
    settings::{
        MessageResponse, NotificationPreferences, Preferences, Profile, Settings,
        SystemPreferences, UpdatePassword, UpdatePreferences, UpdateProfile,
    },
    user::{
        ChangePassword, CreateUser, EmailRequest, LoginRequest, LoginResponse, RegisterRequest,
        RegisterResponse, UpdateUser, User, UserList, UserStats, VerificationStatus,
        VerifyEmailRequest,
    },
    Pagination,
};

/// JWT bearer scheme referenced by `security(("bearer_auth" = []))`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Token returned by `POST /api/auth/login`. Downloads also accept it as `?token=`.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory API",
        version = "1.0.0",
        description = "Asset inventory, device borrowing and digital library REST API"
    ),
    modifiers(&SecurityAddon),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::logout,
        auth::verify_email,
        auth::verify_email_link,
        auth::resend_verification,
        auth::check_verification,
        // Users
        users::list_users,
        users::get_stats,
        users::get_user,
        users::get_activity,
        users::create_user,
        users::update_user,
        users::change_password,
        users::delete_user,
        // Assets
        assets::list_assets,
        assets::get_stats,
        assets::search_assets,
        assets::export_assets,
        assets::get_asset,
        assets::create_asset,
        assets::update_asset,
        assets::delete_asset,
        upload::upload_assets,
        // Library
        library::list_items,
        library::get_stats,
        library::get_item,
        library::download_item,
        library::upload_item,
        library::update_item,
        library::delete_item,
        // Borrowings
        borrowings::list_borrowings,
        borrowings::get_stats,
        borrowings::create_borrowing,
        borrowings::return_borrowing,
        borrowings::list_devices,
        borrowings::create_device,
        borrowings::update_device_stock,
        borrowings::delete_device,
        // Dashboard
        dashboard::get_stats,
        dashboard::get_activity,
        dashboard::get_charts,
        // Chatbot
        chatbot::send_message,
        chatbot::get_history,
        chatbot::get_sessions,
        chatbot::clear_history,
        // Settings
        settings::get_settings,
        settings::update_profile,
        settings::update_password,
        settings::update_preferences,
        settings::reset_settings,
        settings::export_settings,
    ),
    components(
        schemas(
            ErrorResponse,
            Pagination,
            MessageResponse,
            // Enums
            Role,
            UserStatus,
            BorrowingStatus,
            MediaKind,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Users and auth
            User,
            UserList,
            UserStats,
            CreateUser,
            UpdateUser,
            ChangePassword,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            VerifyEmailRequest,
            EmailRequest,
            VerificationStatus,
            Activity,
            ActivityWithUser,
            // Assets
            Asset,
            AssetSummary,
            AssetList,
            AssetSearchResults,
            AssetStats,
            AssetUpdated,
            CreateAsset,
            UpdateAsset,
            UploadedAsset,
            UploadResult,
            // Library
            LibraryItem,
            LibraryList,
            LibraryStats,
            LibraryItemCreated,
            UpdateLibraryItem,
            // Borrowings
            Borrowing,
            BorrowingList,
            BorrowingStats,
            BorrowingCreated,
            CreateBorrowing,
            DeviceStock,
            CreateDevice,
            DeviceCreated,
            UpdateDeviceStock,
            // Dashboard
            DashboardStats,
            ChartData,
            MonthlyCount,
            CategoryCount,
            TypeCount,
            WeeklyActivity,
            StatusSlice,
            // Chatbot
            ChatRequest,
            ChatReply,
            ChatExchange,
            ChatHistory,
            ChatSession,
            ChatSessions,
            ClearHistory,
            chatbot::HistoryCleared,
            // Settings
            Settings,
            Profile,
            Preferences,
            NotificationPreferences,
            SystemPreferences,
            UpdateProfile,
            UpdatePassword,
            UpdatePreferences,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and email verification"),
        (name = "users", description = "User management"),
        (name = "assets", description = "Asset records and uploads"),
        (name = "library", description = "Digital library"),
        (name = "borrowings", description = "Device borrowing and stock"),
        (name = "dashboard", description = "Dashboard statistics and charts"),
        (name = "chatbot", description = "Site assistant"),
        (name = "settings", description = "Settings of the current user")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_borrowing_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/borrowings"));
        assert!(doc.paths.paths.contains_key("/api/borrowings/{id}/return"));
        assert!(doc.paths.paths.contains_key("/api/borrowings/devices/{id}/stock"));
        assert!(doc.paths.paths.contains_key("/health"));
    }

    #[test]
    fn test_bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
