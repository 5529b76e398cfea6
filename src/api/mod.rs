//! API handlers for the inventory REST endpoints

pub mod assets;
pub mod auth;
pub mod borrowings;
pub mod chatbot;
pub mod dashboard;
pub mod health;
pub mod library;
pub mod openapi;
pub mod settings;
pub mod upload;
pub mod users;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Router,
};
use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    error::{AppError, ErrorResponse},
    models::user::UserClaims,
    AppState,
};

/// JSON body extractor and response. Malformed bodies are rejected with the
/// API error envelope instead of axum's plain-text 415/422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Bearer token from the Authorization header, else the `token` query parameter
fn request_token(parts: &Parts) -> Option<String> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = header {
        return Some(token.to_string());
    }

    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = request_token(parts)
            .ok_or_else(|| AppError::Authentication("Access token required".to_string()))?;

        let claims = UserClaims::from_token(&token, &state.config.auth.jwt_secret).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Authentication("Token expired".to_string()),
                _ => AppError::Authorization("Invalid token".to_string()),
            }
        })?;

        Ok(AuthenticatedUser(claims))
    }
}

async fn not_found() -> (axum::http::StatusCode, Json<ErrorResponse>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            code: crate::error::ErrorCode::NotFound as u32,
            error: "NotFound".to_string(),
            message: "Route not found".to_string(),
            available: None,
        }),
    )
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(frontend_url) {
        Ok(origin) if frontend_url != "*" => AllowOrigin::exact(origin),
        _ => AllowOrigin::any(),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.uploads.max_file_size_bytes as usize
        * state.config.uploads.max_files_per_request.max(1)
        + 1024 * 1024;

    let api = Router::new()
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/verify-email", post(auth::verify_email).get(auth::verify_email_link))
        .route("/auth/resend-verification", post(auth::resend_verification))
        .route("/auth/check-verification", post(auth::check_verification))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/stats", get(users::get_stats))
        .route("/users/:id", get(users::get_user).put(users::update_user).delete(users::delete_user))
        .route("/users/:id/password", put(users::change_password))
        .route("/users/:id/activity", get(users::get_activity))
        // Assets
        .route("/assets", get(assets::list_assets).post(assets::create_asset))
        .route("/assets/stats", get(assets::get_stats))
        .route("/assets/search", get(assets::search_assets))
        .route("/assets/export", get(assets::export_assets))
        .route("/assets/:id", get(assets::get_asset).put(assets::update_asset).delete(assets::delete_asset))
        .route("/upload/assets", post(upload::upload_assets))
        // Library
        .route("/library", get(library::list_items).post(library::upload_item))
        .route("/library/stats", get(library::get_stats))
        .route("/library/:id", get(library::get_item).put(library::update_item).delete(library::delete_item))
        .route("/library/:id/download", get(library::download_item))
        // Borrowings
        .route("/borrowings", get(borrowings::list_borrowings).post(borrowings::create_borrowing))
        .route("/borrowings/stats", get(borrowings::get_stats))
        .route("/borrowings/devices", get(borrowings::list_devices).post(borrowings::create_device))
        .route("/borrowings/devices/:id/stock", put(borrowings::update_device_stock))
        .route("/borrowings/devices/:id", delete(borrowings::delete_device))
        .route("/borrowings/:id/return", patch(borrowings::return_borrowing))
        // Dashboard
        .route("/dashboard/stats", get(dashboard::get_stats))
        .route("/dashboard/activity", get(dashboard::get_activity))
        .route("/dashboard/charts", get(dashboard::get_charts))
        // Chatbot
        .route("/chatbot/message", post(chatbot::send_message))
        .route("/chatbot/history", get(chatbot::get_history).delete(chatbot::clear_history))
        .route("/chatbot/sessions", get(chatbot::get_sessions))
        // Settings
        .route("/settings", get(settings::get_settings))
        .route("/settings/profile", put(settings::update_profile))
        .route("/settings/password", put(settings::update_password))
        .route("/settings/preferences", put(settings::update_preferences))
        .route("/settings/reset", post(settings::reset_settings))
        .route("/settings/export", get(settings::export_settings))
        .layer(DefaultBodyLimit::max(upload_limit));

    let uploads = ServeDir::new(state.services.storage.root());
    let cors = cors_layer(&state.config.server.frontend_url);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api)
        .nest_service("/uploads", uploads)
        .fallback(not_found)
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_token_from_header() {
        let parts = parts("/api/assets", Some("Bearer abc.def"));
        assert_eq!(request_token(&parts).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_token_from_query() {
        let parts = parts("/api/library/1/download?token=xyz", None);
        assert_eq!(request_token(&parts).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_header_wins_over_query() {
        let parts = parts("/api/assets?token=query", Some("Bearer header"));
        assert_eq!(request_token(&parts).as_deref(), Some("header"));
    }

    #[test]
    fn test_missing_or_malformed_token() {
        assert!(request_token(&parts("/api/assets", None)).is_none());
        assert!(request_token(&parts("/api/assets", Some("Basic dXNlcg=="))).is_none());
        assert!(request_token(&parts("/api/assets?token=", None)).is_none());
    }
}
