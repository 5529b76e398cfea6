//! Registration, login and email verification endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        settings::MessageResponse,
        user::{
            EmailRequest, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
            VerificationStatus, VerifyEmailRequest,
        },
    },
};

use super::{AuthenticatedUser, Json};

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification email sent", body = RegisterResponse),
        (status = 400, description = "Invalid input or email already registered")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    request.validate()?;

    let user_id = state.services.users.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "Registration successful. Please check your email to verify your account."
                .to_string(),
            user_id,
        }),
    ))
}

/// Authenticate user and return JWT token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Email not verified or account inactive")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    request.validate()?;

    let (token, user) = state
        .services
        .users
        .login(request.email.trim(), &request.password)
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        token,
        user,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Json<MessageResponse> {
    state.services.users.logout(&claims).await;
    Json(MessageResponse::ok("Logged out successfully"))
}

async fn verify(state: &crate::AppState, request: VerifyEmailRequest) -> AppResult<Json<MessageResponse>> {
    request.validate()?;
    let user = state.services.users.verify_email(&request.token).await?;
    tracing::debug!(user_id = user.id, "Verification link consumed");
    Ok(Json(MessageResponse::ok(
        "Email verified successfully. You can now log in.",
    )))
}

/// Verify an email address with the token from the verification email
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    tag = "auth",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn verify_email(
    State(state): State<crate::AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    verify(&state, request).await
}

/// Same as the POST variant, for links opened from the email
#[utoipa::path(
    get,
    path = "/api/auth/verify-email",
    tag = "auth",
    params(VerifyEmailRequest),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn verify_email_link(
    State(state): State<crate::AppState>,
    Query(request): Query<VerifyEmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    verify(&state, request).await
}

/// Send a new verification email
#[utoipa::path(
    post,
    path = "/api/auth/resend-verification",
    tag = "auth",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Verification email sent", body = MessageResponse),
        (status = 400, description = "Email already verified"),
        (status = 404, description = "User not found")
    )
)]
pub async fn resend_verification(
    State(state): State<crate::AppState>,
    Json(request): Json<EmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    request.validate()?;
    state
        .services
        .users
        .resend_verification(request.email.trim())
        .await?;
    Ok(Json(MessageResponse::ok("Verification email sent successfully")))
}

/// Whether an email address has been verified
#[utoipa::path(
    post,
    path = "/api/auth/check-verification",
    tag = "auth",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Verification status", body = VerificationStatus),
        (status = 404, description = "User not found")
    )
)]
pub async fn check_verification(
    State(state): State<crate::AppState>,
    Json(request): Json<EmailRequest>,
) -> AppResult<Json<VerificationStatus>> {
    request.validate()?;
    let email_verified = state
        .services
        .users
        .is_email_verified(request.email.trim())
        .await?;

    let message = if email_verified {
        "Email is verified"
    } else {
        "Email is not verified"
    };
    Ok(Json(VerificationStatus {
        success: true,
        email_verified,
        message: message.to_string(),
    }))
}
