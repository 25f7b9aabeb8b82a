//! Sign-up, login and token handlers

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use tracing::info;

use core_kernel::FieldErrors;
use domain_account::password::hash_password;
use domain_account::validation::{normalize_email, PASSWORD_MISMATCH};
use domain_account::{check_login, AccountError, RegistrationForm};

use crate::auth::{AuthError, Claims, TokenKind};
use crate::dto::auth::*;
use crate::dto::MessageResponse;
use crate::error::ApiError;
use crate::extract::AppJson;
use crate::handlers::deliver;
use crate::AppState;

const INVALID_LINK: &str = "This link is invalid or has expired.";

/// Creates an account and mails the verification link
pub async fn register(
    State(state): State<AppState>,
    AppJson(form): AppJson<RegistrationForm>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let users = state.users();
    let email_taken = match form.email.as_deref() {
        Some(email) => users.email_taken(&normalize_email(email), None).await?,
        None => false,
    };

    let new_user = form.validate(email_taken)?;
    let hash = hash_password(&new_user.password)?;
    let user = new_user.into_user(hash);
    users.insert(&user).await?;
    info!(user_id = %user.id, "User registered");

    let token = state.keys.issue(user.id, TokenKind::VerifyEmail)?;
    deliver(&state, state.mail.verification(&user.email, &token)).await;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. Please check your email to verify your account.".to_string(),
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut errors = FieldErrors::new();
    let email = request.email.filter(|e| !e.trim().is_empty());
    let password = request.password.filter(|p| !p.is_empty());
    if email.is_none() {
        errors.required("email");
    }
    if password.is_none() {
        errors.required("password");
    }
    let (Some(email), Some(password)) = (email, password) else {
        return Err(errors.into());
    };

    let users = state.users();
    let user = users.find_by_email(&normalize_email(&email)).await?;
    check_login(user.as_ref(), &password)?;
    let user = user.ok_or(AccountError::InvalidCredentials)?;

    users.record_login(user.id, Utc::now()).await?;
    let pair = state.keys.issue_pair(user.id)?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        access: pair.access,
        refresh: pair.refresh,
        message: "Login successful".to_string(),
    }))
}

/// Revokes the caller's refresh token
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(request): AppJson<RefreshRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.keys.validate(&request.refresh, TokenKind::Refresh) {
        Ok(refresh) if refresh.sub == claims.sub => {
            state.tokens().revoke(refresh.jti, refresh.expires_at()).await?;
        }
        Ok(_) => return Err(ApiError::invalid("This refresh token belongs to another user.")),
        // Nothing left to revoke
        Err(AuthError::TokenExpired) => {}
        Err(e) => return Err(ApiError::invalid(e.to_string())),
    }

    info!(user_id = %claims.sub, "User logged out");
    Ok(Json(MessageResponse::new("Logout successful")))
}

/// Exchanges a refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(request): AppJson<RefreshRequest>,
) -> Result<Json<AccessResponse>, ApiError> {
    let claims = state.keys.validate(&request.refresh, TokenKind::Refresh)?;
    if state.tokens().is_revoked(claims.jti).await? {
        return Err(AuthError::TokenRevoked.into());
    }
    if state.users().find(claims.sub).await?.is_none() {
        return Err(AuthError::InvalidToken.into());
    }

    let access = state.keys.issue(claims.sub, TokenKind::Access)?;
    Ok(Json(AccessResponse { access }))
}

pub async fn verify_email(
    State(state): State<AppState>,
    AppJson(request): AppJson<TokenRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let claims = state
        .keys
        .validate(&request.token, TokenKind::VerifyEmail)
        .map_err(|_| ApiError::invalid(INVALID_LINK))?;

    state.users().mark_email_verified(claims.sub).await?;
    info!(user_id = %claims.sub, "Email verified");
    Ok(Json(MessageResponse::new("Email verified successfully. You can now log in.")))
}

pub async fn resend_verification(
    State(state): State<AppState>,
    AppJson(request): AppJson<EmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state
        .users()
        .find_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(|| ApiError::NotFound("No account found with this email.".to_string()))?;

    if user.email_verified {
        return Err(ApiError::invalid("This email is already verified."));
    }

    let token = state.keys.issue(user.id, TokenKind::VerifyEmail)?;
    deliver(&state, state.mail.verification(&user.email, &token)).await;
    Ok(Json(MessageResponse::new("Verification email sent.")))
}

/// Mails a reset link; the answer is the same whether or not the account exists
pub async fn password_reset(
    State(state): State<AppState>,
    AppJson(request): AppJson<EmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Some(user) = state.users().find_by_email(&normalize_email(&request.email)).await? {
        let token = state.keys.issue(user.id, TokenKind::PasswordReset)?;
        deliver(&state, state.mail.password_reset(&user.email, &token)).await;
    }
    Ok(Json(MessageResponse::new(
        "If an account exists for this email, a password reset link has been sent.",
    )))
}

pub async fn password_reset_confirm(
    State(state): State<AppState>,
    AppJson(request): AppJson<PasswordResetConfirm>,
) -> Result<Json<MessageResponse>, ApiError> {
    let claims = state
        .keys
        .validate(&request.token, TokenKind::PasswordReset)
        .map_err(|_| ApiError::invalid(INVALID_LINK))?;

    let mut errors = FieldErrors::new();
    let password = request.password.filter(|p| !p.is_empty());
    let confirmation = request.password_confirmation.filter(|p| !p.is_empty());
    if password.is_none() {
        errors.required("password");
    }
    if confirmation.is_none() {
        errors.required("password_confirmation");
    }
    let (Some(password), Some(confirmation)) = (password, confirmation) else {
        return Err(errors.into());
    };
    if password != confirmation {
        return Err(FieldErrors::single("password", PASSWORD_MISMATCH).into());
    }

    let hash = hash_password(&password)?;
    state.users().set_password_hash(claims.sub, &hash).await?;
    info!(user_id = %claims.sub, "Password reset");
    Ok(Json(MessageResponse::new("Your password has been reset.")))
}
