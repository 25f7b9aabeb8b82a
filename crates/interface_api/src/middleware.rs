//! API middleware

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};

use crate::auth::{bearer_token, AuthError, Claims, TokenKind};
use crate::error::ApiError;
use crate::AppState;

fn authorization(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
}

/// Authentication middleware
///
/// Validates the access token and adds its claims to the request
/// extensions. Requests without a valid token get a 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(authorization(&request)) else {
        warn!(uri = %request.uri(), "Missing or invalid Authorization header");
        return Err(AuthError::MissingToken.into());
    };

    match state.keys.validate(token, TokenKind::Access) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(e) => {
            warn!(error = %e, "Token validation failed");
            Err(e.into())
        }
    }
}

/// Optional authentication
///
/// Anonymous requests pass through untouched; a valid access token adds
/// its claims exactly like [`auth_middleware`]. An invalid token is still a 401.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = bearer_token(authorization(&request)) {
        let claims = state.keys.validate(token, TokenKind::Access).map_err(|e| {
            warn!(error = %e, "Token validation failed");
            ApiError::from(e)
        })?;
        request.extensions_mut().insert(claims);
    }
    Ok(next.run(request).await)
}

/// Audit logging middleware
///
/// Logs every API request with the caller and its duration
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_id = request
        .extensions()
        .get::<Claims>()
        .map(|c| c.sub.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        user = %user_id,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
