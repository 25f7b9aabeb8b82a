//! Authentication
//!
//! Every token is an HS256 JWT carrying a `kind`, so an access token can
//! never be replayed as a refresh token or as an emailed link. Refresh
//! tokens are revoked on logout by their `jti`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use core_kernel::UserId;

use crate::config::ApiConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    VerifyEmail,
    PasswordReset,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: UserId,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
    /// Token ID, used to revoke refresh tokens
    pub jti: Uuid,
    pub kind: TokenKind,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided.")]
    MissingToken,
    #[error("Token is invalid.")]
    InvalidToken,
    #[error("Token has expired.")]
    TokenExpired,
    #[error("Token has been revoked.")]
    TokenRevoked,
    #[error("Token could not be issued: {0}")]
    Encoding(String),
}

/// Access and refresh token returned on login
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signing keys and token lifetimes
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_secs: i64,
    refresh_secs: i64,
    link_secs: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, access_secs: u64, refresh_secs: u64, link_secs: u64) -> Self {
        let secs = |s: u64| i64::try_from(s).unwrap_or(i64::MAX / 2);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_secs: secs(access_secs),
            refresh_secs: secs(refresh_secs),
            link_secs: secs(link_secs),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.access_token_secs,
            config.refresh_token_secs,
            config.link_token_secs,
        )
    }

    fn lifetime(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_secs,
            TokenKind::Refresh => self.refresh_secs,
            TokenKind::VerifyEmail | TokenKind::PasswordReset => self.link_secs,
        }
    }

    /// Creates a signed token of `kind` for `user_id`
    pub fn issue(&self, user_id: UserId, kind: TokenKind) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            exp: (now + Duration::seconds(self.lifetime(kind))).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
            kind,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(user_id, TokenKind::Access)?,
            refresh: self.issue(user_id, TokenKind::Refresh)?,
        })
    }

    /// Validates a token and checks that it is of the `expected` kind
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        if data.claims.kind != expected {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret", 60, 3600, 600)
    }

    #[test]
    fn test_issue_and_validate() {
        let user = UserId::new();
        let token = keys().issue(user, TokenKind::Access).unwrap();
        let claims = keys().validate(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id(), user);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let pair = keys().issue_pair(UserId::new()).unwrap();
        assert!(matches!(
            keys().validate(&pair.refresh, TokenKind::Access),
            Err(AuthError::InvalidToken)
        ));
        assert!(keys().validate(&pair.refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = keys().issue(UserId::new(), TokenKind::Access).unwrap();
        let other = JwtKeys::new("other-secret", 60, 60, 60);
        assert!(matches!(other.validate(&token, TokenKind::Access), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let expired = JwtKeys {
            access_secs: -120,
            ..keys()
        };
        let token = expired.issue(UserId::new(), TokenKind::Access).unwrap();
        assert!(matches!(keys().validate(&token, TokenKind::Access), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(None), None);
    }
}
