use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// How long an issued token stays valid.
pub const TOKEN_TTL_HOURS: i64 = 12;

/// The claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user.
    pub sub: Uuid,
    /// Unix timestamp the token was issued at.
    pub iat: i64,
    /// Unix timestamp the token expires at (`iat` + fixed TTL).
    pub exp: i64,
}

/// The ways a presented token can fail validation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed, unverifiable, or signed under a different algorithm or key.
    #[error("Token is invalid")]
    Invalid,
    /// Verified but past its expiry.
    #[error("Token has expired")]
    Expired,
}

/// Issues and validates signed, time-bounded identity tokens.
///
/// The signing algorithm is pinned to HS256: tokens declaring any other
/// algorithm are rejected outright, so there is no negotiation to downgrade.
/// There is no server-side revocation; a leaked token stays valid until its
/// natural expiry.
#[derive(Clone)]
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionTokenService {
    /// Creates a new `SessionTokenService` signing with the given secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: `now <= exp` with no grace window.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issues a token for `subject`, valid for the fixed TTL.
    pub fn issue(&self, subject: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Validates a token and returns its subject.
    ///
    /// The signature is verified before any claim is trusted; only then is
    /// expiry checked, so `Expired` always means "verified but stale".
    pub fn validate(&self, token: &str) -> std::result::Result<Uuid, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-secret";

    #[test]
    fn issue_then_validate_returns_subject() {
        let service = SessionTokenService::new(SECRET);
        let subject = Uuid::new_v4();

        let token = service.issue(subject).unwrap();
        assert_eq!(service.validate(&token), Ok(subject));
    }

    #[test]
    fn expired_token_is_expired_not_invalid() {
        let service = SessionTokenService::new(SECRET);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now - 2 * 3600,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(service.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_key_is_invalid() {
        let service = SessionTokenService::new(SECRET);
        let other = SessionTokenService::new("some-other-secret");

        let token = other.issue(Uuid::new_v4()).unwrap();
        assert_eq!(service.validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn foreign_algorithm_is_invalid() {
        let service = SessionTokenService::new(SECRET);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now,
            exp: now + 3600,
        };
        // Same secret, different declared algorithm: must be rejected.
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(service.validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_invalid() {
        let service = SessionTokenService::new(SECRET);
        assert_eq!(service.validate("not.a.token"), Err(TokenError::Invalid));
        assert_eq!(service.validate(""), Err(TokenError::Invalid));
    }
}
