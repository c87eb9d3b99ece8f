use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use yamdb_model::UserId;

pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token is invalid or expired")]
    Expired,
    #[error("Token has wrong type")]
    WrongType,
    #[error("Token is invalid: {0}")]
    Invalid(String),
    #[error("Token lifetime overflows the expiry timestamp")]
    LifetimeOverflow,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err.to_string()),
        }
    }
}

/// HS256 access token issuer and verifier.
#[derive(Clone)]
pub struct AccessTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for AccessTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokens")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl AccessTokens {
    pub fn new(secret: &[u8], ttl: std::time::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::LifetimeOverflow)?;
        let claims = Claims {
            user_id,
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            exp: expires.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(TokenError::WrongType);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tokens() -> AccessTokens {
        AccessTokens::new(b"jwt-test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn issued_token_validates() {
        let tokens = tokens();
        let token = tokens.issue(UserId(42)).unwrap();
        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.user_id, UserId(42));
        assert_eq!(claims.token_type, ACCESS_TOKEN_TYPE);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = tokens();
        let token = tokens
            .issue_at(UserId(1), Utc::now() - chrono::Duration::days(2))
            .unwrap();
        assert!(matches!(tokens.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = AccessTokens::new(b"someone-else", Duration::from_secs(3600));
        let token = other.issue(UserId(1)).unwrap();
        assert!(matches!(tokens().validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn oversized_lifetime_is_an_error() {
        let tokens = AccessTokens::new(b"jwt-test-secret", Duration::from_secs(10_000_000_000_000));
        assert!(matches!(
            tokens.issue(UserId(1)),
            Err(TokenError::LifetimeOverflow)
        ));

        let unbounded = AccessTokens::new(b"jwt-test-secret", Duration::MAX);
        assert!(matches!(
            unbounded.issue(UserId(1)),
            Err(TokenError::LifetimeOverflow)
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(tokens().validate("not.a.jwt").is_err());
    }
}
