//! Session and verification tokens.
//!
//! Both token kinds are signed HS256 with the same process secret but carry
//! disjoint claim shapes, so one can never be validated as the other: a
//! session token identifies a subject user, a verification token proves
//! control of an email address for five minutes.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Verification tokens are single-purpose and short-lived.
const VERIFICATION_TTL_MINUTES: i64 = 5;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionClaims {
    /// Subject user id, stored as a string claim.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationClaims {
    pub email: String,
    pub exp: i64,
}

/// Classified token-validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token is malformed")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and validates signed tokens. Holds the signing secret and session
/// TTL as an immutable value so parallel instances can run with different
/// secrets.
#[derive(Debug, Clone)]
pub struct TokenService {
    secret: String,
    session_ttl_seconds: u64,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, session_ttl_seconds: u64) -> Self {
        Self {
            secret: secret.into(),
            session_ttl_seconds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jwt_secret.clone(), config.jwt_expiration_seconds)
    }

    /// Encodes a session token for the given user.
    pub fn issue_session(&self, user_id: i32) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.session_ttl_seconds as i64)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?;
        Ok(token)
    }

    /// Encodes a five-minute verification token bound to an email address.
    pub fn issue_verification(&self, email: &str) -> anyhow::Result<String> {
        let claims = VerificationClaims {
            email: email.to_string(),
            exp: (Utc::now() + Duration::minutes(VERIFICATION_TTL_MINUTES)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?;
        Ok(token)
    }

    /// Validates a session token and returns the subject user id.
    pub fn validate_session(&self, token: &str) -> Result<i32, TokenError> {
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &self.validation(),
        )?;
        data.claims.sub.parse().map_err(|_| TokenError::Malformed)
    }

    /// Validates a verification token and returns the bound email address.
    pub fn validate_verification(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<VerificationClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &self.validation(),
        )?;
        Ok(data.claims.email)
    }

    // Only HS256 is ever accepted; a token asserting any other algorithm in
    // its header fails before signature verification.
    fn validation(&self) -> Validation {
        Validation::new(Algorithm::HS256)
    }
}
