//! Bearer token issuing and verification
//!
//! Tokens are HS256 JWTs carrying `{sub, iat, exp}`. Verification is
//! stateless: a token is good until `exp`, checked with zero leeway.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject user id; JWT subjects are strings
    sub: String,
    iat: i64,
    exp: i64,
}

/// A freshly signed token and the moment it stops being accepted
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Well-formed but not signed by us, or signed with another algorithm
    #[error("invalid token")]
    Invalid,

    #[error("token expired")]
    Expired,

    /// Not a JWT at all: bad segments, base64 or claims JSON
    #[error("malformed token")]
    Malformed,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.secret, Duration::hours(config.token_ttl_hours))
    }

    /// Sign a token for `subject_id`, valid for the configured lifetime
    pub fn issue(&self, subject_id: i64) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let token = self.sign(&Claims {
            sub: subject_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        })?;

        // `exp` has second precision; report what the token actually carries.
        let expires_at = Utc
            .timestamp_opt(expires_at.timestamp(), 0)
            .single()
            .unwrap_or(expires_at);

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature and expiry, returning the subject id
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                    TokenError::Malformed
                }
                _ => TokenError::Invalid,
            })?;

        data.claims.sub.parse().map_err(|_| TokenError::Invalid)
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .context("Failed to sign token")
    }
}
