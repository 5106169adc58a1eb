use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identifier of the user the token was issued to.
    pub user_id: i64,
    /// Issue timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Why a token could not be issued or verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The signature does not match the payload under the given secret.
    InvalidSignature,
    /// `exp` lies in the past.
    Expired,
    /// Not a JWT, or the payload is not a valid claim set.
    Malformed(String),
    /// Signing failed while issuing.
    Encoding(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "Invalid token: InvalidSignature"),
            TokenError::Expired => write!(f, "Invalid token: ExpiredSignature"),
            TokenError::Malformed(msg) => write!(f, "Invalid token: {}", msg),
            TokenError::Encoding(msg) => write!(f, "Failed to encode token: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(error.to_string()),
        }
    }
}

/// Signs `{user_id, iat, exp}` with HS256, issued now.
pub fn issue(user_id: i64, secret: &str, expires_at: DateTime<Utc>) -> Result<String, TokenError> {
    issue_at(user_id, secret, Utc::now(), expires_at)
}

/// Signs a token with an explicit issue time. Identical inputs yield identical tokens.
pub fn issue_at(
    user_id: i64,
    secret: &str,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<String, TokenError> {
    let claims = Claims {
        user_id,
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Decodes and checks a token, returning its full claim set.
///
/// Expiry is checked with zero leeway.
pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// Verifies a token and returns the user identifier it carries.
pub fn verify(token: &str, secret: &str) -> Result<i64, TokenError> {
    decode_claims(token, secret).map(|claims| claims.user_id)
}

/// Secret and token lifetime, shared by the login handler and the auth guard.
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Encoding("token lifetime out of range".into()))?;
        issue_at(user_id, &self.secret, now, expires_at)
    }

    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        verify(token, &self.secret)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"[redacted]")
            .field("ttl", &self.ttl)
            .finish()
    }
}
