use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{non_blank, require, ParamKey};
use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::error::{FieldErrors, BLANK};

/// A registered account. The credential hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The identity returned alongside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Attributes accepted when creating or updating a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UserAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "is invalid"))]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        custom = "non_blank",
        length(max = 72, message = "is too long (maximum is 72 characters)")
    )]
    pub password: Option<String>,
}

impl ParamKey for UserAttrs {
    const KEY: &'static str = "user";
}

impl UserAttrs {
    /// Format checks on whatever is present.
    pub fn check(&self) -> FieldErrors {
        let mut errors = self.validate().err().map(FieldErrors::from).unwrap_or_default();
        // validator counts chars, bcrypt counts bytes.
        if let Some(password) = &self.password {
            if password.len() > MAX_PASSWORD_BYTES && errors.get("password").is_none() {
                errors.add("password", "is too long (maximum is 72 characters)");
            }
        }
        errors
    }

    /// Format checks plus presence of email and password.
    pub fn check_for_create(&self) -> FieldErrors {
        let mut errors = self.check();
        if self.email.as_deref().map_or(true, |e| e.trim().is_empty()) {
            errors.add("email", BLANK);
        }
        require(&mut errors, "password", &self.password);
        errors
    }
}
