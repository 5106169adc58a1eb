pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};

use crate::models::UserSummary;

pub use extractors::CurrentUser;
pub use middleware::AuthGuard;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenCodec, TokenError};

/// Represents the payload for a login request.
///
/// No format rules apply here: unknown credentials are simply rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by a successful login: the session token and who it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Lower-cased, trimmed email used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_request_deserialization() {
        let login: LoginRequest =
            serde_json::from_value(json!({ "email": "a@x.com", "password": "p" })).unwrap();
        assert_eq!(login.email, "a@x.com");
        assert_eq!(login.password, "p");

        let missing: Result<LoginRequest, _> =
            serde_json::from_value(json!({ "email": "a@x.com" }));
        assert!(missing.is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.com "), "a@x.com");
    }

    #[test]
    fn test_auth_response_shape() {
        let response = AuthResponse {
            token: "t".into(),
            user: UserSummary {
                id: 1,
                email: "a@x.com".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({ "token": "t", "user": { "id": 1, "email": "a@x.com" } })
        );
    }
}
