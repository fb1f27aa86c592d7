use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Lowercased, trimmed email plus length-checked password. Lowercasing at the
/// boundary is what makes the unique index case-insensitive in practice.
pub fn validate_credentials(email: &str, password: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if password.len() < 6 || password.len() > 128 {
        return Err(ApiError::Validation(
            "Password must be between 6 and 128 characters".into(),
        ));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("@x.com"));
    }

    #[test]
    fn validate_credentials_normalizes_email() {
        let email = validate_credentials("  A@X.Com ", "secret123").expect("valid");
        assert_eq!(email, "a@x.com");
    }

    #[test]
    fn validate_credentials_enforces_password_bounds() {
        assert!(validate_credentials("a@x.com", "12345").is_err());
        assert!(validate_credentials("a@x.com", "123456").is_ok());
        assert!(validate_credentials("a@x.com", &"p".repeat(128)).is_ok());
        assert!(validate_credentials("a@x.com", &"p".repeat(129)).is_err());
    }

    #[test]
    fn user_out_serializes_public_fields() {
        let out = UserOut {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["is_active"], true);
        assert!(json.get("password_hash").is_none());
    }
}
