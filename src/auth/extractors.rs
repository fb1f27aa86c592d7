use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::{JwtKeys, TokenError};
use crate::auth::repo::User;
use crate::error::{ApiError, AuthError};
use crate::state::AppState;

/// Access gate: resolves the bearer token to an active user on every request.
/// Account state is read fresh from the database, so deactivation takes
/// effect immediately even while a token is still within its lifetime.
pub struct CurrentUser(pub User);

fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::InvalidToken)?;

        let token = bearer_token(header).ok_or(AuthError::InvalidToken)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| match e {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::InvalidSignature | TokenError::Malformed => AuthError::InvalidToken,
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::UnknownSubject)?;

        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UnknownSubject)?;

        if !user.is_active {
            warn!(user_id = %user.id, "inactive user rejected");
            return Err(AuthError::InactiveUser.into());
        }

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_accepts_both_scheme_spellings() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
        assert_eq!(bearer_token(""), None);
    }
}
