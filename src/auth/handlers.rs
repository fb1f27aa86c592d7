use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::dto::{
    validate_credentials, LoginRequest, RegisterRequest, TokenResponse, UserOut,
};
use crate::auth::extractors::CurrentUser;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::User;
use crate::error::{is_unique_violation, ApiError, AuthError};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserOut>), ApiError> {
    let email = validate_credentials(&payload.email, &payload.password)?;

    // Optimistic pre-check; the unique index settles concurrent registrations.
    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Validation("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = match state.users.create(&email, &hash).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %email, "registration lost uniqueness race");
            return Err(ApiError::Conflict("Email already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = validate_credentials(&payload.email, &payload.password)?;
    let keys = JwtKeys::from_ref(&state);

    if state.config.demo.enabled
        && email == state.config.demo.email
        && payload.password == state.config.demo.password
    {
        let user = demo_user(&state, &email, &payload.password).await?;
        let access_token = keys.sign(user.id)?;
        info!(user_id = %user.id, "demo login");
        return Ok(Json(TokenResponse {
            access_token,
            token_type: "bearer",
            expires_in: keys.expires_in_secs(),
        }));
    }

    // Unknown email, inactive account and bad password are deliberately
    // indistinguishable to the caller.
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::Credentials)?;
    if !user.is_active {
        warn!(user_id = %user.id, "login on inactive account");
        return Err(ApiError::Credentials);
    }
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Credentials);
    }

    let access_token = keys.sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_in: keys.expires_in_secs(),
    }))
}

/// Demo mode provisions the configured account on its first login; a
/// deactivated demo account stays locked out.
async fn demo_user(state: &AppState, email: &str, password: &str) -> Result<User, ApiError> {
    match state.users.find_by_email(email).await? {
        Some(user) if !user.is_active => Err(AuthError::InactiveUser.into()),
        Some(user) => Ok(user),
        None => {
            let hash = hash_password(password)?;
            match state.users.create(email, &hash).await {
                Ok(user) => {
                    info!(user_id = %user.id, "demo user provisioned");
                    Ok(user)
                }
                Err(e) if is_unique_violation(&e) => {
                    Err(ApiError::Conflict("Email already registered"))
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserOut> {
    Json(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn token_response_shape() {
        let response = TokenResponse {
            access_token: "abc.def.ghi".into(),
            token_type: "bearer",
            expires_in: 86_400,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["expires_in"], 86_400);
        assert_eq!(json["access_token"], "abc.def.ghi");
    }

    #[test]
    fn user_out_from_user_keeps_identity() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$...".into(),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        };
        let out: UserOut = user.clone().into();
        assert_eq!(out.id, user.id);
        assert_eq!(out.email, user.email);
    }
}
