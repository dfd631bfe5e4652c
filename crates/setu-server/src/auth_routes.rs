//! Account registration and login.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use setu_api::ApiError;
use setu_auth::{Role, hash_password, verify_password};
use setu_core::time::now_utc;
use setu_storage::{UserRecord, UserStore};
use uuid::Uuid;

use crate::server::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub username: String,
    pub roles: Vec<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, ApiError> {
    let user = state
        .users
        .find_by_username(&credentials.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let valid = verify_password(&credentials.password, &user.password_hash)
        .map_err(|err| ApiError::internal(format!("password verification failed: {err}")))?;
    if !valid {
        tracing::debug!(username = %credentials.username, "Login rejected");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = state
        .jwt
        .issue(&user.username, &user.roles)
        .map_err(|err| ApiError::internal(format!("token issuance failed: {err}")))?;

    tracing::info!(username = %user.username, "Login succeeded");
    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in: state.jwt.expiration_secs(),
    })
    .into_response())
}

pub async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, ApiError> {
    create_account(&state, credentials, vec![Role::User.to_string()]).await
}

/// Bootstraps administrator accounts. Reachable without a token so a fresh
/// deployment can create its first admin; restrict at the perimeter in
/// production.
pub async fn register_admin(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, ApiError> {
    create_account(
        &state,
        credentials,
        vec![Role::Admin.to_string(), Role::User.to_string()],
    )
    .await
}

async fn create_account(
    state: &AppState,
    credentials: Credentials,
    roles: Vec<String>,
) -> Result<Response, ApiError> {
    let username = credentials.username.trim();
    if username.is_empty() {
        return Err(ApiError::bad_request("username is required"));
    }
    if credentials.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = hash_password(&credentials.password)
        .map_err(|err| ApiError::internal(format!("password hashing failed: {err}")))?;

    let record = UserRecord {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash,
        roles: roles.clone(),
        created_at: now_utc(),
    };
    state.users.create(record).await?;

    tracing::info!(username, ?roles, "Account registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            username: username.to_string(),
            roles,
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_response_shape() {
        let response = TokenResponse {
            access_token: "abc".into(),
            token_type: "Bearer",
            expires_in: 3600,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"accessToken": "abc", "tokenType": "Bearer", "expiresIn": 3600})
        );
    }
}
