// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and token-refresh endpoints.
//!
//! Thin proxies over the provider's InitiateAuth flows: credentials go to
//! the user pool, the pool's tokens come back. The service never stores or
//! checks passwords itself, and provider rejections surface as a generic
//! 401 without echoing the provider's reason to the caller.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::flow::{AuthTokens, FlowError};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    pub expires_in: u64,
}

fn map_flow_error(err: FlowError, rejected_error: &str, rejected_message: &str) -> ApiError {
    match err {
        FlowError::Rejected(kind) => {
            warn!(kind = %kind, "provider rejected auth flow");
            ApiError::unauthorized(rejected_error, rejected_message)
        }
        err => {
            warn!(error = %err, "auth flow failed");
            ApiError::bad_gateway(
                "Identity provider unavailable",
                "Could not reach the identity provider",
            )
        }
    }
}

/// `POST /v1/auth/login` - password authentication against the user pool.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request(
            "Missing credentials",
            "Username and password are required",
        ));
    }

    let tokens: AuthTokens = state
        .flow
        .password_auth(&request.username, &request.password)
        .await
        .map_err(|err| {
            map_flow_error(
                err,
                "Authentication failed",
                "Invalid username or password",
            )
        })?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        id_token: tokens.id_token,
        expires_in: tokens.expires_in,
    }))
}

/// `POST /v1/auth/refresh` - exchange a refresh token for fresh tokens.
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    if request.refresh_token.is_empty() {
        return Err(ApiError::bad_request(
            "Missing refresh token",
            "Refresh token is required",
        ));
    }

    let tokens = state
        .flow
        .refresh_auth(&request.refresh_token)
        .await
        .map_err(|err| {
            map_flow_error(err, "Token refresh failed", "Invalid refresh token")
        })?;

    Ok(Json(RefreshResponse {
        access_token: tokens.access_token,
        id_token: tokens.id_token,
        expires_in: tokens.expires_in,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing;

    #[tokio::test]
    async fn login_requires_credentials() {
        let state = AppState::for_tests(testing::config(), testing::jwks());
        let result = login(
            State(state),
            Json(LoginRequest {
                username: "alice".to_string(),
                password: String::new(),
            }),
        )
        .await;

        let err = result.err().expect("rejected");
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.error, "Missing credentials");
    }

    #[tokio::test]
    async fn refresh_requires_token() {
        let state = AppState::for_tests(testing::config(), testing::jwks());
        let result = refresh(
            State(state),
            Json(RefreshRequest {
                refresh_token: String::new(),
            }),
        )
        .await;

        let err = result.err().expect("rejected");
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.error, "Missing refresh token");
    }
}
