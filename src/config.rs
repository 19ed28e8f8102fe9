// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and the [`AuthConfig`]
//! value loaded from them at startup. The config is constructed once and
//! passed explicitly to the components that need it; there is no global
//! configuration state.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AWS_REGION` | Region of the Cognito user pool | `us-east-1` |
//! | `COGNITO_USER_POOL_ID` | Cognito user pool identifier | Required for verification |
//! | `COGNITO_CLIENT_ID` | App client id (expected `aud` claim) | Required for verification |
//! | `COGNITO_CLIENT_SECRET` | App client secret (enables SECRET_HASH) | Optional |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;

/// Environment variable name for the user pool region.
pub const AWS_REGION_ENV: &str = "AWS_REGION";

/// Environment variable name for the Cognito user pool identifier.
pub const USER_POOL_ID_ENV: &str = "COGNITO_USER_POOL_ID";

/// Environment variable name for the Cognito app client id.
pub const CLIENT_ID_ENV: &str = "COGNITO_CLIENT_ID";

/// Environment variable name for the Cognito app client secret.
pub const CLIENT_SECRET_ENV: &str = "COGNITO_CLIENT_SECRET";

/// Region used when `AWS_REGION` is not set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Cognito connection settings.
///
/// `user_pool_id` is optional so the service stays constructible when the
/// pool is not configured (health endpoints must come up regardless); token
/// verification then rejects every token because the key set stays empty.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// AWS region hosting the user pool (e.g. `us-east-1`).
    pub region: String,
    /// User pool identifier (e.g. `us-east-1_AbCdEfGhI`).
    pub user_pool_id: Option<String>,
    /// App client id; tokens must carry this as their `aud` claim.
    pub client_id: String,
    /// App client secret; when present, authentication-flow requests must
    /// include a SECRET_HASH.
    pub client_secret: Option<String>,
}

impl AuthConfig {
    /// Create a config with explicit values (used by tests and embedders).
    pub fn new(
        region: impl Into<String>,
        user_pool_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            user_pool_id: Some(user_pool_id.into()),
            client_id: client_id.into(),
            client_secret: None,
        }
    }

    /// Set the app client secret.
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Load the config from the environment.
    pub fn from_env() -> Self {
        Self {
            region: env::var(AWS_REGION_ENV).unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            user_pool_id: env::var(USER_POOL_ID_ENV).ok().filter(|v| !v.is_empty()),
            client_id: env::var(CLIENT_ID_ENV).unwrap_or_default(),
            client_secret: env::var(CLIENT_SECRET_ENV).ok().filter(|v| !v.is_empty()),
        }
    }

    /// Expected `iss` claim for tokens from this pool.
    ///
    /// `None` when the pool is not configured.
    pub fn issuer(&self) -> Option<String> {
        self.user_pool_id
            .as_ref()
            .map(|pool| format!("https://cognito-idp.{}.amazonaws.com/{}", self.region, pool))
    }

    /// JWKS document URL for this pool.
    pub fn jwks_url(&self) -> Option<String> {
        self.issuer()
            .map(|issuer| format!("{issuer}/.well-known/jwks.json"))
    }

    /// Cognito identity provider API endpoint for this region.
    pub fn provider_endpoint(&self) -> String {
        format!("https://cognito-idp.{}.amazonaws.com/", self.region)
    }
}
