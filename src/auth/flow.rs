// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication-flow requests against the Cognito identity provider API.
//!
//! Two pieces: [`RequestAuthenticator`] computes the `SECRET_HASH` keyed
//! hash that pools with a client secret require on every auth-flow request,
//! and [`ProviderClient`] sends `InitiateAuth` calls (password and
//! refresh-token flows) to the regional `cognito-idp` endpoint.
//!
//! The refresh flow computes its SECRET_HASH over an empty username. That
//! is the provider's documented convention; changing it breaks refresh for
//! secret-bearing clients.

use std::collections::HashMap;
use std::time::Duration;

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

/// `X-Amz-Target` value for the InitiateAuth operation.
const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";

/// Content type of the Cognito JSON protocol.
const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// HTTP timeout for provider calls.
const FLOW_TIMEOUT: Duration = Duration::from_secs(10);

/// Computes the `SECRET_HASH` authenticator for auth-flow requests.
///
/// Only constructed when the app client has a secret; pools without one
/// must not send SECRET_HASH at all, so callers hold an
/// `Option<RequestAuthenticator>` and skip the parameter when `None`.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    client_id: String,
    client_secret: String,
}

impl RequestAuthenticator {
    /// Build from config; `None` when no client secret is configured.
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        config.client_secret.as_ref().map(|secret| Self {
            client_id: config.client_id.clone(),
            client_secret: secret.clone(),
        })
    }

    /// `base64(HMAC-SHA256(client_secret, username + client_id))`.
    ///
    /// Pure computation, no side effects. Refresh-token requests pass an
    /// empty username.
    pub fn compute(&self, username: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.client_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(username.as_bytes());
        mac.update(self.client_id.as_bytes());
        Base64::encode_string(&mac.finalize().into_bytes())
    }
}

/// Why an auth-flow request failed.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The provider rejected the credentials or the request (4xx).
    #[error("authentication rejected by the identity provider: {0}")]
    Rejected(String),
    /// The provider could not be reached or answered with a server error.
    #[error("identity provider request failed: {0}")]
    Transport(String),
    /// The provider answered something this client does not handle (e.g. a
    /// challenge instead of tokens).
    #[error("unexpected response from the identity provider: {0}")]
    Protocol(String),
}

/// Tokens returned by a successful auth flow.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthTokens {
    #[serde(rename = "AccessToken")]
    pub access_token: String,
    #[serde(rename = "RefreshToken", skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(rename = "IdToken", skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(rename = "ExpiresIn")]
    pub expires_in: u64,
    #[serde(rename = "TokenType", default)]
    pub token_type: Option<String>,
}

#[derive(Serialize)]
struct InitiateAuthRequest<'a> {
    #[serde(rename = "AuthFlow")]
    auth_flow: &'a str,
    #[serde(rename = "ClientId")]
    client_id: &'a str,
    #[serde(rename = "AuthParameters")]
    auth_parameters: HashMap<&'static str, String>,
}

#[derive(Deserialize)]
struct InitiateAuthResponse {
    #[serde(rename = "AuthenticationResult")]
    authentication_result: Option<AuthTokens>,
    #[serde(rename = "ChallengeName")]
    challenge_name: Option<String>,
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(rename = "__type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

/// Client for the Cognito identity provider's InitiateAuth API.
pub struct ProviderClient {
    endpoint: String,
    client_id: String,
    authenticator: Option<RequestAuthenticator>,
    http: reqwest::Client,
}

impl ProviderClient {
    /// Create a client for the configured pool's regional endpoint.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            endpoint: config.provider_endpoint(),
            client_id: config.client_id.clone(),
            authenticator: RequestAuthenticator::from_config(config),
            http: reqwest::Client::builder()
                .timeout(FLOW_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Override the provider endpoint (VPC endpoints, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Parameters for a `USER_PASSWORD_AUTH` request.
    pub fn password_parameters(
        &self,
        username: &str,
        password: &str,
    ) -> HashMap<&'static str, String> {
        let mut params = HashMap::from([
            ("USERNAME", username.to_string()),
            ("PASSWORD", password.to_string()),
        ]);
        if let Some(authenticator) = &self.authenticator {
            params.insert("SECRET_HASH", authenticator.compute(username));
        }
        params
    }

    /// Parameters for a `REFRESH_TOKEN_AUTH` request.
    ///
    /// SECRET_HASH is computed over the empty username here, exactly as the
    /// provider expects.
    pub fn refresh_parameters(&self, refresh_token: &str) -> HashMap<&'static str, String> {
        let mut params = HashMap::from([("REFRESH_TOKEN", refresh_token.to_string())]);
        if let Some(authenticator) = &self.authenticator {
            params.insert("SECRET_HASH", authenticator.compute(""));
        }
        params
    }

    /// Run the password flow and return the issued tokens.
    pub async fn password_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthTokens, FlowError> {
        self.initiate_auth("USER_PASSWORD_AUTH", self.password_parameters(username, password))
            .await
    }

    /// Exchange a refresh token for fresh access/id tokens.
    pub async fn refresh_auth(&self, refresh_token: &str) -> Result<AuthTokens, FlowError> {
        self.initiate_auth("REFRESH_TOKEN_AUTH", self.refresh_parameters(refresh_token))
            .await
    }

    async fn initiate_auth(
        &self,
        auth_flow: &str,
        auth_parameters: HashMap<&'static str, String>,
    ) -> Result<AuthTokens, FlowError> {
        debug!(auth_flow, "sending InitiateAuth request");

        let request = InitiateAuthRequest {
            auth_flow,
            client_id: &self.client_id,
            auth_parameters,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Amz-Target", INITIATE_AUTH_TARGET)
            .header("Content-Type", AMZ_JSON)
            .json(&request)
            .send()
            .await
            .map_err(|e| FlowError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error: ProviderError = response.json().await.unwrap_or(ProviderError {
                kind: String::new(),
                message: String::new(),
            });
            warn!(
                auth_flow,
                status = status.as_u16(),
                kind = %error.kind,
                message = %error.message,
                "InitiateAuth rejected"
            );
            if status.is_client_error() {
                return Err(FlowError::Rejected(if error.kind.is_empty() {
                    format!("HTTP {}", status.as_u16())
                } else {
                    error.kind
                }));
            }
            return Err(FlowError::Transport(format!("HTTP {}", status.as_u16())));
        }

        let body: InitiateAuthResponse = response
            .json()
            .await
            .map_err(|e| FlowError::Protocol(e.to_string()))?;

        match (body.authentication_result, body.challenge_name) {
            (Some(tokens), _) => Ok(tokens),
            (None, Some(challenge)) => Err(FlowError::Protocol(format!(
                "auth challenge '{challenge}' is not supported"
            ))),
            (None, None) => Err(FlowError::Protocol(
                "response carried no authentication result".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing;

    fn secret_config() -> AuthConfig {
        testing::config().with_client_secret(testing::CLIENT_SECRET)
    }

    #[test]
    fn secret_hash_matches_known_vector() {
        // HMAC-SHA256(key="test-client-secret", msg="alice" + "test-client-id"),
        // base64-encoded.
        let authenticator = RequestAuthenticator::from_config(&secret_config()).unwrap();
        assert_eq!(
            authenticator.compute("alice"),
            "Opn7TaCzlMmod4CnKxQMeTnO8agfHwW5Nv8LLwFvvSM="
        );
    }

    #[test]
    fn secret_hash_empty_username_matches_known_vector() {
        // The refresh-flow convention: username is the empty string.
        let authenticator = RequestAuthenticator::from_config(&secret_config()).unwrap();
        assert_eq!(
            authenticator.compute(""),
            "y4nJK7G2k/TgFSEaVn1if4MLKxtOZYxLH120oVeBowU="
        );
    }

    #[test]
    fn secret_hash_is_deterministic() {
        let authenticator = RequestAuthenticator::from_config(&secret_config()).unwrap();
        assert_eq!(authenticator.compute("alice"), authenticator.compute("alice"));
    }

    #[test]
    fn authenticator_absent_without_secret() {
        assert!(RequestAuthenticator::from_config(&testing::config()).is_none());
    }

    #[test]
    fn password_parameters_include_secret_hash_when_configured() {
        let client = ProviderClient::new(&secret_config());
        let params = client.password_parameters("alice", "hunter2");
        assert_eq!(params["USERNAME"], "alice");
        assert_eq!(params["PASSWORD"], "hunter2");
        assert_eq!(params["SECRET_HASH"], "Opn7TaCzlMmod4CnKxQMeTnO8agfHwW5Nv8LLwFvvSM=");
    }

    #[test]
    fn password_parameters_omit_secret_hash_without_secret() {
        let client = ProviderClient::new(&testing::config());
        let params = client.password_parameters("alice", "hunter2");
        assert!(!params.contains_key("SECRET_HASH"));
    }

    #[test]
    fn refresh_parameters_use_empty_username_hash() {
        let client = ProviderClient::new(&secret_config());
        let params = client.refresh_parameters("refresh-token-value");
        assert_eq!(params["REFRESH_TOKEN"], "refresh-token-value");
        assert_eq!(params["SECRET_HASH"], "y4nJK7G2k/TgFSEaVn1if4MLKxtOZYxLH120oVeBowU=");
    }

    #[tokio::test]
    async fn unreachable_provider_is_transport_error() {
        let client =
            ProviderClient::new(&secret_config()).with_endpoint("http://127.0.0.1:9/");
        let result = client.password_auth("alice", "hunter2").await;
        assert!(matches!(result, Err(FlowError::Transport(_))));
    }
}
