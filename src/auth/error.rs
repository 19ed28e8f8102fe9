// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Two layers:
//!
//! - [`VerificationError`] and [`KeyFetchError`] are the internal, typed
//!   failures of token verification and key fetching. They are logged with
//!   their specific kind but never cross the HTTP boundary.
//! - [`AuthError`] is the request-boundary rejection. Every variant maps to
//!   HTTP 401, and all verification failures collapse into the single
//!   `InvalidToken` variant so responses carry no oracle on which check
//!   failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Why a token failed verification.
///
/// Recovered locally inside the verifier; callers outside the auth core only
/// ever see the opaque [`AuthError::InvalidToken`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The token is structurally invalid (not three base64url segments, no
    /// `kid` in the header, undecodable payload).
    #[error("token is malformed")]
    Malformed,
    /// The header's key id is absent from the key set, even after one
    /// refresh attempt.
    #[error("signing key not found in key set")]
    UnknownKey,
    /// Signature check failed, or the token declared an algorithm other
    /// than the signing key's.
    #[error("token signature is invalid")]
    InvalidSignature,
    /// `aud` claim does not equal the configured client id.
    #[error("token audience is invalid")]
    InvalidAudience,
    /// `iss` claim does not equal the user pool issuer URL.
    #[error("token issuer is invalid")]
    InvalidIssuer,
    /// The token is outside its validity window (`exp` passed or `nbf` not
    /// yet reached).
    #[error("token has expired")]
    Expired,
}

/// Why a key set fetch failed.
///
/// Never fatal: construction and verification degrade to an empty or stale
/// key set instead of propagating these to the process boundary.
#[derive(Debug, Error)]
pub enum KeyFetchError {
    /// No user pool configured, so there is no JWKS URL to fetch.
    #[error("user pool is not configured")]
    NotConfigured,
    /// The JWKS endpoint could not be reached.
    #[error("JWKS request failed: {0}")]
    Request(String),
    /// The JWKS endpoint answered with a non-success status.
    #[error("JWKS endpoint returned HTTP {0}")]
    Status(u16),
    /// The response body was not a valid key document.
    #[error("JWKS response could not be parsed: {0}")]
    Parse(String),
}

/// Request-boundary rejection. Always surfaces as HTTP 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header on the request.
    MissingAuthHeader,
    /// The header is present but is not `Bearer <token>`.
    InvalidAuthHeader,
    /// The bearer token failed verification (any kind).
    InvalidToken,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    message: String,
}

impl AuthError {
    /// Short error name carried in the response body.
    pub fn error(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "Missing Authorization header",
            AuthError::InvalidAuthHeader => "Invalid Authorization header",
            AuthError::InvalidToken => "Invalid token",
        }
    }

    /// Human-readable message carried in the response body.
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "Authorization header is required",
            AuthError::InvalidAuthHeader => "Authorization header must start with 'Bearer '",
            AuthError::InvalidToken => "Token verification failed",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            error: self.error().to_string(),
            message: self.message().to_string(),
        });
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
