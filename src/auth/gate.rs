// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The request-boundary authentication contract.
//!
//! [`AuthGate::authenticate`] is the single entry point the HTTP layer
//! uses: extract the bearer token, verify it, hand back the subject. The
//! distinct verification-failure kinds are logged here and collapsed into
//! one opaque rejection so responses reveal nothing about which check a
//! probing token failed.

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use tracing::{debug, warn};

use super::claims::SubjectIdentity;
use super::error::AuthError;
use super::verifier::TokenVerifier;

/// Authenticates inbound requests from their headers.
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<TokenVerifier>,
}

impl AuthGate {
    /// Create a gate delegating to the given verifier.
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Authenticate a request from its headers.
    ///
    /// Requires `Authorization: Bearer <token>`. Every failure maps to a
    /// 401; the identity returned on success is request-scoped.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<SubjectIdentity, AuthError> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?;
        let header = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let claims = self.verifier.verify(token).await.map_err(|kind| {
            warn!(error = %kind, "token verification failed");
            AuthError::InvalidToken
        })?;

        let identity = SubjectIdentity::from_claims(claims).ok_or_else(|| {
            warn!("verified token carries no usable 'sub' claim");
            AuthError::InvalidToken
        })?;

        debug!(subject = %identity.subject, "request authenticated");
        Ok(identity)
    }
}
