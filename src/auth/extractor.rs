// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated requests.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is SubjectIdentity
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, SubjectIdentity};
use crate::state::AppState;

/// Extractor for the authenticated subject.
///
/// If the `require_auth` middleware already ran for this request, the
/// identity is taken from the request extensions; otherwise the gate is
/// invoked directly on the request headers.
pub struct Auth(pub SubjectIdentity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<SubjectIdentity>().cloned() {
            return Ok(Auth(identity));
        }

        let identity = state.gate.authenticate(&parts.headers).await?;
        Ok(Auth(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing;
    use crate::state::AppState;
    use axum::http::Request;

    async fn test_state() -> AppState {
        AppState::for_tests(testing::config(), testing::jwks())
    }

    fn parts_with_header(value: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = value {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn extractor_requires_auth_header() {
        let state = test_state().await;
        let mut parts = parts_with_header(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn extractor_accepts_valid_token() {
        let state = test_state().await;
        let token = testing::sign(&testing::valid_claims("user-123"), testing::KEY_ID);
        let mut parts = parts_with_header(Some(format!("Bearer {token}")));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.subject, "user-123");
    }

    #[tokio::test]
    async fn extractor_prefers_extensions() {
        let state = test_state().await;
        let mut parts = parts_with_header(None);

        let identity = SubjectIdentity {
            subject: "user-from-middleware".to_string(),
            claims: Default::default(),
        };
        parts.extensions.insert(identity);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.subject, "user-from-middleware");
    }
}
