// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Cognito JWT authentication for the user service API.
//!
//! ## Auth Flow
//!
//! 1. The client obtains tokens from the Cognito user pool (password or
//!    refresh flow, optionally proxied through this service)
//! 2. The client sends `Authorization: Bearer <JWT>`
//! 3. This service:
//!    - Fetches the pool's JWKS via HTTPS and caches it by key id
//!    - Verifies the JWT signature, expiry, issuer, and audience
//!    - Exposes `sub` and the full claim set as the request's identity
//!
//! ## Security
//!
//! - All non-health endpoints require authentication
//! - The key set is replaced atomically on refresh; readers never see a
//!   partial set
//! - Tokens must use the algorithm their signing key was published with
//! - Clock skew leeway on expiry is zero
//! - Verification failures surface as one opaque 401

pub mod claims;
pub mod error;
pub mod extractor;
pub mod flow;
pub mod gate;
pub mod keys;
pub mod middleware;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use claims::{ClaimSet, SubjectIdentity};
pub use error::{AuthError, KeyFetchError, VerificationError};
pub use extractor::Auth;
pub use flow::{ProviderClient, RequestAuthenticator};
pub use gate::AuthGate;
pub use keys::KeySetCache;
pub use verifier::TokenVerifier;
