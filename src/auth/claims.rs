// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claim set and authenticated subject representation.

use serde::Serialize;

/// The decoded payload of a verified token, unaltered.
///
/// Cognito tokens carry the standard OIDC claims (`sub`, `aud`, `iss`,
/// `exp`, `iat`) plus pool-specific ones (`token_use`, `cognito:username`,
/// custom attributes). Nothing is stripped or renamed, so downstream logic
/// can read whatever it needs.
pub type ClaimSet = serde_json::Map<String, serde_json::Value>;

/// The identity a request authenticates as.
///
/// Produced by the gate for each successfully verified request and carried
/// in the request's extensions for the remainder of its processing; it has
/// no lifecycle beyond the request.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectIdentity {
    /// Canonical user identifier (the token's `sub` claim).
    pub subject: String,
    /// Full verified claim set.
    pub claims: ClaimSet,
}

impl SubjectIdentity {
    /// Build an identity from a verified claim set.
    ///
    /// Returns `None` when the claim set has no string `sub` claim; such a
    /// token cannot name a subject and is rejected by the gate.
    pub fn from_claims(claims: ClaimSet) -> Option<Self> {
        let subject = claims.get("sub")?.as_str()?.to_string();
        Some(Self { subject, claims })
    }
}
