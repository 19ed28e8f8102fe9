// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;
use serde::Serialize;

use crate::auth::{Auth, ClaimSet};

/// The authenticated caller's identity as seen by the service.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// Canonical user identifier (token `sub` claim).
    pub subject: String,
    /// Full verified claim set, unaltered.
    pub claims: ClaimSet,
}

/// Return the identity the request authenticated as.
pub async fn me(Auth(identity): Auth) -> Json<MeResponse> {
    Json(MeResponse {
        subject: identity.subject,
        claims: identity.claims,
    })
}
