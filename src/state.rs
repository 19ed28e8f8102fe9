// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state.
//!
//! All auth components are constructed once here from an [`AuthConfig`]
//! and injected into the router; nothing reads configuration or holds
//! singletons behind the handlers' backs.

use std::sync::Arc;

use crate::auth::{AuthGate, KeySetCache, ProviderClient, TokenVerifier};
use crate::config::AuthConfig;

#[derive(Clone)]
pub struct AppState {
    /// Request-boundary authenticator.
    pub gate: AuthGate,
    /// Key cache, exposed for health reporting.
    pub keys: Arc<KeySetCache>,
    /// Client for provider auth flows (login/refresh).
    pub flow: Arc<ProviderClient>,
}

impl AppState {
    /// Build the full component graph, fetching the initial key set.
    ///
    /// Never fails: an unreachable or unconfigured identity provider
    /// degrades to an empty key cache.
    pub async fn from_config(config: &AuthConfig) -> Self {
        let keys = Arc::new(KeySetCache::new(config).await);
        let verifier = Arc::new(TokenVerifier::new(config, Arc::clone(&keys)));
        Self {
            gate: AuthGate::new(verifier),
            keys,
            flow: Arc::new(ProviderClient::new(config)),
        }
    }

    /// State wired to an injected key set instead of the network.
    #[cfg(test)]
    pub(crate) fn for_tests(config: AuthConfig, jwks: jsonwebtoken::jwk::JwkSet) -> Self {
        let keys = Arc::new(KeySetCache::from_jwks(&jwks));
        let verifier = Arc::new(TokenVerifier::new(&config, Arc::clone(&keys)));
        Self {
            gate: AuthGate::new(verifier),
            keys,
            flow: Arc::new(ProviderClient::new(&config)),
        }
    }
}
