// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - The key document is fetched via HTTPS only
//! - The key set is rebuilt wholesale on every refresh and published with a
//!   single atomic swap, so concurrent readers never observe a
//!   partially-populated set
//! - A failed fetch degrades to an empty (or stale) key set; it never
//!   prevents the process from starting

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::error::KeyFetchError;
use crate::config::AuthConfig;

/// HTTP timeout for key document fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A single public signing key from the pool's JWKS, immutable once built.
pub struct SigningKey {
    /// Key identifier (`kid`), matched against token headers.
    pub key_id: String,
    /// The asymmetric algorithm this key signs with.
    pub algorithm: Algorithm,
    /// Key material in the form the verifier consumes.
    pub decoding: DecodingKey,
}

/// Mapping from key id to signing key. Owned exclusively by [`KeySetCache`].
pub type KeySet = HashMap<String, Arc<SigningKey>>;

/// Cache of the user pool's public signing keys.
///
/// The current [`KeySet`] is held behind an `Arc` that is replaced whole on
/// refresh; `get` only ever reads the current pointer. Refreshes may race
/// with each other and the last writer wins, which is acceptable because
/// each fetched document is a complete snapshot of the pool's rotation.
pub struct KeySetCache {
    /// JWKS endpoint, `None` when the pool is not configured.
    jwks_url: Option<String>,
    /// HTTP client
    http: reqwest::Client,
    /// Current key set
    keys: RwLock<Arc<KeySet>>,
}

impl KeySetCache {
    /// Create a cache for the configured pool and attempt one initial fetch.
    ///
    /// On any failure (pool unconfigured, endpoint unreachable, malformed
    /// document) the cache starts empty and a warning is logged; readiness
    /// endpoints must come up even when the identity provider is down.
    pub async fn new(config: &AuthConfig) -> Self {
        let cache = Self {
            jwks_url: config.jwks_url(),
            http: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            keys: RwLock::new(Arc::new(KeySet::new())),
        };

        if let Err(err) = cache.refresh().await {
            warn!(error = %err, "initial key set fetch failed; starting with an empty key set");
        }

        cache
    }

    /// Build a cache directly from a key document, without a fetch URL.
    ///
    /// Used to inject fake key sets in tests; `refresh` on such a cache
    /// reports [`KeyFetchError::NotConfigured`].
    pub fn from_jwks(jwks: &JwkSet) -> Self {
        Self {
            jwks_url: None,
            http: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            keys: RwLock::new(Arc::new(build_key_set(jwks))),
        }
    }

    /// Whether a JWKS endpoint is configured.
    pub fn configured(&self) -> bool {
        self.jwks_url.is_some()
    }

    /// Look up a signing key by key id in the current key set.
    pub async fn get(&self, kid: &str) -> Option<Arc<SigningKey>> {
        self.keys.read().await.get(kid).cloned()
    }

    /// Number of keys currently cached.
    pub async fn key_count(&self) -> usize {
        self.keys.read().await.len()
    }

    /// Fetch the key document and replace the key set atomically.
    ///
    /// The new set is built completely off to the side before the swap, so
    /// in-flight `get` calls keep reading the previous set until the single
    /// pointer replacement. No retry on failure; callers decide policy.
    pub async fn refresh(&self) -> Result<(), KeyFetchError> {
        let url = self.jwks_url.as_ref().ok_or(KeyFetchError::NotConfigured)?;

        debug!(url = %url, "fetching key document");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| KeyFetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeyFetchError::Status(response.status().as_u16()));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| KeyFetchError::Parse(e.to_string()))?;

        let next = build_key_set(&jwks);
        let key_count = next.len();

        *self.keys.write().await = Arc::new(next);

        info!(key_count, "key set refreshed");
        Ok(())
    }
}

/// Build a key set from a fetched document.
///
/// Keys that cannot be converted (unsupported type, missing fields, no
/// `kid`) are skipped with a warning rather than failing the whole refresh.
fn build_key_set(jwks: &JwkSet) -> KeySet {
    let mut keys = KeySet::new();

    for jwk in &jwks.keys {
        let Some(kid) = jwk.common.key_id.clone() else {
            warn!("skipping JWK without a key id");
            continue;
        };

        match decoding_key_from_jwk(jwk) {
            Ok((decoding, algorithm)) => {
                debug!(kid = %kid, ?algorithm, "loaded signing key");
                keys.insert(
                    kid.clone(),
                    Arc::new(SigningKey {
                        key_id: kid,
                        algorithm,
                        decoding,
                    }),
                );
            }
            Err(err) => {
                warn!(kid = %kid, error = %err, "skipping unusable JWK");
            }
        }
    }

    keys
}

/// Convert a JWK into a decoding key plus the algorithm it signs with.
fn decoding_key_from_jwk(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), KeyFetchError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| KeyFetchError::Parse(format!("bad RSA components: {e}")))?;

            let alg = jwk
                .common
                .key_algorithm
                .map(|a| match a {
                    KeyAlgorithm::RS256 => Algorithm::RS256,
                    KeyAlgorithm::RS384 => Algorithm::RS384,
                    KeyAlgorithm::RS512 => Algorithm::RS512,
                    _ => Algorithm::RS256, // Default for RSA
                })
                .unwrap_or(Algorithm::RS256);

            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| KeyFetchError::Parse(format!("bad EC components: {e}")))?;

            let alg = jwk
                .common
                .key_algorithm
                .map(|a| match a {
                    KeyAlgorithm::ES256 => Algorithm::ES256,
                    KeyAlgorithm::ES384 => Algorithm::ES384,
                    _ => Algorithm::ES256, // Default for EC
                })
                .unwrap_or(Algorithm::ES256);

            Ok((key, alg))
        }
        _ => Err(KeyFetchError::Parse(
            "unsupported key type in JWKS".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing;

    #[tokio::test]
    async fn from_jwks_serves_known_key() {
        let cache = KeySetCache::from_jwks(&testing::jwks());
        let key = cache.get(testing::KEY_ID).await.expect("key present");
        assert_eq!(key.key_id, testing::KEY_ID);
        assert_eq!(key.algorithm, Algorithm::RS256);
    }

    #[tokio::test]
    async fn unknown_kid_returns_none() {
        let cache = KeySetCache::from_jwks(&testing::jwks());
        assert!(cache.get("no-such-key").await.is_none());
    }

    #[tokio::test]
    async fn refresh_without_url_reports_not_configured() {
        let cache = KeySetCache::from_jwks(&testing::jwks());
        assert!(matches!(
            cache.refresh().await,
            Err(KeyFetchError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_leaves_cache_empty() {
        // A closed local port stands in for an unreachable provider.
        let cache = KeySetCache {
            jwks_url: Some("http://127.0.0.1:9/jwks.json".to_string()),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(1))
                .build()
                .unwrap(),
            keys: RwLock::new(Arc::new(KeySet::new())),
        };
        assert!(matches!(
            cache.refresh().await,
            Err(KeyFetchError::Request(_))
        ));
        assert!(cache.get("any").await.is_none());
        assert_eq!(cache.key_count().await, 0);
    }

    #[tokio::test]
    async fn unparseable_jwk_is_skipped() {
        // Second entry has an unsupported key type and must not poison the set.
        let jwks: JwkSet = serde_json::from_value(serde_json::json!({
            "keys": [
                {
                    "kty": "RSA",
                    "kid": "good",
                    "alg": "RS256",
                    "use": "sig",
                    "n": testing::KEY_N,
                    "e": testing::KEY_E,
                },
                {
                    "kty": "oct",
                    "kid": "bad",
                    "k": "c2VjcmV0",
                },
            ]
        }))
        .unwrap();

        let cache = KeySetCache::from_jwks(&jwks);
        assert!(cache.get("good").await.is_some());
        assert!(cache.get("bad").await.is_none());
        assert_eq!(cache.key_count().await, 1);
    }
}
