// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification against the cached key set.
//!
//! The verifier checks, in order: token structure, key id presence in the
//! key set (refreshing at most once on a miss, so a rotated pool key is
//! picked up without an unbounded refresh loop), signature under the key's
//! own algorithm, audience, issuer, and validity window. Clock skew leeway
//! is pinned to zero; the verification library's 60-second default is not
//! used.
//!
//! Every failure is a typed [`VerificationError`]; nothing escapes this
//! module as a panic or an unmapped library error.

use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, Validation};
use tracing::{debug, warn};

use super::claims::ClaimSet;
use super::error::{KeyFetchError, VerificationError};
use super::keys::KeySetCache;
use crate::config::AuthConfig;

/// Validates bearer tokens issued by the configured user pool.
pub struct TokenVerifier {
    keys: Arc<KeySetCache>,
    /// Expected `aud` claim.
    client_id: String,
    /// Expected `iss` claim. Empty when the pool is unconfigured, in which
    /// case no real token can match it.
    issuer: String,
}

impl TokenVerifier {
    /// Create a verifier for the given pool config and key cache.
    pub fn new(config: &AuthConfig, keys: Arc<KeySetCache>) -> Self {
        Self {
            keys,
            client_id: config.client_id.clone(),
            issuer: config.issuer().unwrap_or_default(),
        }
    }

    /// Verify a bearer token and return its claim set unaltered.
    pub async fn verify(&self, token: &str) -> Result<ClaimSet, VerificationError> {
        let header = decode_header(token).map_err(|_| VerificationError::Malformed)?;
        let kid = header.kid.as_deref().ok_or(VerificationError::Malformed)?;

        let key = match self.keys.get(kid).await {
            Some(key) => key,
            None => {
                // Unknown kid may mean the pool rotated its keys. Refresh
                // once, then give up; a fetch failure degrades to the miss.
                match self.keys.refresh().await {
                    Ok(()) => {}
                    Err(KeyFetchError::NotConfigured) => {
                        debug!("key set refresh skipped, pool not configured")
                    }
                    Err(err) => {
                        warn!(error = %err, "key set refresh failed during verification")
                    }
                }
                self.keys
                    .get(kid)
                    .await
                    .ok_or(VerificationError::UnknownKey)?
            }
        };

        // The token must use the algorithm the key was published with;
        // accepting the header's word for it would allow downgrade games.
        if header.alg != key.algorithm {
            return Err(VerificationError::InvalidSignature);
        }

        let mut validation = Validation::new(key.algorithm);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_audience(&[&self.client_id]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        let data =
            decode::<ClaimSet>(token, &key.decoding, &validation).map_err(map_decode_error)?;

        Ok(data.claims)
    }
}

/// Map the verification library's error kinds onto the typed taxonomy.
fn map_decode_error(err: jsonwebtoken::errors::Error) -> VerificationError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => VerificationError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            VerificationError::InvalidSignature
        }
        ErrorKind::InvalidAudience => VerificationError::InvalidAudience,
        ErrorKind::InvalidIssuer => VerificationError::InvalidIssuer,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "aud" => VerificationError::InvalidAudience,
            "iss" => VerificationError::InvalidIssuer,
            _ => VerificationError::Malformed,
        },
        _ => VerificationError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing;

    #[tokio::test]
    async fn valid_token_returns_claims_unaltered() {
        let verifier = testing::verifier();
        let claims = testing::valid_claims("user-123");
        let token = testing::sign(&claims, testing::KEY_ID);

        let verified = verifier.verify(&token).await.expect("token verifies");
        assert_eq!(verified, claims);
        assert_eq!(verified["sub"], "user-123");
        assert_eq!(verified["token_use"], "id");
    }

    #[tokio::test]
    async fn verify_is_idempotent() {
        let verifier = testing::verifier();
        let token = testing::sign(&testing::valid_claims("user-123"), testing::KEY_ID);

        let first = verifier.verify(&token).await.unwrap();
        let second = verifier.verify(&token).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() {
        let verifier = testing::verifier();
        assert_eq!(
            verifier.verify("not-a-jwt").await,
            Err(VerificationError::Malformed)
        );
    }

    #[tokio::test]
    async fn token_without_kid_is_malformed() {
        let verifier = testing::verifier();
        // Signed correctly, but the header names no key.
        let key =
            jsonwebtoken::EncodingKey::from_rsa_pem(testing::RSA_PEM.as_bytes()).unwrap();
        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
        let token =
            jsonwebtoken::encode(&header, &testing::valid_claims("user-123"), &key).unwrap();

        assert_eq!(
            verifier.verify(&token).await,
            Err(VerificationError::Malformed)
        );
    }

    #[tokio::test]
    async fn unknown_kid_reports_unknown_key() {
        let verifier = testing::verifier();
        let token = testing::sign(&testing::valid_claims("user-123"), "rotated-away");

        assert_eq!(
            verifier.verify(&token).await,
            Err(VerificationError::UnknownKey)
        );
    }

    #[tokio::test]
    async fn wrong_signing_key_is_invalid_signature() {
        let verifier = testing::verifier();
        // Correct kid, but signed by a key the pool never published.
        let token = testing::sign_with(
            &testing::valid_claims("user-123"),
            testing::KEY_ID,
            testing::OTHER_RSA_PEM,
        );

        assert_eq!(
            verifier.verify(&token).await,
            Err(VerificationError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn symmetric_token_is_rejected() {
        let verifier = testing::verifier();
        // HS256 token claiming the published kid: the classic
        // algorithm-confusion attempt.
        let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256);
        header.kid = Some(testing::KEY_ID.to_string());
        let key = jsonwebtoken::EncodingKey::from_secret(testing::KEY_N.as_bytes());
        let token =
            jsonwebtoken::encode(&header, &testing::valid_claims("user-123"), &key).unwrap();

        assert_eq!(
            verifier.verify(&token).await,
            Err(VerificationError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn wrong_audience_is_invalid_audience() {
        let verifier = testing::verifier();
        let claims = testing::claims_with(
            "user-123",
            "some-other-client",
            &testing::issuer(),
            testing::now() + 3600,
        );
        let token = testing::sign(&claims, testing::KEY_ID);

        assert_eq!(
            verifier.verify(&token).await,
            Err(VerificationError::InvalidAudience)
        );
    }

    #[tokio::test]
    async fn wrong_issuer_is_invalid_issuer() {
        let verifier = testing::verifier();
        // Same host, different pool: must fail exact comparison.
        let claims = testing::claims_with(
            "user-123",
            testing::CLIENT_ID,
            "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_OtherPool",
            testing::now() + 3600,
        );
        let token = testing::sign(&claims, testing::KEY_ID);

        assert_eq!(
            verifier.verify(&token).await,
            Err(VerificationError::InvalidIssuer)
        );
    }

    #[tokio::test]
    async fn expired_token_is_expired() {
        let verifier = testing::verifier();
        let claims = testing::claims_with(
            "user-123",
            testing::CLIENT_ID,
            &testing::issuer(),
            testing::now() - 30,
        );
        let token = testing::sign(&claims, testing::KEY_ID);

        assert_eq!(
            verifier.verify(&token).await,
            Err(VerificationError::Expired)
        );
    }

    #[tokio::test]
    async fn not_yet_valid_token_is_expired_kind() {
        let verifier = testing::verifier();
        let mut claims = testing::valid_claims("user-123");
        claims.insert("nbf".to_string(), serde_json::json!(testing::now() + 600));
        let token = testing::sign(&claims, testing::KEY_ID);

        assert_eq!(
            verifier.verify(&token).await,
            Err(VerificationError::Expired)
        );
    }

    #[tokio::test]
    async fn expired_beats_valid_signature_and_issuer() {
        // Expiry is enforced even when everything else about the token is
        // genuine.
        let verifier = testing::verifier();
        let claims = testing::claims_with(
            "user-123",
            testing::CLIENT_ID,
            &testing::issuer(),
            testing::now() - 86_400,
        );
        let token = testing::sign(&claims, testing::KEY_ID);

        assert_eq!(
            verifier.verify(&token).await,
            Err(VerificationError::Expired)
        );
    }
}
