//! Access-token verification against the identity provider's published key set.

use crate::settings::AuthSettings;
use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Minimum gap between key set downloads triggered by unknown `kid`s.
pub const JWKS_REFETCH_COOLDOWN: Duration = Duration::from_secs(6);

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("authorization header is required")]
    MissingHeader,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("no signing key matches kid {0:?}")]
    UnknownKey(Option<String>),
    #[error("token rejected: {0}")]
    Invalid(String),
    #[error("claim '{0}' does not match")]
    ClaimMismatch(&'static str),
    #[error("key set unavailable: {0}")]
    KeySet(String),
}

/// Identity derived from a verified token, attached to the request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: String,
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    cid: Option<String>,
}

#[derive(Default)]
struct KeyCache {
    set: Option<JwkSet>,
    /// Last download attempt, successful or not.
    fetched_at: Option<Instant>,
}

/// Verifies signed access tokens with keys from the issuer's JWKS endpoint.
/// Keys are cached; an unknown `kid` triggers a refetch to pick up rotated keys,
/// at most once per [`JWKS_REFETCH_COOLDOWN`].
pub struct JwksVerifier {
    client: reqwest::Client,
    settings: AuthSettings,
    keys: RwLock<KeyCache>,
}

impl JwksVerifier {
    pub fn new(settings: AuthSettings) -> Self {
        JwksVerifier {
            client: reqwest::Client::new(),
            settings,
            keys: RwLock::new(KeyCache::default()),
        }
    }

    /// Start with a known key set instead of fetching on first use.
    pub fn with_keys(settings: AuthSettings, keys: JwkSet) -> Self {
        JwksVerifier {
            keys: RwLock::new(KeyCache {
                set: Some(keys),
                fetched_at: None,
            }),
            ..Self::new(settings)
        }
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!(uri = %self.settings.jwks_uri, "fetching signing keys");
        let resp = self
            .client
            .get(&self.settings.jwks_uri)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::KeySet(e.to_string()))?;
        resp.json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeySet(e.to_string()))
    }

    async fn key_for(&self, kid: Option<&str>) -> Result<Jwk, AuthError> {
        if let Some(jwk) = find_key(self.keys.read().await.set.as_ref(), kid) {
            return Ok(jwk);
        }
        let unknown = || AuthError::UnknownKey(kid.map(str::to_string));

        // Held across the download so concurrent misses share one fetch.
        let mut cache = self.keys.write().await;
        if let Some(jwk) = find_key(cache.set.as_ref(), kid) {
            return Ok(jwk);
        }
        if cache.fetched_at.is_some_and(|t| t.elapsed() < JWKS_REFETCH_COOLDOWN) {
            tracing::debug!(kid = ?kid, "unknown kid inside refetch cooldown");
            return Err(unknown());
        }
        cache.fetched_at = Some(Instant::now());
        let fresh = self.fetch_keys().await?;
        let found = find_key(Some(&fresh), kid);
        cache.set = Some(fresh);
        found.ok_or_else(unknown)
    }
}

/// Signature algorithm declared by the key, if it names one usable for JWS.
fn pinned_algorithm(jwk: &Jwk) -> Option<Algorithm> {
    Some(match jwk.common.key_algorithm.as_ref()? {
        KeyAlgorithm::HS256 => Algorithm::HS256,
        KeyAlgorithm::HS384 => Algorithm::HS384,
        KeyAlgorithm::HS512 => Algorithm::HS512,
        KeyAlgorithm::ES256 => Algorithm::ES256,
        KeyAlgorithm::ES384 => Algorithm::ES384,
        KeyAlgorithm::RS256 => Algorithm::RS256,
        KeyAlgorithm::RS384 => Algorithm::RS384,
        KeyAlgorithm::RS512 => Algorithm::RS512,
        KeyAlgorithm::PS256 => Algorithm::PS256,
        KeyAlgorithm::PS384 => Algorithm::PS384,
        KeyAlgorithm::PS512 => Algorithm::PS512,
        KeyAlgorithm::EdDSA => Algorithm::EdDSA,
        _ => return None,
    })
}

fn find_key(set: Option<&JwkSet>, kid: Option<&str>) -> Option<Jwk> {
    let set = set?;
    match kid {
        Some(kid) => set.find(kid).cloned(),
        None if set.keys.len() == 1 => set.keys.first().cloned(),
        None => None,
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;
        let jwk = self.key_for(header.kid.as_deref()).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| AuthError::KeySet(e.to_string()))?;

        // The key's own `alg` wins over whatever the token header claims.
        let mut validation = Validation::new(pinned_algorithm(&jwk).unwrap_or(header.alg));
        validation.set_issuer(&[self.settings.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        match &self.settings.audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }

        let claims = decode::<AccessClaims>(token, &key, &validation)
            .map_err(|e| AuthError::Invalid(e.to_string()))?
            .claims;
        if claims.cid.as_deref() != Some(self.settings.client_id.as_str()) {
            return Err(AuthError::ClaimMismatch("cid"));
        }
        if claims.sub.is_empty() {
            return Err(AuthError::Invalid("empty subject".into()));
        }
        Ok(Identity {
            user_id: claims.uid.unwrap_or_else(|| claims.sub.clone()),
            email: claims.sub,
        })
    }
}
