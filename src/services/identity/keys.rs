//! Identity provider public signing keys (JWKS).
//!
//! The key set is kept until the `max-age` the provider advertises, then refetched
//! on the next lookup. Only keys are retained; every token is still verified.
//! Concurrent lookups on an empty or stale set share a single fetch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::http::header::CACHE_CONTROL;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use thiserror::Error;
use tokio::sync::RwLock;

use super::VerifyError;

const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3_600);

#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error("public key request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("public key endpoint {url} returned {status}")]
    Status { url: String, status: u16 },

    #[error("public key endpoint {url} returned an invalid key set: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

struct KeySet {
    keys: HashMap<String, DecodingKey>,
    expires_at: Instant,
}

impl KeySet {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }

    fn key(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        self.keys
            .get(kid)
            .cloned()
            .ok_or_else(|| VerifyError::UnknownKeyId(kid.to_string()))
    }
}

pub struct GooglePublicKeys {
    http: reqwest::Client,
    jwks_url: String,
    current: RwLock<Option<KeySet>>,
}

impl std::fmt::Debug for GooglePublicKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GooglePublicKeys")
            .field("jwks_url", &self.jwks_url)
            .finish()
    }
}

impl GooglePublicKeys {
    pub fn new(http: reqwest::Client, jwks_url: impl Into<String>) -> Self {
        Self {
            http,
            jwks_url: jwks_url.into(),
            current: RwLock::new(None),
        }
    }

    /// Look up the decoding key for `kid`, fetching the key set when needed.
    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        {
            let current = self.current.read().await;
            if let Some(set) = current.as_ref()
                && set.is_fresh()
            {
                return set.key(kid);
            }
        }

        // 1 回だけ取りに行く: write lock を持ったまま再確認 → fetch
        // (待っていた側は、先に取った key set をそのまま使う)
        let mut current = self.current.write().await;
        if let Some(set) = current.as_ref()
            && set.is_fresh()
        {
            return set.key(kid);
        }

        let fresh = self.fetch().await?;
        let key = fresh.key(kid);
        *current = Some(fresh);

        key
    }

    async fn fetch(&self) -> Result<KeySet, KeyFetchError> {
        let url = self.jwks_url.as_str();

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| KeyFetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(KeyFetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let max_age = resp
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_MAX_AGE);

        let set: JwkSet = resp.json().await.map_err(|source| KeyFetchError::Decode {
            url: url.to_string(),
            source,
        })?;

        let mut keys = HashMap::with_capacity(set.keys.len());
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                tracing::warn!(url, "skipping public key without kid");
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(err) => {
                    tracing::warn!(url, kid = %kid, error = %err, "skipping unusable public key")
                }
            }
        }

        tracing::debug!(
            url,
            count = keys.len(),
            max_age_secs = max_age.as_secs(),
            "fetched public keys"
        );

        Ok(KeySet {
            keys,
            expires_at: Instant::now() + max_age,
        })
    }
}

fn parse_max_age(cache_control: &str) -> Option<Duration> {
    cache_control
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
