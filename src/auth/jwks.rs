// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Behavior
//!
//! - The key set is fetched lazily on first lookup and cached for a fixed TTL
//!   (one hour by default), then replaced wholesale.
//! - Concurrent lookups that find the cache expired are coalesced: one caller
//!   fetches, the rest wait on the refresh lock and reuse its outcome, failure
//!   included, so an outage costs one timeout per expiry rather than one per
//!   waiting caller.
//! - Entries the JWK model cannot represent are skipped; only a document
//!   without a `keys` array is a malformed key set.
//! - A lookup for an unknown `kid` does not force a refetch; a rotated key is
//!   picked up when the cached set expires.
//! - Fetch failures are not retried and do not fall back to a stale set.
//!
//! The cache, the clock and the network source are all injected, so tests can
//! drive expiry deterministically without a real endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use super::clock::Clock;
use super::error::AuthError;

/// Google's published key set for Firebase ID tokens.
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Default JWKS cache TTL (1 hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default timeout for a single JWKS fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// An RSA public key from the key set.
#[derive(Debug, Clone)]
pub struct PublicKeyDescriptor {
    /// Key ID
    pub kid: String,
    /// Algorithm hint from the JWK, if published
    pub alg: Option<KeyAlgorithm>,
    /// Modulus, base64url big-endian
    pub n: String,
    /// Public exponent, base64url big-endian
    pub e: String,
}

impl PublicKeyDescriptor {
    /// Build from a JWK. Returns `None` for non-RSA keys and keys without a `kid`.
    fn from_jwk(jwk: &Jwk) -> Option<Self> {
        let AlgorithmParameters::RSA(rsa) = &jwk.algorithm else {
            return None;
        };
        Some(Self {
            kid: jwk.common.key_id.clone()?,
            alg: jwk.common.key_algorithm,
            n: rsa.n.clone(),
            e: rsa.e.clone(),
        })
    }
}

/// A fetched key set with its validity window (Unix seconds).
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: Vec<PublicKeyDescriptor>,
    pub fetched_at: i64,
    pub expires_at: i64,
}

impl KeySet {
    /// Build a key set fetched at `fetched_at`, valid for `ttl_secs`.
    pub fn from_jwks(jwks: &JwkSet, fetched_at: i64, ttl_secs: i64) -> Self {
        let keys: Vec<_> = jwks
            .keys
            .iter()
            .filter_map(PublicKeyDescriptor::from_jwk)
            .collect();
        if keys.len() < jwks.keys.len() {
            tracing::debug!(
                skipped = jwks.keys.len() - keys.len(),
                "Ignoring JWKS entries that are not RSA keys with a kid"
            );
        }
        Self {
            keys,
            fetched_at,
            expires_at: fetched_at.saturating_add(ttl_secs),
        }
    }

    pub fn keys(&self) -> &[PublicKeyDescriptor] {
        &self.keys
    }

    /// Find the key with the given ID.
    pub fn find(&self, kid: &str) -> Option<&PublicKeyDescriptor> {
        self.keys.iter().find(|key| key.kid == kid)
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

#[derive(Deserialize)]
struct RawKeySet {
    keys: Vec<serde_json::Value>,
}

/// Parse a JWKS document.
///
/// Entries that do not deserialize as a JWK (unsupported key types or curves,
/// missing parameters) are dropped. Fails only if the document is not an
/// object with a `keys` array.
pub fn parse_key_set(body: &[u8]) -> Result<JwkSet, AuthError> {
    let raw: RawKeySet =
        serde_json::from_slice(body).map_err(|e| AuthError::MalformedKeySet(e.to_string()))?;

    let keys = raw
        .keys
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Jwk>(entry) {
            Ok(jwk) => Some(jwk),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unparseable JWKS entry");
                None
            }
        })
        .collect();
    Ok(JwkSet { keys })
}

/// Where key sets come from.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, AuthError>;
}

/// Fetches the key set over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    url: String,
    client: reqwest::Client,
}

impl HttpKeySource {
    /// Create a source for `url` whose requests time out after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::KeyFetchFailed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyFetchFailed(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::KeyFetchFailed(e.to_string()))?;

        parse_key_set(&body)
    }
}

/// Process-wide key set cache.
///
/// Holds at most one key set. An empty cache counts as expired.
#[derive(Debug, Default)]
pub struct KeyCache {
    entry: RwLock<Option<Arc<KeySet>>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached key set, expired or not.
    pub async fn get(&self) -> Option<Arc<KeySet>> {
        self.entry.read().await.clone()
    }

    pub async fn set(&self, key_set: Arc<KeySet>) {
        *self.entry.write().await = Some(key_set);
    }

    pub async fn is_expired(&self, now: i64) -> bool {
        match &*self.entry.read().await {
            Some(key_set) => key_set.is_expired(now),
            None => true,
        }
    }
}

/// Resolves signing keys, fetching and caching the key set as needed.
pub struct KeySetProvider {
    source: Arc<dyn KeySource>,
    clock: Arc<dyn Clock>,
    cache: Arc<KeyCache>,
    ttl_secs: i64,
    /// Outcome of the most recent fetch, guarded by the refresh lock.
    refresh_lock: Mutex<Option<Result<Arc<KeySet>, AuthError>>>,
    /// Number of completed fetches.
    refreshes: AtomicU64,
}

impl KeySetProvider {
    /// Create a provider with an empty cache and the default TTL.
    pub fn new(source: Arc<dyn KeySource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            cache: Arc::new(KeyCache::new()),
            ttl_secs: DEFAULT_CACHE_TTL.as_secs() as i64,
            refresh_lock: Mutex::new(None),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Use a shared cache instead of a private one.
    pub fn with_cache(mut self, cache: Arc<KeyCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self
    }

    pub fn cache(&self) -> &Arc<KeyCache> {
        &self.cache
    }

    /// Get the current key set, fetching it if the cache is empty or expired.
    pub async fn get_key_set(&self) -> Result<Arc<KeySet>, AuthError> {
        let seen = self.refreshes.load(Ordering::Acquire);
        if let Some(key_set) = self.cached().await {
            return Ok(key_set);
        }

        let mut last = self.refresh_lock.lock().await;
        // A fetch that completed while we waited answers for us, even a failed one.
        if self.refreshes.load(Ordering::Acquire) != seen {
            if let Some(outcome) = &*last {
                return outcome.clone();
            }
        }
        if let Some(key_set) = self.cached().await {
            return Ok(key_set);
        }
        self.fetch_and_store(&mut last).await
    }

    /// Get the key with the given ID from the current key set.
    pub async fn get_key(&self, kid: &str) -> Result<PublicKeyDescriptor, AuthError> {
        let key_set = self.get_key_set().await?;
        key_set
            .find(kid)
            .cloned()
            .ok_or_else(|| AuthError::KeyNotFound(kid.to_string()))
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<Arc<KeySet>, AuthError> {
        let mut last = self.refresh_lock.lock().await;
        self.fetch_and_store(&mut last).await
    }

    /// Check if a key set is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        !self.cache.is_expired(self.clock.now()).await
    }

    async fn cached(&self) -> Option<Arc<KeySet>> {
        let now = self.clock.now();
        self.cache
            .get()
            .await
            .filter(|key_set| !key_set.is_expired(now))
    }

    /// Fetch, cache on success, and record the outcome for waiting callers.
    ///
    /// Must be called with the refresh lock held; `last` is its contents.
    async fn fetch_and_store(
        &self,
        last: &mut Option<Result<Arc<KeySet>, AuthError>>,
    ) -> Result<Arc<KeySet>, AuthError> {
        let outcome = match self.source.fetch().await {
            Ok(jwks) => {
                let key_set = Arc::new(KeySet::from_jwks(&jwks, self.clock.now(), self.ttl_secs));
                tracing::info!(
                    keys = key_set.keys().len(),
                    expires_at = key_set.expires_at,
                    "Fetched signing key set"
                );
                self.cache.set(key_set.clone()).await;
                Ok(key_set)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch signing key set");
                Err(e)
            }
        };

        *last = Some(outcome.clone());
        self.refreshes.fetch_add(1, Ordering::Release);
        outcome
    }
}
