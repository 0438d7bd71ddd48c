//! JWKS discovery, caching and stale-serve
//!
//! Keys are looked up per `(issuer, kid)`. A missing or stale entry triggers a
//! pull of the issuer's OIDC discovery document and JWKS; every key of the set
//! is cached, so one refresh seeds all of the issuer's kids.
//!
//! # Failure policy
//!
//! Refresh failures never reach the caller. They are logged and whatever was
//! cached before is returned, stale or absent. An unreachable issuer therefore
//! keeps validating tokens signed with keys seen earlier.

use dashmap::DashMap;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::fetch::HttpFetcher;
use crate::cache::Cache;
use crate::error::KeyFetchError;

/// Path appended to the issuer to find its discovery document
pub const WELL_KNOWN: &str = "/.well-known/openid-configuration";

/// OpenID Connect Discovery document, reduced to the field we use
#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: String,
}

/// JWK Set with each key left raw so one odd key cannot sink the set
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<serde_json::Value>,
}

/// Public key taken from an issuer's JWKS
#[derive(Clone)]
pub struct VerificationKey {
    kid: String,
    algorithm: Option<Algorithm>,
    key_use: Option<String>,
    decoding_key: Option<DecodingKey>,
}

// DecodingKey carries key material; keep it out of logs
impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("key_use", &self.key_use)
            .field("usable", &self.decoding_key.is_some())
            .finish()
    }
}

impl VerificationKey {
    /// Build a key from one entry of a JWKS `keys` array
    ///
    /// Never fails: a key whose material cannot be used is kept but reports
    /// `is_valid() == false`.
    pub fn from_jwk_value(value: serde_json::Value) -> Self {
        let kid = value
            .get("kid")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        let algorithm = value
            .get("alg")
            .and_then(serde_json::Value::as_str)
            .and_then(|alg| Algorithm::from_str(alg).ok());
        let key_use = value
            .get("use")
            .and_then(serde_json::Value::as_str)
            .map(String::from);

        let decoding_key = match serde_json::from_value::<Jwk>(value) {
            Ok(jwk) => DecodingKey::from_jwk(&jwk)
                .inspect_err(|e| debug!(kid = %kid, error = %e, "Unusable JWK material"))
                .ok(),
            Err(e) => {
                debug!(kid = %kid, error = %e, "Unsupported JWK");
                None
            }
        };

        Self {
            kid,
            algorithm,
            key_use,
            decoding_key,
        }
    }

    /// Key id, empty when the JWK has none
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Algorithm declared by the JWK
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    /// Structural validity: usable material, not an encryption-only key
    pub fn is_valid(&self) -> bool {
        self.decoding_key.is_some() && self.key_use.as_deref() != Some("enc")
    }

    /// Verification material, when usable
    pub fn decoding_key(&self) -> Option<&DecodingKey> {
        self.decoding_key.as_ref()
    }
}

/// Resolves `(issuer, kid)` to a verification key
///
/// # Example
///
/// ```rust,no_run
/// # use authentic::jwt::{KeyManager, ReqwestFetcher};
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// # tokio_test::block_on(async {
/// let fetcher = Arc::new(ReqwestFetcher::new(Duration::from_secs(10))?);
/// let keys = KeyManager::with_fetcher(Duration::from_secs(3600), fetcher);
///
/// if let Some(key) = keys.get("https://auth.example.com/", "key-id-123").await {
///     println!("resolved {:?}", key.algorithm());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # });
/// ```
#[derive(Debug)]
pub struct KeyManager {
    cache: Cache<Arc<VerificationKey>>,
    fetcher: Arc<dyn HttpFetcher>,
    /// One lock per issuer so concurrent misses share a single refresh
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyManager {
    /// Create a key manager whose cached keys go stale after `max_age`
    pub fn with_fetcher(max_age: Duration, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            cache: Cache::new(max_age),
            fetcher,
            refresh_locks: DashMap::new(),
        }
    }

    /// Get the key for `(issuer, kid)`, refreshing first if it is missing or stale
    ///
    /// Returns the cached key even if the refresh failed, and `None` only if
    /// the key has never been fetched successfully.
    pub async fn get(&self, issuer: &str, kid: &str) -> Option<Arc<VerificationKey>> {
        let key = Cache::<Arc<VerificationKey>>::key_for(issuer, kid);

        if self.cache.is_expired(&key) {
            self.refresh_coalesced(issuer, &key).await;
        }

        self.cache.get(&key)
    }

    /// Refresh unless another task is already refreshing this issuer
    ///
    /// Latecomers wait for the in-flight refresh and then read its result.
    /// A task that wins the lock after a refresh already landed skips its own.
    async fn refresh_coalesced(&self, issuer: &str, cache_key: &str) {
        let lock = Arc::clone(
            self.refresh_locks
                .entry(issuer.to_string())
                .or_default()
                .value(),
        );

        match lock.try_lock() {
            Ok(_guard) => {
                if !self.cache.is_expired(cache_key) {
                    return;
                }
                if let Err(e) = self.refresh(issuer).await {
                    warn!(issuer = %issuer, error = %e, "Key refresh failed, serving cached keys");
                }
            }
            Err(_) => {
                debug!(issuer = %issuer, "Waiting for in-flight key refresh");
                let _guard = lock.lock().await;
            }
        }
    }

    /// Fetch the issuer's discovery document and JWKS, caching every key
    ///
    /// Nothing is written unless both fetches succeed.
    ///
    /// # Errors
    ///
    /// Returns [`KeyFetchError`] on any URL, transport, status or decode
    /// failure.
    pub async fn refresh(&self, issuer: &str) -> Result<usize, KeyFetchError> {
        let discovery_url = discovery_url(issuer)?;
        debug!(issuer = %issuer, url = %discovery_url, "Fetching OIDC discovery document");

        let discovery: DiscoveryDocument =
            serde_json::from_value(self.fetcher.fetch_json(&discovery_url).await?).map_err(
                |source| KeyFetchError::Decode {
                    document: "discovery",
                    source,
                },
            )?;

        let jwks_url =
            discovery_url
                .join(&discovery.jwks_uri)
                .map_err(|source| KeyFetchError::InvalidUrl {
                    url: discovery.jwks_uri.clone(),
                    source,
                })?;

        let jwks: JwksDocument = serde_json::from_value(self.fetcher.fetch_json(&jwks_url).await?)
            .map_err(|source| KeyFetchError::Decode {
                document: "JWKS",
                source,
            })?;

        let keys: Vec<(String, Arc<VerificationKey>)> = jwks
            .keys
            .into_iter()
            .map(|value| {
                let key = VerificationKey::from_jwk_value(value);
                (
                    Cache::<Arc<VerificationKey>>::key_for(issuer, key.kid()),
                    Arc::new(key),
                )
            })
            .collect();
        let count = keys.len();

        self.cache.set_all(keys);

        info!(
            issuer = %issuer,
            jwks_uri = %jwks_url,
            key_count = count,
            "JWKS cache refreshed"
        );

        Ok(count)
    }

    /// Freshness window of the key cache
    pub fn cache_max_age(&self) -> Duration {
        self.cache.max_age()
    }

    /// Number of cached keys across all issuers
    pub fn cached_key_count(&self) -> usize {
        self.cache.len()
    }

    /// The fetcher used for discovery and JWKS requests
    pub fn fetcher(&self) -> Arc<dyn HttpFetcher> {
        Arc::clone(&self.fetcher)
    }
}

/// `{issuer without trailing slashes}/.well-known/openid-configuration`
pub fn discovery_url(issuer: &str) -> Result<Url, KeyFetchError> {
    let raw = format!("{}{WELL_KNOWN}", issuer.trim_end_matches('/'));
    Url::parse(&raw).map_err(|source| KeyFetchError::InvalidUrl { url: raw, source })
}
