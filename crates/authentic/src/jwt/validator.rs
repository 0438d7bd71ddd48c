//! Bearer token validation against issuer-published keys
//!
//! Validation runs in this order:
//! 1. Parse the token into header blocks and an unverified payload
//! 2. Read the unverified `iss` (needed to find keys, never trusted)
//! 3. Reject issuers outside the allow-list, if one is configured
//! 4. Resolve a key for every header block; the LAST block that resolves wins
//! 5. Check the key is usable and its algorithm matches the header
//! 6. Verify the signature and take the now trusted claims
//! 7. Decide expiry with the configured [`Clock`]
//!
//! Every failure collapses to `valid == false`. The reason is logged at
//! `debug` level only.

use chrono::DateTime;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::fetch::{HttpFetcher, ReqwestFetcher};
use super::jwks::{KeyManager, VerificationKey};
use super::token::{SignatureBlock, SignedToken, TokenClaims};
use crate::clock::{Clock, SystemClock};
use crate::config::ValidatorConfig;
use crate::error::{TokenError, ValidatorError};

/// Outcome of [`Validator::validate_token`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// Verified claims; empty unless `valid`
    pub claims: TokenClaims,
    /// Signature verified against the issuer's published key
    pub valid: bool,
    /// `exp` is absent, unusable or not in the future. Only meaningful when `valid`.
    pub expired: bool,
}

impl ValidationResult {
    /// Valid and not expired
    pub fn is_acceptable(&self) -> bool {
        self.valid && !self.expired
    }

    fn invalid() -> Self {
        Self::default()
    }
}

/// JWT validator resolving keys through OIDC discovery
///
/// Cloning is cheap and clones share the key cache.
///
/// # Example
///
/// ```rust,no_run
/// # use authentic::{Validator, ValidatorConfig};
/// # use std::time::Duration;
/// # tokio_test::block_on(async {
/// let validator = Validator::new(ValidatorConfig::default())?
///     .with_whitelist(["https://auth.example.com/"])
///     .with_cache_max_age(Duration::from_secs(3600));
///
/// let result = validator.validate_token("eyJraWQiOi...").await;
/// if result.valid && !result.expired {
///     println!("subject: {:?}", result.claims.get("sub"));
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Validator {
    whitelist: Vec<String>,
    keys: Arc<KeyManager>,
    clock: Arc<dyn Clock>,
}

impl Validator {
    /// Create a validator that fetches keys over HTTP with `reqwest`
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError`] if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: ValidatorConfig) -> Result<Self, ValidatorError> {
        config.validate()?;
        let fetcher = Arc::new(ReqwestFetcher::new(config.request_timeout())?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Create a validator configured from the environment
    ///
    /// # Errors
    ///
    /// See [`ValidatorConfig::from_env`] and [`Validator::new`].
    pub fn from_env() -> Result<Self, ValidatorError> {
        Self::new(ValidatorConfig::from_env()?)
    }

    /// Create a validator with a custom document fetcher
    ///
    /// `request_timeout_secs` is ignored; timeouts belong to the fetcher.
    pub fn with_fetcher(config: ValidatorConfig, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            keys: Arc::new(KeyManager::with_fetcher(config.cache_max_age(), fetcher)),
            whitelist: config.issuer_whitelist,
            clock: Arc::new(SystemClock),
        }
    }

    /// Only accept tokens from these issuers
    ///
    /// An empty list accepts any issuer.
    #[must_use]
    pub fn with_whitelist<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = issuers.into_iter().map(Into::into).collect();
        self
    }

    /// Use a new key cache with a different max age
    ///
    /// Keys cached so far are dropped; the fetcher is kept.
    #[must_use]
    pub fn with_cache_max_age(mut self, max_age: Duration) -> Self {
        self.keys = Arc::new(KeyManager::with_fetcher(max_age, self.keys.fetcher()));
        self
    }

    /// Substitute the time source used for expiry
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate a token
    ///
    /// Never fails. A token that cannot be parsed, whose key cannot be
    /// resolved, or whose signature does not verify yields `valid == false`.
    pub async fn validate_token(&self, token: &str) -> ValidationResult {
        match self.verify(token).await {
            Ok(claims) => {
                let expired = self.is_expired(&claims);
                ValidationResult {
                    claims,
                    valid: true,
                    expired,
                }
            }
            Err(e) => {
                debug!(error = %e, "Token rejected");
                ValidationResult::invalid()
            }
        }
    }

    /// Valid signature and not expired
    pub async fn is_valid(&self, token: &str) -> bool {
        self.validate_token(token).await.is_acceptable()
    }

    /// Whether claims describe an expired token
    ///
    /// Missing, non-numeric or out-of-range `exp` counts as expired.
    pub fn is_expired(&self, claims: &TokenClaims) -> bool {
        let Some(exp) = claims.get("exp").and_then(serde_json::Value::as_f64) else {
            return true;
        };
        if !exp.is_finite() {
            return true;
        }

        match DateTime::from_timestamp(exp as i64, 0) {
            Some(expires_at) => !self.clock.is_future(expires_at),
            None => true,
        }
    }

    async fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let token = SignedToken::parse(token)?;

        // Unverified read, only used to locate keys
        let issuer = token
            .unverified_issuer()
            .ok_or(TokenError::MissingIssuer)?
            .to_string();

        if !self.issuer_allowed(&issuer) {
            return Err(TokenError::IssuerNotAllowed(issuer));
        }

        let (block, key) = self
            .resolve_key(&issuer, token.blocks())
            .await
            .ok_or_else(|| TokenError::KeyNotFound(issuer.clone()))?;

        let Some(decoding_key) = key.decoding_key().filter(|_| key.is_valid()) else {
            return Err(TokenError::InvalidKey(key.kid().to_string()));
        };

        if key.algorithm() != Some(block.algorithm()) {
            return Err(TokenError::AlgorithmMismatch {
                header: block.algorithm(),
                key: key.algorithm(),
            });
        }

        let claims = block.verify(decoding_key)?;
        debug!(issuer = %issuer, kid = block.kid(), "Token signature verified");
        Ok(claims)
    }

    /// Ask for a key for every header block; the last one that resolves wins
    ///
    /// All blocks are looked up even after a hit, so a later block always
    /// takes precedence over an earlier one.
    async fn resolve_key<'t>(
        &self,
        issuer: &str,
        blocks: &'t [SignatureBlock],
    ) -> Option<(&'t SignatureBlock, Arc<VerificationKey>)> {
        let mut active = None;
        for block in blocks {
            if let Some(key) = self.keys.get(issuer, block.kid()).await {
                active = Some((block, key));
            }
        }
        active
    }

    fn issuer_allowed(&self, issuer: &str) -> bool {
        self.whitelist.is_empty() || self.whitelist.iter().any(|allowed| allowed == issuer)
    }

    /// Configured issuer allow-list
    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    /// Max age of cached keys
    pub fn cache_max_age(&self) -> Duration {
        self.keys.cache_max_age()
    }

    /// The key manager backing this validator
    pub fn key_manager(&self) -> &Arc<KeyManager> {
        &self.keys
    }
}
