//! # Authentic - OIDC Bearer Token Validation
//!
//! Validates JWTs against the signing keys their issuer publishes through
//! OpenID Connect discovery. Keys are fetched on demand, cached per issuer and
//! key id, and refreshed once their cache entry ages out. When a refresh fails
//! the previously cached keys keep being served.
//!
//! ## Architecture
//!
//! - [`jwt`] - Token parsing, key management and the [`Validator`]
//! - [`cache`] - Thread-safe cache with age-based expiry and stale reads
//! - [`clock`] - Time source used for `exp` checks
//! - [`config`] - [`ValidatorConfig`] and environment loading
//! - [`error`] - Error types
//! - [`tower`] - HTTP middleware (feature `middleware`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use authentic::{Validator, ValidatorConfig};
//!
//! # tokio_test::block_on(async {
//! let validator = Validator::new(ValidatorConfig::default())?
//!     .with_whitelist(["https://auth.example.com/"]);
//!
//! let result = validator.validate_token("eyJraWQiOi...").await;
//! if result.valid && !result.expired {
//!     println!("claims: {:?}", result.claims);
//! }
//! # Ok::<(), authentic::ValidatorError>(())
//! # });
//! ```
//!
//! ## Key Resolution
//!
//! 1. The token's `iss` is read without verification
//! 2. `{iss}/.well-known/openid-configuration` is fetched (trailing `/` trimmed)
//! 3. The document's `jwks_uri` is fetched and every key is cached under
//!    `{iss}/{kid}`
//!
//! Concurrent lookups for the same issuer share one refresh.
//!
//! ## Feature Flags
//!
//! - `middleware` (default) - Tower [`Layer`](::tower::Layer) guarding HTTP services

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod jwt;

#[cfg(feature = "middleware")]
pub mod tower;

#[doc(inline)]
pub use clock::{Clock, FixedClock, SystemClock};
#[doc(inline)]
pub use config::ValidatorConfig;
#[doc(inline)]
pub use error::{KeyFetchError, TokenError, ValidatorError};
#[doc(inline)]
pub use jwt::{
    HttpFetcher, KeyManager, ReqwestFetcher, TokenClaims, ValidationResult, Validator,
    VerificationKey,
};

#[cfg(feature = "middleware")]
pub use crate::tower::{AuthenticLayer, AuthenticService, ErrorResponse};
