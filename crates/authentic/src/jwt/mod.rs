//! JWT infrastructure: token parsing, JWKS key resolution and validation
//!
//! ```text
//!   Validator ──► KeyManager ──► Cache<Arc<VerificationKey>>
//!       │              │
//!       │              └──► HttpFetcher (discovery + JWKS)
//!       └──► SignedToken ──► jsonwebtoken (header parsing, signatures)
//! ```
//!
//! # Modules
//!
//! - `token` - compact and JSON serialized JWS parsing
//! - `fetch` - HTTP seam for discovery and JWKS documents
//! - `jwks` - key cache population with stale-serve
//! - `validator` - orchestration and expiry

pub mod fetch;
pub mod jwks;
pub mod token;
pub mod validator;

pub use fetch::{HttpFetcher, ReqwestFetcher};
pub use jwks::{KeyManager, VerificationKey, WELL_KNOWN};
pub use token::{SignatureBlock, SignedToken, TokenClaims};
pub use validator::{ValidationResult, Validator};
