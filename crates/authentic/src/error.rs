//! Error types
//!
//! Errors are split by tier. [`KeyFetchError`] covers the infrastructure side
//! (discovery and JWKS retrieval) and is swallowed by the key manager so that
//! stale keys keep being served. [`TokenError`] covers everything that can be
//! wrong with a presented token; the validator logs it and reports the token
//! as invalid. [`ValidatorError`] is only produced while building a validator.

use thiserror::Error;

/// Discovery or JWKS retrieval failure
#[derive(Debug, Error)]
pub enum KeyFetchError {
    /// The issuer or `jwks_uri` could not be turned into a URL
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The offending input
        url: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("{url} returned status {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body was not the expected document
    #[error("invalid {document} document: {source}")]
    Decode {
        /// Which document failed to decode ("discovery", "JWKS", or "JSON" for
        /// a body that is not JSON at all)
        document: &'static str,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },
}

/// Reasons a token is rejected
///
/// These never cross the public `validate_token` boundary; they exist so the
/// rejection reason shows up in logs.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Not a compact or JSON serialized JWS
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    /// A base64url segment failed to decode
    #[error("invalid token encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Protected header could not be parsed
    #[error("invalid token header: {0}")]
    Header(#[source] jsonwebtoken::errors::Error),

    /// Payload is not a JSON object
    #[error("invalid token claims: {0}")]
    Claims(#[from] serde_json::Error),

    /// No string `iss` claim
    #[error("token has no issuer")]
    MissingIssuer,

    /// Issuer is not on the configured allow-list
    #[error("issuer '{0}' is not allowed")]
    IssuerNotAllowed(String),

    /// None of the header blocks resolved to a key
    #[error("no verification key found for issuer '{0}'")]
    KeyNotFound(String),

    /// Resolved key failed its own structural check
    #[error("verification key '{0}' is not usable")]
    InvalidKey(String),

    /// Header algorithm differs from the key's declared algorithm
    #[error("algorithm {header:?} does not match key algorithm {key:?}")]
    AlgorithmMismatch {
        /// Algorithm named in the token header
        header: jsonwebtoken::Algorithm,
        /// Algorithm declared by the JWK, if any
        key: Option<jsonwebtoken::Algorithm>,
    },

    /// Signature verification failed
    #[error("signature verification failed: {0}")]
    Signature(#[source] jsonwebtoken::errors::Error),
}

/// Validator construction failure
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// The HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration is invalid
    #[error("invalid configuration: {0}")]
    Config(String),
}
