//! # Tower middleware
//!
//! Guards an HTTP service with bearer token validation.
//!
//! - [`AuthenticLayer`] - wraps services with [`AuthenticService`]
//! - [`AuthenticService`] - extracts the token from `Authorization`, validates
//!   it, and either forwards the request or answers 401
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tower::ServiceBuilder;
//! use authentic::{Validator, ValidatorConfig};
//! use authentic::tower::AuthenticLayer;
//!
//! let validator = Arc::new(Validator::new(ValidatorConfig::default())?);
//!
//! let service = ServiceBuilder::new()
//!     .layer(AuthenticLayer::new(validator))
//!     .service(my_http_handler);
//! ```
//!
//! ## Request Extensions
//!
//! On success the [`ValidationResult`](crate::ValidationResult) is inserted into
//! the request's extensions:
//!
//! ```rust,ignore
//! if let Some(result) = req.extensions().get::<ValidationResult>() {
//!     println!("subject: {:?}", result.claims.get("sub"));
//! }
//! ```
//!
//! ## Rejections
//!
//! Invalid and expired tokens are both answered with `401 Unauthorized` and
//! the body `{"message":"Unauthorized","causes":["Invalid session"]}`, unless
//! a failure hook is installed, in which case the hook's response is used
//! instead.

mod layer;
mod service;

pub use layer::AuthenticLayer;
pub use service::{AuthenticService, AuthenticServiceFuture};

use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Called after an accepted request's result is stored in its extensions,
/// before the inner service runs
pub type SuccessHook =
    Arc<dyn Fn(&mut http::request::Parts, &crate::ValidationResult) + Send + Sync>;

/// Produces the response for a rejected request, replacing the default 401
pub type FailureHook = Arc<dyn Fn(&http::request::Parts) -> Response<String> + Send + Sync>;

/// JSON body of the default rejection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short status text
    pub message: String,
    /// Reasons shown to the client
    pub causes: Vec<String>,
}

impl ErrorResponse {
    /// `{"message":"Unauthorized","causes":["Invalid session"]}`
    pub fn unauthorized() -> Self {
        Self {
            message: "Unauthorized".to_string(),
            causes: vec!["Invalid session".to_string()],
        }
    }
}

/// Default rejection: 401 with an [`ErrorResponse`] JSON body
pub fn unauthorized_response() -> Response<String> {
    // Two plain strings always serialize
    let body = serde_json::to_string(&ErrorResponse::unauthorized()).unwrap_or_default();

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Remove a leading `Bearer` scheme (any ASCII case) and following whitespace
///
/// Values without the scheme are returned unchanged.
pub fn strip_bearer(value: &str) -> &str {
    match value.get(..6) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => value[6..].trim_start(),
        _ => value,
    }
}
