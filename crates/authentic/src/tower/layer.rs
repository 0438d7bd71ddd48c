//! Tower Layer for bearer token validation

use http::Response;
use std::sync::Arc;
use tower::Layer;

use super::service::AuthenticService;
use super::{FailureHook, SuccessHook};
use crate::jwt::{ValidationResult, Validator};

/// Tower Layer that guards services with [`AuthenticService`]
///
/// # Example
///
/// ```rust,ignore
/// use tower::ServiceBuilder;
/// use authentic::tower::AuthenticLayer;
///
/// let layer = AuthenticLayer::new(validator)
///     .on_success(|parts, result| {
///         if let Some(sub) = result.claims.get("sub").and_then(|s| s.as_str()) {
///             parts.headers.insert("x-subject", sub.parse().unwrap());
///         }
///     });
///
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(my_inner_service);
/// ```
#[derive(Clone)]
pub struct AuthenticLayer {
    validator: Arc<Validator>,
    on_success: Option<SuccessHook>,
    on_failure: Option<FailureHook>,
}

impl AuthenticLayer {
    /// Create a layer that answers rejected requests with the default 401
    pub fn new(validator: Arc<Validator>) -> Self {
        Self {
            validator,
            on_success: None,
            on_failure: None,
        }
    }

    /// Run `hook` on every accepted request before the inner service
    #[must_use]
    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut http::request::Parts, &ValidationResult) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    /// Answer rejected requests with `hook`'s response instead of the default
    #[must_use]
    pub fn on_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&http::request::Parts) -> Response<String> + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(hook));
        self
    }

    /// The validator shared by every wrapped service
    pub fn validator(&self) -> &Arc<Validator> {
        &self.validator
    }

    pub(super) fn success_hook(&self) -> Option<&SuccessHook> {
        self.on_success.as_ref()
    }

    pub(super) fn failure_hook(&self) -> Option<&FailureHook> {
        self.on_failure.as_ref()
    }
}

impl std::fmt::Debug for AuthenticLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticLayer")
            .field("validator", &self.validator)
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

impl<S> Layer<S> for AuthenticLayer {
    type Service = AuthenticService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthenticService::new(inner, self.clone())
    }
}
