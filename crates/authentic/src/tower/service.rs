//! Tower Service performing bearer token validation
//!
//! Flow for each request:
//! 1. Read `Authorization` and strip the `Bearer` scheme
//! 2. Validate the token (a missing header validates as an empty token)
//! 3. Invalid or expired: answer with the failure hook or the default 401
//! 4. Otherwise insert the [`ValidationResult`] into the request extensions,
//!    run the success hook and forward to the inner service

use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use http::header::AUTHORIZATION;
use tower_service::Service;
use tracing::debug;

use super::layer::AuthenticLayer;
use super::{strip_bearer, unauthorized_response};
use crate::jwt::{ValidationResult, Validator};

/// Tower Service that rejects requests without an acceptable bearer token
#[derive(Debug, Clone)]
pub struct AuthenticService<S> {
    inner: S,
    layer: AuthenticLayer,
}

/// Boxed future returned by [`AuthenticService`]
pub type AuthenticServiceFuture<T, E> = BoxFuture<'static, Result<T, E>>;

impl<S> AuthenticService<S> {
    /// Wrap `inner` with the validator and hooks of `layer`
    pub fn new(inner: S, layer: AuthenticLayer) -> Self {
        Self { inner, layer }
    }

    /// Get a reference to the inner service
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get a mutable reference to the inner service
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// The validator checking tokens
    pub fn validator(&self) -> &Arc<Validator> {
        self.layer.validator()
    }
}

/// Token carried by the `Authorization` header, empty when absent
fn bearer_token(headers: &http::HeaderMap) -> String {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(strip_bearer)
        .unwrap_or_default()
        .to_string()
}

impl<S, B, ResBody> Service<http::Request<B>> for AuthenticService<S>
where
    S: Service<http::Request<B>, Response = http::Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    B: Send + 'static,
    ResBody: From<String> + Send + 'static,
{
    type Response = http::Response<ResBody>;
    type Error = S::Error;
    type Future = AuthenticServiceFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);
        let validator = Arc::clone(self.layer.validator());
        let on_success = self.layer.success_hook().cloned();
        let on_failure = self.layer.failure_hook().cloned();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            let token = bearer_token(&parts.headers);

            let result: ValidationResult = validator.validate_token(&token).await;
            if !result.is_acceptable() {
                debug!(
                    valid = result.valid,
                    expired = result.expired,
                    path = parts.uri.path(),
                    "Request rejected"
                );
                let response = match on_failure {
                    Some(hook) => hook(&parts),
                    None => unauthorized_response(),
                };
                return Ok(response.map(ResBody::from));
            }

            parts.extensions.insert(result.clone());
            if let Some(hook) = on_success {
                hook(&mut parts, &result);
            }

            inner.call(http::Request::from_parts(parts, body)).await
        })
    }
}
