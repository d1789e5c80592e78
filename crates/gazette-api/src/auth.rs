//! Admin credential middleware.
//!
//! `AdminAuthLayer` wraps the admin routes and asks a [`CredentialCheck`] to
//! accept the request's bearer token. How credentials are issued is outside
//! this crate; [`StaticToken`] covers the single shared token case.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, header};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

use crate::error::ApiError;

/// Boxed future returned by [`CredentialCheck::check`].
pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AuthError>> + Send + 'a>>;

/// Why a credential was refused.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header or bearer token present.
    #[error("missing bearer token")]
    MissingToken,

    /// The token was presented but not accepted.
    #[error("token rejected")]
    Rejected,

    /// The credential service could not be consulted.
    #[error("credential check unavailable: {0}")]
    Unavailable(String),
}

/// Configuration for the admin auth layer.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// When false, all admin requests pass through (local development).
    pub enabled: bool,
}

/// Decides whether a bearer token may use the admin routes.
pub trait CredentialCheck: Send + Sync + 'static {
    /// Accept or refuse a token.
    fn check<'a>(&'a self, token: &'a str) -> CheckFuture<'a>;
}

/// Accepts exactly one configured token.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Create a check for the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

impl CredentialCheck for StaticToken {
    fn check<'a>(&'a self, token: &'a str) -> CheckFuture<'a> {
        Box::pin(async move {
            if !self.token.is_empty() && constant_time_eq(self.token.as_bytes(), token.as_bytes()) {
                Ok(())
            } else {
                Err(AuthError::Rejected)
            }
        })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Tower `Layer` guarding admin routes.
#[derive(Clone)]
pub struct AdminAuthLayer {
    check: Arc<dyn CredentialCheck>,
    config: AuthConfig,
}

impl AdminAuthLayer {
    /// Create a layer with the given check and config.
    pub fn new(check: Arc<dyn CredentialCheck>, config: AuthConfig) -> Self {
        Self { check, config }
    }
}

impl<S> Layer<S> for AdminAuthLayer {
    type Service = AdminAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdminAuthService {
            inner,
            check: self.check.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower `Service` that checks the bearer token before forwarding.
#[derive(Clone)]
pub struct AdminAuthService<S> {
    inner: S,
    check: Arc<dyn CredentialCheck>,
    config: AuthConfig,
}

impl<S> Service<Request<Body>> for AdminAuthService<S>
where
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let check = self.check.clone();
        let enabled = self.config.enabled;

        Box::pin(async move {
            if enabled {
                let token = extract_bearer_token(&req).map(str::to_string);
                let verdict = match token {
                    Some(token) => check.check(&token).await,
                    None => Err(AuthError::MissingToken),
                };
                if let Err(err) = verdict {
                    log::warn!("Admin request to {} refused: {err}", req.uri().path());
                    return Ok(ApiError::Unauthorized.into_response());
                }
            }

            let resp = inner
                .call(req)
                .await
                .unwrap_or_else(|infallible| match infallible {});
            Ok(resp.into_response())
        })
    }
}

/// Extract bearer token from the Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
