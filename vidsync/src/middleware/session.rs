//! Session middleware
//!
//! Resolves the session cookie into a [`SessionContext`] for handlers and
//! sets the cookie once a new session has actually been stored.

use crate::auth::{SessionContext, SessionId, SessionStore};
use crate::config::SessionConfig;
use axum::{
    body::Body,
    extract::Request,
    http::header::{COOKIE, SET_COOKIE},
    response::Response,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Session cookie name
pub const SESSION_COOKIE_NAME: &str = "vidsync_session";

/// SameSite cookie policy
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Strict same-site policy
    Strict,
    /// Lax same-site policy (recommended)
    #[default]
    Lax,
    /// No same-site restriction (requires Secure)
    None,
}

impl SameSite {
    /// Convert to cookie attribute string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Layer for session middleware
#[derive(Clone, Debug)]
pub struct SessionLayer {
    config: SessionConfig,
    store: SessionStore,
}

impl SessionLayer {
    /// Create session layer with default configuration
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self {
            config: SessionConfig::default(),
            store,
        }
    }

    /// Create session layer with custom configuration
    #[must_use]
    pub const fn with_config(store: SessionStore, config: SessionConfig) -> Self {
        Self { config, store }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            config: Arc::new(self.config.clone()),
            store: self.store.clone(),
        }
    }
}

/// Session middleware that handles cookie-based sessions
#[derive(Clone, Debug)]
pub struct SessionMiddleware<S> {
    inner: S,
    config: Arc<SessionConfig>,
    store: SessionStore,
}

impl<S> Service<Request> for SessionMiddleware<S>
where
    S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let config = self.config.clone();
        let store = self.store.clone();
        // Take the instance that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            // Known ids are resumed and marked seen; anything else gets a fresh
            // id without touching the store
            let context = extract_session_id(&req, &config.cookie_name)
                .filter(|id| store.touch(id))
                .map_or_else(
                    || SessionContext::fresh(SessionId::generate()),
                    SessionContext::resumed,
                );

            req.extensions_mut().insert(context.clone());

            let mut response = inner.call(req).await?;

            // Only sessions materialized by this request need a cookie
            if context.is_fresh() && store.contains(context.id()) {
                set_session_cookie(&mut response, context.id(), &config);
            }

            Ok(response)
        })
    }
}

/// Extract session ID from request cookies
fn extract_session_id(req: &Request, cookie_name: &str) -> Option<SessionId> {
    let cookie_header = req.headers().get(COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name.trim() == cookie_name {
                return SessionId::from_str(value.trim()).ok();
            }
        }
    }

    None
}

/// Render the `Set-Cookie` value for a session
fn session_cookie(session_id: &SessionId, config: &SessionConfig) -> String {
    let mut cookie_value = format!(
        "{}={}; Path={}; SameSite={}",
        config.cookie_name,
        session_id.as_str(),
        config.cookie_path,
        config.same_site.as_str()
    );

    if let Some(max_age) = config.max_age_seconds {
        cookie_value.push_str(&format!("; Max-Age={max_age}"));
    }

    cookie_value.push_str("; HttpOnly");

    if config.secure {
        cookie_value.push_str("; Secure");
    }

    cookie_value
}

/// Set session cookie on response
fn set_session_cookie(
    response: &mut Response<Body>,
    session_id: &SessionId,
    config: &SessionConfig,
) {
    match session_cookie(session_id, config).parse() {
        Ok(header_value) => {
            response.headers_mut().append(SET_COOKIE, header_value);
        }
        Err(e) => tracing::error!(error = %e, "Session cookie is not a valid header value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    fn issuing_router(store: SessionStore) -> Router {
        let issuer = store.clone();
        Router::new()
            .route(
                "/issue",
                get(move |axum::Extension(ctx): axum::Extension<SessionContext>| {
                    let issuer = issuer.clone();
                    async move { issuer.issue_secret(ctx.id(), 32).as_str().to_string() }
                }),
            )
            .route("/noop", get(|| async { "ok" }))
            .layer(SessionLayer::new(store))
    }

    fn get_request(uri: &str) -> Request {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_same_site_as_str() {
        assert_eq!(SameSite::Strict.as_str(), "Strict");
        assert_eq!(SameSite::Lax.as_str(), "Lax");
        assert_eq!(SameSite::None.as_str(), "None");
    }

    #[test]
    fn test_cookie_attributes() {
        let id = SessionId::generate();
        let cookie = session_cookie(&id, &SessionConfig::default());
        assert!(cookie.starts_with(&format!("{SESSION_COOKIE_NAME}={}", id.as_str())));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));
        assert!(!cookie.contains("Max-Age"));

        let config = SessionConfig {
            secure: true,
            max_age_seconds: Some(600),
            ..SessionConfig::default()
        };
        let cookie = session_cookie(&id, &config);
        assert!(cookie.contains("; Secure"));
        assert!(cookie.contains("Max-Age=600"));
    }

    #[tokio::test]
    async fn test_cookie_only_when_session_stored() {
        let store = SessionStore::new();
        let app = issuing_router(store.clone());

        let response = app
            .clone()
            .oneshot(get_request("/noop"))
            .await
            .unwrap();
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert!(store.is_empty());

        let response = app
            .oneshot(get_request("/issue"))
            .await
            .unwrap();
        assert!(response.headers().get(SET_COOKIE).is_some());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_known_cookie_is_resumed() {
        let store = SessionStore::new();
        let id = SessionId::generate();
        let secret = store.issue_secret(&id, 32);
        let app = issuing_router(store.clone());

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/issue")
                    .header(
                        COOKIE,
                        format!("other=1; {SESSION_COOKIE_NAME}={}", id.as_str()),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(SET_COOKIE).is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, secret.as_str().as_bytes());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_resumed_session_is_marked_seen() {
        let store = SessionStore::new();
        let id = SessionId::generate();
        store.issue_secret(&id, 32);
        let issued_at = store.load(&id).unwrap().last_seen;
        let app = issuing_router(store.clone());

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/noop")
                    .header(COOKIE, format!("{SESSION_COOKIE_NAME}={}", id.as_str()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(SET_COOKIE).is_none());
        assert!(store.load(&id).unwrap().last_seen > issued_at);
    }
}
