//! Session extractor
//!
//! Provides axum access to the [`SessionContext`] attached by the session
//! middleware.

use crate::auth::SessionContext;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, StatusCode},
};
use std::convert::Infallible;

/// Extractor for the caller's session context
///
/// Requires `SessionLayer` to be applied to the router.
///
/// # Example
///
/// ```rust,ignore
/// use vidsync::extractors::CurrentSession;
///
/// async fn handler(CurrentSession(session): CurrentSession) {
///     tracing::info!(fresh = session.is_fresh(), "request");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionContext);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .map(Self)
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Session not initialized"))
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<SessionContext>().cloned().map(Self))
    }
}
