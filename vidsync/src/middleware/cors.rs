//! Cross-origin policy
//!
//! The session cookie only reaches the server from the dashboard origin if
//! credentials are allowed, and browsers only allow credentials for a single
//! explicit origin.

use crate::config::CorsConfig;
use axum::http::{
    header::{HeaderName, CONTENT_TYPE},
    HeaderValue, Method,
};
use thiserror::Error;
use tower_http::cors::CorsLayer;

/// Header some clients use to present the anti-forgery secret
pub const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// Invalid CORS configuration
#[derive(Debug, Error)]
pub enum CorsError {
    /// The origin is not a usable header value or is a wildcard
    #[error("invalid allowed origin {0:?}: credentials require one explicit origin")]
    InvalidOrigin(String),
}

/// Build the CORS layer for the configured frontend origin
///
/// # Errors
///
/// Returns [`CorsError::InvalidOrigin`] for wildcards or unparsable origins.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, CorsError> {
    let origin = config.allowed_origin.trim();
    if origin.is_empty() || origin == "*" {
        return Err(CorsError::InvalidOrigin(origin.to_string()));
    }

    let origin = HeaderValue::from_str(origin)
        .map_err(|_| CorsError::InvalidOrigin(origin.to_string()))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, CSRF_HEADER])
        .allow_credentials(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wildcard() {
        let config = CorsConfig {
            allowed_origin: "*".to_string(),
        };
        assert!(matches!(cors_layer(&config), Err(CorsError::InvalidOrigin(_))));
    }

    #[test]
    fn test_accepts_single_origin() {
        assert!(cors_layer(&CorsConfig::default()).is_ok());
    }
}
