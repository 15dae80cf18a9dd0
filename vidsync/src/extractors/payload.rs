//! Mutation payload normalization
//!
//! Browsers submit mutating calls as multipart forms, urlencoded forms or
//! JSON, and some clients send a body without a usable content type. This
//! extractor turns all of them into one typed [`MutationPayload`] so
//! handlers never look at transport formats.

use crate::middleware::cors::CSRF_HEADER;
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;

/// Body field carrying the anti-forgery secret
pub const SECRET_FIELD: &str = "csrf_token";

/// Body field carrying the entity identifier
pub const ENTITY_FIELD: &str = "video_id";

/// Normalized body of a mutating request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MutationPayload {
    /// Entity identifier, trimmed; empty when absent
    #[serde(rename = "video_id", alias = "entity_id", default)]
    pub entity_id: String,
    /// Presented anti-forgery secret, byte-for-byte; empty when absent
    #[serde(rename = "csrf_token", alias = "secret", default)]
    pub secret: String,
}

impl MutationPayload {
    /// Build from loosely parsed key/value fields
    fn from_fields(fields: &HashMap<String, String>) -> Self {
        let pick = |keys: [&str; 2]| {
            keys.iter()
                .find_map(|k| fields.get(*k))
                .cloned()
                .unwrap_or_default()
        };

        Self {
            entity_id: pick([ENTITY_FIELD, "entity_id"]).trim().to_string(),
            secret: pick([SECRET_FIELD, "secret"]),
        }
    }

    /// Parse a raw body: urlencoded first, then JSON
    #[must_use]
    pub fn parse_raw(body: &[u8]) -> Self {
        let trimmed = body.trim_ascii_start();
        if trimmed.is_empty() {
            return Self::default();
        }

        if !trimmed.starts_with(b"{") {
            if let Ok(fields) = serde_urlencoded::from_bytes::<HashMap<String, String>>(body) {
                let payload = Self::from_fields(&fields);
                if payload != Self::default() {
                    return payload;
                }
            }
        }

        serde_json::from_slice::<Self>(body)
            .map(|p| Self {
                entity_id: p.entity_id.trim().to_string(),
                secret: p.secret,
            })
            .unwrap_or_default()
    }

    async fn from_multipart(mut multipart: Multipart) -> Self {
        let mut fields = HashMap::new();
        loop {
            match multipart.next_field().await {
                Ok(Some(field)) => {
                    let Some(name) = field.name().map(str::to_string) else {
                        continue;
                    };
                    match field.text().await {
                        Ok(value) => {
                            fields.insert(name, value);
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "Unreadable multipart field");
                            break;
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "Malformed multipart body");
                    break;
                }
            }
        }
        Self::from_fields(&fields)
    }
}

impl<S> FromRequest<S> for MutationPayload
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let header_secret = req
            .headers()
            .get(&CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_default();

        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        let mut payload = if is_multipart {
            match Multipart::from_request(req, state).await {
                Ok(multipart) => Self::from_multipart(multipart).await,
                Err(e) => {
                    tracing::debug!(error = %e, "Rejected multipart body");
                    Self::default()
                }
            }
        } else {
            match Bytes::from_request(req, state).await {
                Ok(body) => Self::parse_raw(&body),
                Err(e) => {
                    tracing::debug!(error = %e, "Unreadable request body");
                    Self::default()
                }
            }
        };

        if payload.secret.is_empty() {
            payload.secret = header_secret;
        }

        Ok(payload)
    }
}
