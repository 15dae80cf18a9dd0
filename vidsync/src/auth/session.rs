//! Session identity and per-session state
//!
//! A session is created lazily the first time a client asks for an
//! anti-forgery secret. Its only payload is that secret, which is written
//! once and never regenerated while the session lives.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Number of random bytes behind a session id.
const SESSION_ID_BYTES: usize = 32;

/// Length of an encoded session id (URL-safe base64, no padding).
const SESSION_ID_LEN: usize = 43;

/// Lower bound on anti-forgery secret size (256 bits).
pub const MIN_SECRET_BYTES: usize = 32;

/// Session id parse errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The id has the wrong length or alphabet
    #[error("malformed session id")]
    MalformedId,
}

/// Opaque session identifier carried in the session cookie
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new random session id
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        rand::rng().fill(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// The encoded id as sent in the cookie
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in log lines
    #[must_use]
    pub fn log_prefix(&self) -> &str {
        &self.0[..8]
    }
}

impl FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = s.len() == SESSION_ID_LEN
            && s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

        if well_formed {
            Ok(Self(s.to_string()))
        } else {
            Err(SessionError::MalformedId)
        }
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionId").field(&self.log_prefix()).finish()
    }
}

/// Anti-forgery secret, lowercase hex for transport
///
/// `Debug` output is redacted so the value cannot end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Generate a secret from `bytes` bytes of OS randomness
    ///
    /// Sizes below [`MIN_SECRET_BYTES`] are raised to the minimum.
    #[must_use]
    pub fn generate(bytes: usize) -> Self {
        let mut buf = vec![0u8; bytes.max(MIN_SECRET_BYTES)];
        rand::rng().fill(&mut buf[..]);
        Self(hex::encode(buf))
    }

    /// Hex representation handed to the client
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a presented value
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        let stored = self.0.as_bytes();
        let provided = presented.as_bytes();

        // ct_eq on slices of unequal length returns false without comparing
        if stored.len() != provided.len() {
            return false;
        }

        stored.ct_eq(provided).into()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Server-held session record
#[derive(Debug, Clone)]
pub struct Session {
    /// Session identifier
    pub id: SessionId,
    /// Anti-forgery secret, set once by issuance
    pub secret: Option<Secret>,
    /// When the session was first materialized
    pub created_at: DateTime<Utc>,
    /// Last time issuance touched the session
    pub last_seen: DateTime<Utc>,
}

impl Session {
    /// A new session with no secret yet
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            secret: None,
            created_at: now,
            last_seen: now,
        }
    }

    /// The stored secret, generating it if this is the first issuance
    pub fn secret_or_generate(&mut self, bytes: usize) -> &Secret {
        self.last_seen = Utc::now();
        self.secret.get_or_insert_with(|| Secret::generate(bytes))
    }
}

/// Per-request view of the caller's session
///
/// Inserted into request extensions by the session middleware. A fresh
/// context carries an id that has not been stored yet; it only becomes a
/// real session if a handler issues a secret for it.
#[derive(Debug, Clone)]
pub struct SessionContext {
    id: SessionId,
    fresh: bool,
}

impl SessionContext {
    /// Context for an id the store already knows
    #[must_use]
    pub const fn resumed(id: SessionId) -> Self {
        Self { id, fresh: false }
    }

    /// Context for a newly generated id
    #[must_use]
    pub const fn fresh(id: SessionId) -> Self {
        Self { id, fresh: true }
    }

    /// Session id
    #[must_use]
    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    /// Whether the id was generated for this request
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        self.fresh
    }
}
