//! Anti-forgery token authority
//!
//! Issues one secret per session on read requests and verifies the secret
//! presented with every mutating request.
//!
//! Per-session states: no session, session without secret, session with
//! secret. Only [`TokenAuthority::issue`] moves a session forward;
//! [`TokenAuthority::verify`] never writes.

use super::session::{Secret, SessionContext, MIN_SECRET_BYTES};
use super::store::SessionStore;
use thiserror::Error;

/// Why a mutating request was refused
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthRejection {
    /// The request carried no usable session
    #[error("No session established")]
    NoSession,
    /// The session exists but no secret was ever issued for it
    #[error("CSRF token not issued for this session")]
    NoSecret,
    /// The request presented an empty secret
    #[error("Missing CSRF token")]
    MissingToken,
    /// The presented secret differs from the stored one
    #[error("Invalid CSRF token")]
    TokenMismatch,
}

impl AuthRejection {
    /// Machine-readable code for response bodies and logs
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NoSession => "session_missing",
            Self::NoSecret => "csrf_not_issued",
            Self::MissingToken => "csrf_missing",
            Self::TokenMismatch => "csrf_invalid",
        }
    }
}

/// Issues and verifies per-session anti-forgery secrets
#[derive(Debug, Clone)]
pub struct TokenAuthority {
    store: SessionStore,
    secret_bytes: usize,
}

impl TokenAuthority {
    /// Create an authority over `store` with the default secret size
    #[must_use]
    pub const fn new(store: SessionStore) -> Self {
        Self {
            store,
            secret_bytes: MIN_SECRET_BYTES,
        }
    }

    /// Create an authority with a custom secret size
    ///
    /// Sizes below 32 bytes are raised to 32.
    #[must_use]
    pub fn with_secret_bytes(store: SessionStore, secret_bytes: usize) -> Self {
        Self {
            store,
            secret_bytes: secret_bytes.max(MIN_SECRET_BYTES),
        }
    }

    /// Session store backing this authority
    #[must_use]
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Return the session's secret, creating session and secret on first use
    ///
    /// Idempotent: once a session holds a secret every later call returns
    /// that same value.
    #[must_use]
    pub fn issue(&self, session: &SessionContext) -> Secret {
        let secret = self.store.issue_secret(session.id(), self.secret_bytes);
        tracing::debug!(
            session = session.id().log_prefix(),
            fresh = session.is_fresh(),
            "Issued CSRF token"
        );
        secret
    }

    /// Check a presented secret against the session's stored secret
    ///
    /// Fails closed: a session without a stored secret is rejected and no
    /// secret is created here.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthRejection`] describing why the request was refused.
    pub fn verify(
        &self,
        session: Option<&SessionContext>,
        presented: &str,
    ) -> Result<(), AuthRejection> {
        let session = session.ok_or(AuthRejection::NoSession)?;
        let id = session.id();

        if !self.store.contains(id) {
            return Err(AuthRejection::NoSession);
        }

        let stored = self.store.secret(id).ok_or(AuthRejection::NoSecret)?;

        if presented.is_empty() {
            return Err(AuthRejection::MissingToken);
        }

        if stored.matches(presented) {
            self.store.touch(id);
            Ok(())
        } else {
            Err(AuthRejection::TokenMismatch)
        }
    }
}
