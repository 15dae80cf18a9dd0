//! Middleware layers for vidsync
//!
//! Provides middleware for:
//! - Session management (cookie-based sessions)
//! - Cross-origin policy for the dashboard frontend

pub mod cors;
pub mod session;

pub use cors::cors_layer;
pub use session::{SameSite, SessionLayer, SessionMiddleware, SESSION_COOKIE_NAME};
