//! Axum extractors for vidsync
//!
//! Provides extractors for the caller's session and for the normalized body
//! of mutating requests.

mod payload;
mod session;

pub use payload::{MutationPayload, ENTITY_FIELD, SECRET_FIELD};
pub use session::CurrentSession;
