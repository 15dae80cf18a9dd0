//! Sessions and anti-forgery protection
//!
//! The session cookie identifies a server-held [`Session`]; the
//! [`TokenAuthority`] binds one anti-forgery [`Secret`] to each session and
//! checks it on every mutating request.

pub mod csrf;
pub mod session;
pub mod store;

pub use csrf::{AuthRejection, TokenAuthority};
pub use session::{Secret, Session, SessionContext, SessionError, SessionId, MIN_SECRET_BYTES};
pub use store::SessionStore;
