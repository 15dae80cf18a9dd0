//! Anti-forgery token endpoint
//!
//! ```bash
//! GET /csrf
//! ```
//!
//! Response:
//! ```json
//! { "csrf_token": "9f2c…" }
//! ```

use crate::extractors::CurrentSession;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Token endpoint response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The session's anti-forgery secret (hex)
    pub csrf_token: String,
}

/// Return the session's secret, creating the session on first contact
pub async fn issue_token(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Json<TokenResponse> {
    let secret = state.authority().issue(&session);
    Json(TokenResponse {
        csrf_token: secret.as_str().to_string(),
    })
}
