//! Configuration for the vidsync server.

use crate::middleware::SameSite;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VidsyncConfig {
    /// Listener configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Anti-forgery token configuration.
    #[serde(default)]
    pub csrf: CsrfConfig,
    /// Cross-origin policy.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Upstream metadata API configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Maximum accepted request body in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum pool connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Cookie name carrying the session id.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Cookie path.
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,
    /// Only send the cookie over HTTPS.
    #[serde(default)]
    pub secure: bool,
    /// SameSite policy.
    #[serde(default)]
    pub same_site: SameSite,
    /// Cookie `Max-Age`; `None` issues a browser-session cookie.
    #[serde(default)]
    pub max_age_seconds: Option<u64>,
    /// Sessions idle for longer than this are evicted.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Eviction sweep interval in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

/// CSRF configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CsrfConfig {
    /// Secret length in bytes (never below 32).
    #[serde(default = "default_secret_bytes")]
    pub secret_bytes: usize,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// The single frontend origin allowed to call with credentials.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

/// Upstream metadata API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// API base URL.
    #[serde(default = "default_upstream_url")]
    pub base_url: String,
    /// API key appended to every request.
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u64,
}

// Default value functions
const fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_body_limit() -> usize {
    64 * 1024
}

fn default_database_url() -> String {
    "sqlite://vidsync.db?mode=rwc".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

fn default_cookie_name() -> String {
    crate::middleware::SESSION_COOKIE_NAME.to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

const fn default_idle_timeout() -> u64 {
    86400 // 24 hours
}

const fn default_sweep_interval() -> u64 {
    300 // 5 minutes
}

const fn default_secret_bytes() -> usize {
    32
}

fn default_allowed_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_upstream_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

const fn default_upstream_timeout() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_path: default_cookie_path(),
            secure: false,
            same_site: SameSite::Lax,
            max_age_seconds: None,
            idle_timeout_seconds: default_idle_timeout(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            secret_bytes: default_secret_bytes(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            api_key: String::new(),
            timeout_seconds: default_upstream_timeout(),
        }
    }
}

impl VidsyncConfig {
    /// Load configuration from files and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::figment().extract().map_err(Box::new)
    }

    /// The provider stack used by [`VidsyncConfig::load`].
    #[must_use]
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Toml::file("config/local.toml"))
            .merge(Env::prefixed("VIDSYNC_").split("__"))
    }
}
