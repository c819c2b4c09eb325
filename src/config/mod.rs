//! Configuration (explicit values > environment).

use std::sync::OnceLock;

/// Global default config (lazy-initialized from env).
static DEFAULT_CONFIG: OnceLock<WeftConfig> = OnceLock::new();

/// Configuration for the chat client.
///
/// Sessions take their endpoint and CSRF token from here unless constructed
/// with explicit values.
#[derive(Debug, Clone, Default)]
pub struct WeftConfig {
    endpoint: Option<String>,
    csrf_token: Option<String>,
}

impl WeftConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables (`WEFT_ENDPOINT`, `WEFT_CSRF_TOKEN`).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self {
            endpoint: std::env::var("WEFT_ENDPOINT").ok(),
            csrf_token: std::env::var("WEFT_CSRF_TOKEN").ok(),
        }
    }

    /// Get (or create) the global default config.
    pub fn global() -> &'static WeftConfig {
        DEFAULT_CONFIG.get_or_init(Self::from_env)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }
}
