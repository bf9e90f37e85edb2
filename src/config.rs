//! Bridge configuration.
//!
//! Everything is environment-driven:
//!
//! - `BRIDGE_WEBHOOK_SECRET` - shared secret for signature verification
//! - `BRIDGE_FALLBACK_USER` - tracker username used when no user maps to the
//!   event author's platform login (default: `tracker-bot`)
//! - `BRIDGE_AUTO_CREATE_ISSUE` - create a bare issue for a newly opened
//!   pull request without any issue reference (default: off)
//! - `BRIDGE_BIND_ADDR` - listen address (default: `0.0.0.0:3000`)
//!
//! A missing secret is not a startup error: the authenticator rejects every
//! delivery (and logs the misconfiguration) until one is configured.

use std::net::SocketAddr;

use thiserror::Error;

/// Default tracker username impersonated when no mapped user exists.
pub const DEFAULT_FALLBACK_USER: &str = "tracker-bot";

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The bind address could not be parsed.
    #[error("invalid bind address: {0}")]
    InvalidBindAddr(String),
}

/// Runtime configuration for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Shared secret for HMAC signature verification. `None` means
    /// misconfigured; deliveries are rejected.
    pub webhook_secret: Option<Vec<u8>>,

    /// Tracker username used when the event author has no mapped user.
    pub fallback_username: String,

    /// Whether a newly opened pull request without issue references may
    /// create a bare issue.
    pub auto_create_issue: bool,

    /// Listen address for the HTTP server.
    pub bind_addr: SocketAddr,
}

impl BridgeConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let webhook_secret = lookup("BRIDGE_WEBHOOK_SECRET").map(String::into_bytes);

        let fallback_username = lookup("BRIDGE_FALLBACK_USER")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_FALLBACK_USER.to_string());

        let auto_create_issue = lookup("BRIDGE_AUTO_CREATE_ISSUE")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let bind_raw = lookup("BRIDGE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw))?;

        Ok(BridgeConfig {
            webhook_secret,
            fallback_username,
            auto_create_issue,
            bind_addr,
        })
    }

    /// The configured secret as bytes, if any.
    pub fn secret(&self) -> Option<&[u8]> {
        self.webhook_secret.as_deref()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            webhook_secret: None,
            fallback_username: DEFAULT_FALLBACK_USER.to_string(),
            auto_create_issue: false,
            bind_addr: DEFAULT_BIND_ADDR.parse().expect("default address parses"),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
