//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the CAS proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream origin every authorized request goes to.
    pub upstream: UpstreamConfig,

    /// CAS server settings.
    pub cas: CasConfig,

    /// Session cookie and gate settings.
    pub session: SessionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8888").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8888".to_string(),
        }
    }
}

/// Upstream origin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream host name or IP. Required.
    pub host: String,

    /// Upstream port.
    pub port: u16,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 80,
        }
    }
}

impl UpstreamConfig {
    /// `host:port` authority used when rewriting request URIs.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// CAS server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CasConfig {
    /// Base URL of the CAS server, without trailing slash.
    pub base_url: String,

    /// Skip TLS certificate verification on the validation call.
    /// Only meant for CAS deployments with self-signed or dev certificates.
    pub insecure_skip_verify: bool,

    /// Upper bound for one `/validate` round trip in seconds.
    pub validate_timeout_secs: u64,

    /// Public URL of this proxy (e.g. "https://app.example.com").
    /// When set it prefixes the `service` parameter sent to CAS; otherwise
    /// the bare request URI is used.
    pub public_url: Option<String>,
}

impl Default for CasConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cas.example.com".to_string(),
            insecure_skip_verify: false,
            validate_timeout_secs: 10,
            public_url: None,
        }
    }
}

/// Longest accepted session lifetime (ten years).
pub const MAX_TTL_HOURS: u64 = 10 * 366 * 24;

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session cookie name.
    pub cookie_name: String,

    /// Session lifetime in hours, at most [`MAX_TTL_HOURS`].
    pub ttl_hours: u64,

    /// Mark cookies `Secure`.
    pub secure: bool,

    /// Forward requests that fail the session gate instead of redirecting
    /// them. Only for upstreams that enforce their own authentication.
    pub forward_unauthenticated: bool,

    /// Header carrying the authenticated identity to the upstream.
    pub identity_header: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            ttl_hours: 48,
            secure: false,
            forward_unauthenticated: false,
            identity_header: None,
        }
    }
}

impl SessionConfig {
    /// Name of the companion cookie holding the session expiry.
    pub fn expiry_cookie_name(&self) -> String {
        format!("{}_expires", self.cookie_name)
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
