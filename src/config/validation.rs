//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that the upstream target is actually set
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check URLs and header names before they reach request handling
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::{Host, Url};

use crate::config::schema::{ProxyConfig, MAX_TTL_HOURS};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream host is required")]
    MissingUpstreamHost,

    #[error("upstream port must be non-zero")]
    InvalidUpstreamPort,

    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("CAS base URL '{0}' must be an absolute http(s) URL")]
    InvalidCasUrl(String),

    #[error("public URL '{0}' must be an absolute http(s) URL")]
    InvalidPublicUrl(String),

    #[error("cookie name '{0}' is not a valid cookie token")]
    InvalidCookieName(String),

    #[error("identity header '{0}' is not a valid header name")]
    InvalidIdentityHeader(String),

    #[error("session.ttl_hours {0} exceeds the maximum of {max}", max = MAX_TTL_HOURS)]
    TtlTooLarge(u64),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.host.trim().is_empty() {
        errors.push(ValidationError::MissingUpstreamHost);
    }
    if config.upstream.port == 0 {
        errors.push(ValidationError::InvalidUpstreamPort);
    }

    if !is_bind_address(&config.listener.bind_address) {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if !is_http_url(&config.cas.base_url) {
        errors.push(ValidationError::InvalidCasUrl(config.cas.base_url.clone()));
    }
    if let Some(public_url) = &config.cas.public_url {
        if !is_http_url(public_url) {
            errors.push(ValidationError::InvalidPublicUrl(public_url.clone()));
        }
    }

    if !is_cookie_token(&config.session.cookie_name) {
        errors.push(ValidationError::InvalidCookieName(
            config.session.cookie_name.clone(),
        ));
    }
    if let Some(header) = &config.session.identity_header {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidIdentityHeader(header.clone()));
        }
    }

    if config.session.ttl_hours == 0 {
        errors.push(ValidationError::ZeroValue("session.ttl_hours"));
    } else if config.session.ttl_hours > MAX_TTL_HOURS {
        errors.push(ValidationError::TtlTooLarge(config.session.ttl_hours));
    }
    if config.cas.validate_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("cas.validate_timeout_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `ip:port` or `hostname:port`; host names are resolved when binding.
fn is_bind_address(raw: &str) -> bool {
    if raw.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match raw.rsplit_once(':') {
        Some((host, port)) => port.parse::<u16>().is_ok() && Host::parse(host).is_ok(),
        None => false,
    }
}

fn is_http_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

/// RFC 6265 token: visible ASCII minus separators.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}
