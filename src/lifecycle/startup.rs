//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the optional config file
//! - Layer command-line overrides on top
//! - Validate the result before anything binds
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Flags beat the file, the file beats built-in defaults

use std::path::Path;

use crate::config::loader::{finalize, read_config};
use crate::config::{ConfigError, ProxyConfig};

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub local_host: Option<String>,
    pub local_port: Option<u16>,
    pub upstream_host: Option<String>,
    pub upstream_port: Option<u16>,
    pub cas_url: Option<String>,
    pub insecure: bool,
}

/// Build the validated configuration the server runs with.
pub fn resolve_config(
    file: Option<&Path>,
    overrides: &Overrides,
) -> Result<ProxyConfig, ConfigError> {
    let mut config = match file {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    apply_overrides(&mut config, overrides);
    finalize(config)
}

fn apply_overrides(config: &mut ProxyConfig, overrides: &Overrides) {
    if overrides.local_host.is_some() || overrides.local_port.is_some() {
        let (default_host, default_port) = split_bind(&config.listener.bind_address);
        let host = overrides.local_host.clone().unwrap_or(default_host);
        let port = overrides.local_port.unwrap_or(default_port);
        config.listener.bind_address = format!("{}:{}", host, port);
    }
    if let Some(host) = &overrides.upstream_host {
        config.upstream.host = host.clone();
    }
    if let Some(port) = overrides.upstream_port {
        config.upstream.port = port;
    }
    if let Some(url) = &overrides.cas_url {
        config.cas.base_url = url.clone();
    }
    if overrides.insecure {
        config.cas.insecure_skip_verify = true;
    }
}

fn split_bind(bind_address: &str) -> (String, u16) {
    match bind_address.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(8888)),
        None => (bind_address.to_string(), 8888),
    }
}
