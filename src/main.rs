//! CAS-authenticating reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                    CAS PROXY                      │
//!   Browser request  │  ┌──────────┐    ┌──────────────┐                │
//!  ──────────────────┼─▶│  http    │───▶│ session gate │──(allow)──┐    │
//!                    │  │  server  │    └──────┬───────┘           │    │
//!                    │  └────┬─────┘           │(deny)             ▼    │    ┌──────────┐
//!                    │       │          redirect /login     ┌─────────┐ │───▶│ upstream │
//!                    │       │                              │ forward │ │◀───│  server  │
//!                    │       ▼                              └─────────┘ │    └──────────┘
//!                    │  ┌──────────┐    ┌──────────────┐                │    ┌──────────┐
//!                    │  │  login / │───▶│ CAS validator│────────────────┼───▶│   CAS    │
//!                    │  │  logout  │    └──────────────┘                │    │  server  │
//!                    │  └──────────┘                                    │    └──────────┘
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use cas_proxy::lifecycle::signals::wait_for_signal;
use cas_proxy::lifecycle::startup::{resolve_config, Overrides};
use cas_proxy::observability::{logging, metrics};
use cas_proxy::{HttpServer, Shutdown};

/// Reverse proxy that puts CAS single sign-on in front of an HTTP service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local address or host name to listen on [default: 0.0.0.0]
    #[arg(long)]
    localhost: Option<String>,

    /// Local port to listen on [default: 8888]
    #[arg(long)]
    localport: Option<u16>,

    /// Upstream server address (required here or in the config file)
    #[arg(long)]
    dsthost: Option<String>,

    /// Upstream server port [default: 80]
    #[arg(long)]
    dstport: Option<u16>,

    /// CAS server base URL [default: https://cas.example.com]
    #[arg(long)]
    cas_url: Option<String>,

    /// Skip TLS certificate verification when validating tickets
    #[arg(long)]
    insecure: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            local_host: self.localhost.clone(),
            local_port: self.localport,
            upstream_host: self.dsthost.clone(),
            upstream_port: self.dstport,
            cas_url: self.cas_url.clone(),
            insecure: self.insecure,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match resolve_config(args.config.as_deref(), &args.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("cas-proxy: {}", e);
            eprintln!("Run with --help for usage.");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability.log_level);
    tracing::info!("cas-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.authority(),
        cas_url = %config.cas.base_url,
        session_ttl_hours = config.session.ttl_hours,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %config.listener.bind_address, error = %e, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    let server = match HttpServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build CAS client");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    if let Err(e) = server.run(listener, server_shutdown).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
