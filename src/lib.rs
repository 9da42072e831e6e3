//! CAS-authenticating reverse proxy library.

pub mod cas;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod session;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
