//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via AppState to every handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the upstream and CAS endpoints are
//!   fixed for the process lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::ProxyConfig;
pub use schema::{
    CasConfig, ListenerConfig, ObservabilityConfig, SessionConfig, TimeoutConfig, UpstreamConfig,
};
