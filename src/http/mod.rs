//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → /login, /logout → login.rs (CAS state machine)
//!     → anything else   → proxy.rs (session gate → upstream)
//!     → error.rs (failures rendered as 4xx/5xx)
//!     → Send to client
//! ```

pub mod error;
pub mod login;
pub mod proxy;
pub mod server;

pub use error::ProxyError;
pub use login::{LoginEvent, LoginState};
pub use server::{AppState, HttpServer, X_REQUEST_ID};
