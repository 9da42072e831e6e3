//! CAS protocol subsystem.
//!
//! # Data Flow
//! ```text
//! /login callback (service URL + ticket)
//!     → validator.rs (GET <cas>/validate?service=..&ticket=..)
//!     → response.rs (two-line yes/no body → Verdict)
//!     → login flow (cookie or /logout redirect)
//! ```
//!
//! # Design Decisions
//! - The CAS base URL comes from configuration, never from the request
//! - One validation call per callback; no retries
//! - The HTTP exchange sits behind [`TicketValidator`] so the login flow can
//!   run against a stub

pub mod response;
pub mod validator;

pub use response::Verdict;
pub use validator::{CasClient, TicketValidator, ValidateError};

use url::form_urlencoded;

/// URLs of the three CAS endpoints, derived from one base URL.
#[derive(Debug, Clone)]
pub struct CasEndpoints {
    base_url: String,
}

impl CasEndpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `<base>/login?service=<service>`
    pub fn login_url(&self, service: &str) -> String {
        format!("{}/login?service={}", self.base_url, escape(service))
    }

    /// `<base>/logout`
    pub fn logout_url(&self) -> String {
        format!("{}/logout", self.base_url)
    }

    /// `<base>/validate?service=<service>&ticket=<ticket>`
    pub fn validate_url(&self, service: &str, ticket: &str) -> String {
        format!(
            "{}/validate?service={}&ticket={}",
            self.base_url,
            escape(service),
            escape(ticket)
        )
    }
}

/// Query-component escaping (`application/x-www-form-urlencoded`).
pub fn escape(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
