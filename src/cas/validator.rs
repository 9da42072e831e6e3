//! CAS ticket validation client.
//!
//! # Responsibilities
//! - Build the `/validate` URL for a service/ticket pair
//! - Issue exactly one GET with a bounded timeout
//! - Return the raw body for [`Verdict`](crate::cas::Verdict) parsing

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::cas::CasEndpoints;
use crate::config::CasConfig;

/// Failure of a single validation exchange.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("no ticket supplied")]
    MissingTicket,

    #[error("CAS validation request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("CAS validation timed out after {0} seconds")]
    Timeout(u64),

    #[error("failed to read CAS validation response: {0}")]
    Read(#[source] reqwest::Error),
}

/// Exchanges a ticket for the CAS server's raw verdict.
#[async_trait]
pub trait TicketValidator: Send + Sync {
    /// Validate `ticket` for `service_url` and return the response body.
    async fn validate(&self, service_url: &str, ticket: &str) -> Result<String, ValidateError>;
}

/// [`TicketValidator`] speaking to a real CAS server over HTTP(S).
#[derive(Debug, Clone)]
pub struct CasClient {
    endpoints: CasEndpoints,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl CasClient {
    /// Create a new client from the CAS configuration.
    pub fn new(config: &CasConfig) -> Result<Self, reqwest::Error> {
        if config.insecure_skip_verify {
            tracing::warn!(
                cas_url = %config.base_url,
                "TLS certificate verification disabled for CAS validation"
            );
        }

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .timeout(Duration::from_secs(config.validate_timeout_secs))
            .no_proxy()
            .build()?;

        Ok(Self {
            endpoints: CasEndpoints::new(&config.base_url),
            client,
            timeout_secs: config.validate_timeout_secs,
        })
    }

    fn classify(&self, e: reqwest::Error) -> ValidateError {
        if e.is_timeout() {
            ValidateError::Timeout(self.timeout_secs)
        } else {
            ValidateError::Network(e)
        }
    }
}

#[async_trait]
impl TicketValidator for CasClient {
    async fn validate(&self, service_url: &str, ticket: &str) -> Result<String, ValidateError> {
        if ticket.is_empty() {
            return Err(ValidateError::MissingTicket);
        }

        let url = self.endpoints.validate_url(service_url, ticket);
        tracing::debug!(service = %service_url, "Validating CAS ticket");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            // CAS 1.0 answers "no" with 200; anything else still carries a body
            // that will fail the verdict check.
            tracing::warn!(status = %status, "CAS validation returned non-success status");
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                ValidateError::Timeout(self.timeout_secs)
            } else {
                ValidateError::Read(e)
            }
        })
    }
}
