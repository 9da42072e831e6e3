//! Handler-level errors and their HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cas::ValidateError;

/// Everything that can end a request without a redirect or relayed response.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("CAS ticket validation failed: {0}")]
    Validation(#[from] ValidateError),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] hyper_util::client::legacy::Error),

    #[error("cannot build upstream request: {0}")]
    UpstreamRequest(#[from] axum::http::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(ValidateError::MissingTicket) => StatusCode::BAD_REQUEST,
            ProxyError::Validation(ValidateError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Validation(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ProxyError::Validation(ValidateError::MissingTicket) => "Login failed: no CAS ticket supplied",
            ProxyError::Validation(_) => "Login failed: the CAS server could not validate the ticket",
            ProxyError::UpstreamUnavailable(_) => "Upstream request failed",
            ProxyError::UpstreamRequest(_) => "Could not build upstream request",
        };
        (status, message).into_response()
    }
}
