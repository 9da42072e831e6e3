//! Per-request authorization decision.
//!
//! The gate only classifies. What happens to a denied request (redirect or
//! legacy pass-through) is decided by the caller matching on
//! [`GateDecision`].

use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;
use time::OffsetDateTime;

use crate::config::SessionConfig;
use crate::session::codec::{self, DecodeError};
use crate::session::cookie::{ExpiryField, SessionCookie};

/// Why a request did not carry a usable session.
#[derive(Debug, Error)]
pub enum NotAuthenticated {
    #[error("no session cookie")]
    Missing,

    #[error("malformed session cookie: {0}")]
    Malformed(#[from] DecodeError),

    #[error("session cookie carries an empty identity")]
    EmptyIdentity,

    #[error("session expired at {0}")]
    Expired(OffsetDateTime),

    #[error("session expiry is unreadable")]
    BadExpiry,
}

impl NotAuthenticated {
    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            NotAuthenticated::Missing => "missing",
            NotAuthenticated::Malformed(_) => "malformed",
            NotAuthenticated::EmptyIdentity => "empty_identity",
            NotAuthenticated::Expired(_) => "expired",
            NotAuthenticated::BadExpiry => "bad_expiry",
        }
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: String,
    pub expires: Option<OffsetDateTime>,
}

/// Outcome of the session gate for one request.
#[derive(Debug)]
pub enum GateDecision {
    Allow(Session),
    Deny(NotAuthenticated),
}

/// Classify the cookies of one request at wall-clock time `now`.
pub fn evaluate(jar: &CookieJar, config: &SessionConfig, now: OffsetDateTime) -> GateDecision {
    let cookie = match SessionCookie::from_jar(jar, config) {
        Some(c) => c,
        None => return GateDecision::Deny(NotAuthenticated::Missing),
    };

    match check(&cookie, now) {
        Ok(session) => GateDecision::Allow(session),
        Err(reason) => GateDecision::Deny(reason),
    }
}

fn check(cookie: &SessionCookie, now: OffsetDateTime) -> Result<Session, NotAuthenticated> {
    let identity = codec::decode(&cookie.value)?;
    if identity.is_empty() {
        return Err(NotAuthenticated::EmptyIdentity);
    }

    let expires = match cookie.expiry {
        Some(ExpiryField::At(at)) if at < now => return Err(NotAuthenticated::Expired(at)),
        Some(ExpiryField::At(at)) => Some(at),
        Some(ExpiryField::Unparsable) => return Err(NotAuthenticated::BadExpiry),
        // Browser already dropped the companion; its own expiry handling is
        // all that is left to rely on.
        None => None,
    };

    Ok(Session { identity, expires })
}
