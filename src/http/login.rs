//! CAS login and logout flow.
//!
//! # States
//! - Anonymous: no session
//! - AwaitingTicket: browser sent to CAS, will come back with `?ticket=`
//! - Authenticated: ticket accepted, session cookie issued
//!
//! # State Transitions
//! ```text
//! /login              (Start)      → AwaitingTicket : redirect to CAS /login
//! /login?ticket=T     (Callback)   → Authenticated  : set cookie, redirect to /
//!                                  → Anonymous      : redirect to /logout
//!                                  → (error page when CAS cannot be asked)
//! /logout             (any state)  → Anonymous      : clear cookie, redirect to CAS /logout
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;
use url::form_urlencoded;

use crate::cas::Verdict;
use crate::http::error::ProxyError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::session::cookie;

/// What a `/login` request asks for, parsed from its URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvent {
    /// No ticket: start the CAS round trip.
    Start { service: String },
    /// CAS sent the browser back with a ticket.
    Callback { service: String, ticket: String },
}

impl LoginEvent {
    /// Parse a `/login` request URI.
    ///
    /// The service URL for `Start` is the whole request URI so CAS returns
    /// the browser to exactly where it left; for `Callback` it is the URI
    /// without its query, matching the service CAS issued the ticket for.
    pub fn from_uri(uri: &Uri, public_url: Option<&str>) -> Self {
        let ticket = uri.query().and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "ticket")
                .map(|(_, value)| value.into_owned())
        });

        match ticket {
            Some(ticket) => LoginEvent::Callback {
                service: service_url(public_url, uri.path()),
                ticket,
            },
            None => {
                let request_uri = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/login");
                LoginEvent::Start {
                    service: service_url(public_url, request_uri),
                }
            }
        }
    }
}

fn service_url(public_url: Option<&str>, request_uri: &str) -> String {
    match public_url {
        Some(base) => format!("{}{}", base.trim_end_matches('/'), request_uri),
        None => request_uri.to_string(),
    }
}

/// Where a login event leaves the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Anonymous,
    AwaitingTicket { service: String },
    Authenticated { identity: String },
}

/// Run one login event through the state machine.
pub async fn advance(state: &AppState, event: LoginEvent) -> Result<LoginState, ProxyError> {
    match event {
        LoginEvent::Start { service } => Ok(LoginState::AwaitingTicket { service }),
        LoginEvent::Callback { service, ticket } => {
            let body = state.validator.validate(&service, &ticket).await?;
            match Verdict::parse(&body) {
                Verdict::Accepted(identity) => Ok(LoginState::Authenticated { identity }),
                Verdict::Rejected => Ok(LoginState::Anonymous),
            }
        }
    }
}

/// `/login`: start the CAS round trip or finish it.
pub async fn login_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let event = LoginEvent::from_uri(request.uri(), state.config.cas.public_url.as_deref());
    tracing::debug!(event = ?event, "Login request");

    match advance(&state, event).await {
        Ok(LoginState::AwaitingTicket { service }) => {
            redirect(&state.cas.login_url(&service))
        }
        Ok(LoginState::Authenticated { identity }) => {
            tracing::info!(user = %identity, "CAS ticket accepted, session issued");
            metrics::record_login("accepted");
            let cookies = cookie::issue(&identity, &state.config.session, OffsetDateTime::now_utc());
            (cookies, redirect("/")).into_response()
        }
        Ok(LoginState::Anonymous) => {
            tracing::warn!("CAS rejected ticket");
            metrics::record_login("rejected");
            redirect("/logout")
        }
        Err(e) => {
            tracing::error!(error = %e, "Login aborted");
            metrics::record_login("error");
            e.into_response()
        }
    }
}

/// `/logout`: drop the session and log out of CAS too.
pub async fn logout_handler(State(state): State<AppState>) -> Response {
    tracing::debug!("Logout request");
    let cookies = cookie::clear(&state.config.session);
    (cookies, redirect(&state.cas.logout_url())).into_response()
}

/// `302 Found` to `location`.
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
