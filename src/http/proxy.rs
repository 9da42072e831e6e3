//! Session gate and upstream forwarding.
//!
//! # Responsibilities
//! - Run the session gate on every non-login request
//! - Turn a denial into a `/login` redirect (or pass it through in legacy mode)
//! - Rewrite the request to the fixed upstream and relay the response

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, Uri, Version},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use time::OffsetDateTime;

use crate::http::error::ProxyError;
use crate::http::login::redirect;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::session::{self, GateDecision};

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Headers that describe one connection and never cross the proxy.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Catch-all handler: gate, then forward.
pub async fn gate_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request<Body>,
) -> Response {
    let decision = session::evaluate(&jar, &state.config.session, OffsetDateTime::now_utc());

    let identity = match decision {
        GateDecision::Allow(session) => Some(session.identity),
        GateDecision::Deny(reason) => {
            metrics::record_gate_denied(reason.reason());
            if !state.config.session.forward_unauthenticated {
                tracing::debug!(reason = %reason, path = %request.uri().path(), "Not authenticated, redirecting to login");
                return redirect("/login");
            }
            tracing::debug!(reason = %reason, path = %request.uri().path(), "Not authenticated, forwarding anyway");
            None
        }
    };

    match forward(&state, request, identity.as_deref()).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Upstream error");
            e.into_response()
        }
    }
}

/// Forward `request` to the configured upstream and relay its response.
pub async fn forward(
    state: &AppState,
    request: Request<Body>,
    identity: Option<&str>,
) -> Result<Response, ProxyError> {
    let start = Instant::now();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let (mut parts, body) = request.into_parts();
    let method = parts.method.clone();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();
    let authority = state.config.upstream.authority();
    parts.uri = Uri::builder()
        .scheme("http")
        .authority(authority.as_str())
        .path_and_query(path_and_query.as_str())
        .build()?;
    // The upstream connection is HTTP/1.1 regardless of what the client spoke
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    if let Some(addr) = client_addr {
        append_forwarded_for(&mut parts.headers, addr);
    }
    if let Some(name) = &state.identity_header {
        set_identity(&mut parts.headers, name, identity);
    }

    tracing::debug!(
        method = %method,
        uri = %parts.uri,
        "Proxying request"
    );

    let upstream_request = Request::from_parts(parts, body);
    match state.client.request(upstream_request).await {
        Ok(response) => {
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            metrics::record_request(method.as_str(), parts.status.as_u16(), start);
            Ok(Response::from_parts(parts, Body::new(body)))
        }
        Err(e) => {
            metrics::record_request(method.as_str(), 502, start);
            Err(ProxyError::UpstreamUnavailable(e))
        }
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    // Upgrade is connection-scoped as well; protocol switching is not proxied
    headers.remove(header::UPGRADE);
}

fn append_forwarded_for(headers: &mut HeaderMap, addr: SocketAddr) {
    let ip = addr.ip().to_string();
    let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{}, {}", prior, ip),
        None => ip,
    };
    if let Ok(v) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, v);
    }
}

fn set_identity(headers: &mut HeaderMap, name: &HeaderName, identity: Option<&str>) {
    // Never let a client choose its own identity
    headers.remove(name);
    if let Some(identity) = identity {
        match HeaderValue::from_str(identity) {
            Ok(v) => {
                headers.insert(name.clone(), v);
            }
            Err(_) => tracing::warn!(header = %name, "Identity is not a valid header value, not forwarded"),
        }
    }
}
