//! Session cookie construction and extraction.
//!
//! A session is two cookies: `<name>` carries the encoded identity and
//! `<name>_expires` carries the expiry as Unix seconds. Browsers never send
//! `Expires` back, so the companion cookie is what lets the gate compare the
//! expiry against wall-clock time.

use std::convert::Infallible;

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::config::schema::MAX_TTL_HOURS;
use crate::config::SessionConfig;
use crate::session::codec;

/// A session as presented by the client, not yet judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    /// Raw (still encoded) cookie value.
    pub value: String,
    /// Expiry from the companion cookie, if it was sent.
    pub expiry: Option<ExpiryField>,
}

/// State of the companion expiry cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryField {
    At(OffsetDateTime),
    Unparsable,
}

impl SessionCookie {
    /// Pull the session cookies out of a request jar.
    pub fn from_jar(jar: &CookieJar, config: &SessionConfig) -> Option<Self> {
        let value = jar.get(&config.cookie_name)?.value().to_string();
        let expiry = jar.get(&config.expiry_cookie_name()).map(|c| {
            c.value()
                .parse::<i64>()
                .ok()
                .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
                .map(ExpiryField::At)
                .unwrap_or(ExpiryField::Unparsable)
        });
        Some(Self { value, expiry })
    }
}

/// `Set-Cookie` headers for a response.
///
/// Values are written as-is: everything [`codec::encode`] produces is a legal
/// cookie octet, so no percent-encoding is applied on the way out.
#[derive(Debug, Clone, Default)]
pub struct SetCookies(pub Vec<Cookie<'static>>);

impl IntoResponseParts for SetCookies {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for cookie in self.0 {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    res.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::warn!(cookie = %cookie.name(), error = %e, "Dropping unencodable cookie");
                }
            }
        }
        Ok(res)
    }
}

/// A fresh session for `identity`, valid until `now + ttl`.
///
/// The TTL is capped at [`MAX_TTL_HOURS`]; an expiry past the representable
/// range is pinned to the latest supported instant.
pub fn issue(identity: &str, config: &SessionConfig, now: OffsetDateTime) -> SetCookies {
    let expires = expiry_after(now, config.ttl_hours);

    let mut session = base_cookie(config.cookie_name.clone(), codec::encode(identity), config);
    session.set_expires(expires);
    let mut expiry = base_cookie(
        config.expiry_cookie_name(),
        expires.unix_timestamp().to_string(),
        config,
    );
    expiry.set_expires(expires);

    SetCookies(vec![session, expiry])
}

fn expiry_after(now: OffsetDateTime, ttl_hours: u64) -> OffsetDateTime {
    let hours = i64::try_from(ttl_hours.min(MAX_TTL_HOURS)).unwrap_or(i64::MAX);
    now.checked_add(Duration::hours(hours))
        .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
}

/// Already-dead replacements for both session cookies.
pub fn clear(config: &SessionConfig) -> SetCookies {
    let removals = [config.cookie_name.clone(), config.expiry_cookie_name()]
        .into_iter()
        .map(|name| {
            let mut removal = base_cookie(name, String::new(), config);
            removal.set_max_age(Duration::ZERO);
            removal.set_expires(OffsetDateTime::UNIX_EPOCH);
            removal
        })
        .collect();
    SetCookies(removals)
}

fn base_cookie(name: String, value: String, config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .build()
}
