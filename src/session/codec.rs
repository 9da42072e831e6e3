//! Session cookie value encoding.
//!
//! The identity is carried as standard base64 so the cookie value never
//! contains separators, whitespace or non-ASCII bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// The cookie value is not something [`encode`] could have produced.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cookie value is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("cookie value is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Encode an identity into a cookie-safe value.
pub fn encode(identity: &str) -> String {
    STANDARD.encode(identity.as_bytes())
}

/// Recover the identity from a cookie value.
pub fn decode(value: &str) -> Result<String, DecodeError> {
    let bytes = STANDARD.decode(value.as_bytes())?;
    Ok(String::from_utf8(bytes)?)
}
