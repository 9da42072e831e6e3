//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Login callback (identity from CAS)
//!     → codec.rs (identity → cookie-safe value)
//!     → cookie.rs (Set-Cookie with expiry)
//!
//! Every other request:
//!     → cookie.rs (read session + expiry cookies)
//!     → codec.rs (value → identity)
//!     → gate.rs (Allow / Deny decision)
//! ```
//!
//! # Design Decisions
//! - No server-side store: the client-held cookie is the whole session
//! - The gate returns a value; it never writes a response itself

pub mod codec;
pub mod cookie;
pub mod gate;

pub use codec::{decode, encode, DecodeError};
pub use gate::{evaluate, GateDecision, NotAuthenticated, Session};
